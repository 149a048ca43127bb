pub mod client;
pub mod normalize;

pub use client::{ClassifierResponse, DetectedIntent, IntentClassifier, WitClient};
pub use normalize::{normalize_message, Entities, Intent, NormalizedMessage, QuantityEntity, TimeField};
