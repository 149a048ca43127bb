pub mod controller;
pub mod state;
pub mod store;

pub use controller::{advance, DialogueOutcome};
pub use state::DialogueState;
pub use store::{PgStateStore, StateStore};
