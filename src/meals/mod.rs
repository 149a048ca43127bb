pub mod ledger;
pub mod repo;
pub mod service;

pub use ledger::{MealLedger, PgMealLedger};
pub use repo::MealEntry;
pub use service::DayTotals;
