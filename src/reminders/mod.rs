pub mod repo;
pub mod scheduler;
pub mod service;

pub use repo::Reminder;
pub use scheduler::{CronScheduler, ReminderScheduler};
