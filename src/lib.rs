pub mod app;
pub mod chat;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod meals;
pub mod nlp;
pub mod nutrition;
pub mod outbound;
pub mod reminders;
pub mod state;
pub mod tracking;
pub mod users;
