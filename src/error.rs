use thiserror::Error;

/// Failures crossing the chat-service boundary. Everything here degrades to a
/// generic "try again" reply; no variant is fatal to the process.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("persistence failed")]
    Persistence(#[source] anyhow::Error),

    #[error("conversation state write failed")]
    StateWrite(#[source] anyhow::Error),
}
