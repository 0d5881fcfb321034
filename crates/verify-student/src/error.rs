use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Task queue is closed")]
    Closed,
    #[error("Batch {batch} failed to complete: {reason}")]
    Join { batch: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl MailError {
    /// Transport and address problems leave the record eligible for the next run.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MailError::Transport(_) | MailError::InvalidAddress { .. }
        )
    }
}
