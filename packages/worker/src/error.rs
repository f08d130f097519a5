use std::path::PathBuf;

use thiserror::Error;

use crate::sandbox::error::SandboxError;
use crate::store::StoreError;

/// Faults of a single judging attempt. Anything the submitted program does
/// wrong is a status on the submission, never one of these.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("workspace error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("MQ error: {0}")]
    Mq(String),
}

impl From<broccoli_queue::error::BroccoliError> for WorkerError {
    fn from(e: broccoli_queue::error::BroccoliError) -> Self {
        WorkerError::Mq(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
