use std::time::Duration;

use thiserror::Error;

/// Invocation-level failure surfaced to the runtime so the batch is redelivered.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay invocation exceeded the runtime deadline ({budget:?} budget)")]
    DeadlineExceeded { budget: Duration },
}

/// A durable store rejected or failed a write.
#[derive(Debug, Error)]
#[error("failed to write object '{key}': {message}")]
pub struct StorageError {
    pub key: String,
    pub message: String,
}

impl StorageError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// The compute control service rejected or failed a start request.
#[derive(Debug, Error)]
#[error("failed to start instances [{}]: {message}", .instance_ids.join(", "))]
pub struct ComputeControlError {
    pub instance_ids: Vec<String>,
    pub message: String,
}

impl ComputeControlError {
    pub fn new(instance_ids: &[String], message: impl Into<String>) -> Self {
        Self {
            instance_ids: instance_ids.to_vec(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read relay configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("BUCKET_NAME must be configured")]
    MissingBucket,

    #[error("RELAY_MAX_CONCURRENT_WRITES must be a positive integer")]
    InvalidConcurrency,

    #[error("RELAY_CALL_TIMEOUT_MS must be a positive integer")]
    InvalidTimeout,
}
