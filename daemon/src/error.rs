//! Daemon-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),
}
