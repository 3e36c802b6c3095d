use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("malformed environment report: {0}")]
    MalformedReport(String),
}
