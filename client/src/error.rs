//! Client-side error types.

use crate::workflow::WorkflowState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid workflow transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: WorkflowState,
        to: WorkflowState,
    },

    #[error("no IP provider produced a valid IPv4 address")]
    IpResolutionFailed,

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unparseable gate response: {0}")]
    MalformedResponse(String),
}
