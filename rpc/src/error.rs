//! HTTP error types and the rejection → status mapping.

use axum::http::StatusCode;
use checkpoint_admission::{AdmissionError, RejectReason};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind listener: {0}")]
    Bind(String),

    #[error("server error: {0}")]
    Server(String),
}

/// HTTP status for a rejection: policy violations are 403, capacity is 429,
/// everything else (input and soft rejections) is 400.
pub fn status_for(reason: &RejectReason) -> StatusCode {
    match reason {
        RejectReason::BotDetection => StatusCode::FORBIDDEN,
        RejectReason::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        RejectReason::InvalidInput
        | RejectReason::InvalidIpFormat
        | RejectReason::MultipleSuspiciousIndicators { .. }
        | RejectReason::RecentVerification => StatusCode::BAD_REQUEST,
    }
}

/// Status for any admission error, including internal store failures.
pub fn status_for_error(err: &AdmissionError) -> StatusCode {
    match err {
        AdmissionError::Rejected(reason) => status_for(reason),
        AdmissionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
