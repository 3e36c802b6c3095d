//! Admission orchestration: validation → classification → rate checks →
//! store mutation, with an explicit terminal-vs-retryable rejection split.

pub mod error;
pub mod limiter;
pub mod orchestrator;

pub use error::{AdmissionError, RejectReason};
pub use limiter::RateLimiter;
pub use orchestrator::{Admission, AdmissionGate};
