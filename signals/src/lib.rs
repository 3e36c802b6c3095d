//! Environment signal schema and trust classification.
//!
//! A caller submits an environment report (named boolean/numeric fields,
//! pre-computed in the browser). This crate validates the report's shape
//! against an ordered schema and classifies it:
//! - any critical signal firing is a hard stop (`CriticalViolation`);
//! - too many secondary indicators is `Suspicious(count)`;
//! - otherwise `Clean`.
//!
//! The schema and thresholds are configuration, not hardcoded constants.

pub mod classifier;
pub mod error;
pub mod schema;

pub use classifier::{classify, TrustEvaluation};
pub use error::SignalError;
pub use schema::{Signal, SignalCategory, SignalKind, SignalReport, SignalSchema, SignalSpec};
