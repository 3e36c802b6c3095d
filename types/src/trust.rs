//! Trust classification and score enums shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket-level trust score recorded on admission.
///
/// `High` iff the report classified as `Clean`; any admitted-but-suspicious
/// report is recorded as `Low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustScore {
    High,
    Low,
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustScore::High => write!(f, "high"),
            TrustScore::Low => write!(f, "low"),
        }
    }
}

/// Outcome of classifying a signal report.
///
/// Derived by the classifier; never stored independently of the evaluation
/// that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustClassification {
    /// No critical signal and the suspicious count is within threshold.
    Clean,
    /// Suspicious-count threshold exceeded (carries the count).
    Suspicious(u32),
    /// At least one critical signal fired. Hard stop, no retry path.
    CriticalViolation,
}

impl TrustClassification {
    /// The trust score a ticket issued from this classification carries.
    pub fn trust_score(&self) -> TrustScore {
        match self {
            TrustClassification::Clean => TrustScore::High,
            _ => TrustScore::Low,
        }
    }
}
