//! Rejection taxonomy for admission decisions.

use checkpoint_store::StoreError;
use checkpoint_types::GateParams;
use thiserror::Error;

/// Why an admission request was rejected.
///
/// Terminal reasons never offer a retry challenge; retryable reasons may be
/// retried after correction, a challenge, or a backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The signal report was missing or not an object.
    InvalidInput,
    /// The identifier is not a well-formed IPv4 literal.
    InvalidIpFormat,
    /// A critical automation signal fired. Hard stop.
    BotDetection,
    /// Too many suspicious indicators in aggregate.
    MultipleSuspiciousIndicators { indicators: u32 },
    /// Global insertion cap hit; retry after the window elapses.
    RateLimitExceeded,
    /// The identifier was verified again inside the debounce window.
    RecentVerification,
}

impl RejectReason {
    /// Machine-readable reason code carried on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidInput => "invalid_input",
            RejectReason::InvalidIpFormat => "invalid_ip_format",
            RejectReason::BotDetection => "bot_detection",
            RejectReason::MultipleSuspiciousIndicators { .. } => "multiple_suspicious_indicators",
            RejectReason::RateLimitExceeded => "rate_limit_exceeded",
            RejectReason::RecentVerification => "recent_verification",
        }
    }

    /// Human-readable message shown on the checkpoint page.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidInput => "IP address and browser checks are required",
            RejectReason::InvalidIpFormat => "Invalid IP address format",
            RejectReason::BotDetection => {
                "Automated access detected. Please access this site manually."
            }
            RejectReason::MultipleSuspiciousIndicators { .. } => {
                "Multiple suspicious indicators detected. Please try again."
            }
            RejectReason::RateLimitExceeded => {
                "Too many verification attempts. Please wait before trying again."
            }
            RejectReason::RecentVerification => {
                "IP was recently verified. Please wait before trying again."
            }
        }
    }

    /// Terminal rejections never lead to a retry challenge.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RejectReason::InvalidInput
                | RejectReason::InvalidIpFormat
                | RejectReason::BotDetection
        )
    }

    /// Seconds after which a retry could succeed, for rejections that are
    /// purely time-gated. Challenge-retryable and terminal rejections have
    /// no time hint.
    pub fn retry_after_hint(&self, params: &GateParams) -> Option<u64> {
        match self {
            RejectReason::RateLimitExceeded => Some(params.rate_window_secs),
            RejectReason::RecentVerification => Some(params.debounce_window_secs),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("admission rejected: {}", .0.code())]
    Rejected(RejectReason),

    #[error("ticket store failure: {0}")]
    Store(#[from] StoreError),
}
