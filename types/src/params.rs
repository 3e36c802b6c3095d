//! Gate parameters — every tunable policy value in one place.
//!
//! Thresholds and windows are configuration, not hardcoded constants, so
//! admission policy can be tuned without touching the algorithms.

use serde::{Deserialize, Serialize};

/// All tunable parameters of the admission gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateParams {
    /// Suspicious-count threshold inside the classifier: a report with more
    /// than this many suspicious secondary signals classifies as
    /// `Suspicious(count)` instead of `Clean`.
    #[serde(default = "default_suspicious_threshold")]
    pub suspicious_threshold: u32,

    /// Coarser orchestrator threshold: an admission request whose suspicious
    /// count exceeds this is rejected outright. Tuned independently of
    /// `suspicious_threshold`.
    #[serde(default = "default_rejection_threshold")]
    pub rejection_threshold: u32,

    /// Ticket time-to-live in seconds. Default: 15 minutes.
    #[serde(default = "default_ticket_ttl_secs")]
    pub ticket_ttl_secs: u64,

    /// Global rate window in seconds. Default: 5 minutes.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,

    /// Maximum ticket insertions allowed inside the global rate window,
    /// across all identifiers.
    #[serde(default = "default_rate_max_inserts")]
    pub rate_max_inserts: usize,

    /// Per-identifier debounce window in seconds: minimum spacing between
    /// successive successful admissions for the same identifier.
    #[serde(default = "default_debounce_window_secs")]
    pub debounce_window_secs: u64,

    /// Timeout in seconds for each outbound IP-resolution provider call.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Whether ad-block and incognito detection count as critical violations
    /// rather than secondary indicators. Historical snapshots of the policy
    /// disagreed; this keeps it a named knob.
    #[serde(default)]
    pub privacy_signals_critical: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_suspicious_threshold() -> u32 {
    2
}

fn default_rejection_threshold() -> u32 {
    2
}

fn default_ticket_ttl_secs() -> u64 {
    15 * 60
}

fn default_rate_window_secs() -> u64 {
    5 * 60
}

fn default_rate_max_inserts() -> usize {
    10
}

fn default_debounce_window_secs() -> u64 {
    30
}

fn default_provider_timeout_secs() -> u64 {
    5
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            suspicious_threshold: default_suspicious_threshold(),
            rejection_threshold: default_rejection_threshold(),
            ticket_ttl_secs: default_ticket_ttl_secs(),
            rate_window_secs: default_rate_window_secs(),
            rate_max_inserts: default_rate_max_inserts(),
            debounce_window_secs: default_debounce_window_secs(),
            provider_timeout_secs: default_provider_timeout_secs(),
            privacy_signals_critical: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let params = GateParams::default();
        assert_eq!(params.suspicious_threshold, 2);
        assert_eq!(params.rejection_threshold, 2);
        assert_eq!(params.ticket_ttl_secs, 900);
        assert_eq!(params.rate_window_secs, 300);
        assert_eq!(params.rate_max_inserts, 10);
        assert_eq!(params.debounce_window_secs, 30);
        assert_eq!(params.provider_timeout_secs, 5);
        assert!(!params.privacy_signals_critical);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let params: GateParams = toml::from_str("ticket_ttl_secs = 60").unwrap();
        assert_eq!(params.ticket_ttl_secs, 60);
        assert_eq!(params.rate_max_inserts, 10);
        assert_eq!(params.debounce_window_secs, 30);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let params: GateParams = toml::from_str("").unwrap();
        assert_eq!(params.suspicious_threshold, GateParams::default().suspicious_threshold);
    }
}
