//! Admission orchestrator — sequences validation, classification, rate
//! policy, and the store mutation into a single admission decision.
//!
//! Every check is a pure predicate over the already-computed classification
//! and store state; nothing is recomputed downstream. The store upsert and
//! the limiter record are the only mutations, and the limiter only records
//! after the store write succeeds.

use crate::error::{AdmissionError, RejectReason};
use crate::limiter::RateLimiter;
use checkpoint_signals::{classify, SignalReport, SignalSchema};
use checkpoint_store::{TicketStore, VerificationTicket};
use checkpoint_types::{ClientIp, GateParams, Timestamp, TrustClassification, TrustScore};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// A successful admission decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    pub trust_score: TrustScore,
    pub suspicious_count: u32,
}

/// The admission gate: owns the ticket store, the rate limiter, and the
/// signal schema derived from policy parameters.
pub struct AdmissionGate {
    store: Arc<dyn TicketStore>,
    limiter: Mutex<RateLimiter>,
    schema: SignalSchema,
    params: GateParams,
}

impl AdmissionGate {
    /// Build a gate over `store`, warming the rate limiter from tickets the
    /// store already holds inside the rate window.
    pub fn new(store: Arc<dyn TicketStore>, params: GateParams) -> Self {
        let now = Timestamp::now();
        let mut limiter = RateLimiter::new(params.rate_window_secs, params.rate_max_inserts);
        let persisted = store.recent_insert_count(params.rate_window_secs, now);
        if persisted > 0 {
            limiter.warm(persisted, now);
            debug!(persisted, "warmed rate limiter from persisted tickets");
        }

        Self {
            store,
            limiter: Mutex::new(limiter),
            schema: SignalSchema::for_params(&params),
            params,
        }
    }

    pub fn params(&self) -> &GateParams {
        &self.params
    }

    /// Copy of every held ticket, for the admin data view.
    pub fn tickets(&self) -> Vec<VerificationTicket> {
        self.store.snapshot()
    }

    /// Decide whether `raw_ip` may pass the checkpoint given its signal
    /// report, and on success record a verification ticket.
    pub fn admit(
        &self,
        raw_ip: &str,
        report: Option<&Value>,
        user_agent: &str,
        now: Timestamp,
    ) -> Result<Admission, AdmissionError> {
        // 1. Input validation: identifier shape and report presence.
        let ip = ClientIp::parse(raw_ip)
            .map_err(|_| AdmissionError::Rejected(RejectReason::InvalidIpFormat))?;
        let raw_report = report.ok_or(AdmissionError::Rejected(RejectReason::InvalidInput))?;
        let report = SignalReport::from_value(raw_report, &self.schema)
            .map_err(|_| AdmissionError::Rejected(RejectReason::InvalidInput))?;

        // 2. Classification.
        let eval = classify(&report, &self.params);

        // 3. Critical violation: terminal, nothing is written.
        if eval.classification == TrustClassification::CriticalViolation {
            info!(%ip, "admission refused: critical automation signal");
            return Err(AdmissionError::Rejected(RejectReason::BotDetection));
        }

        // 4. Aggregate suspicion beyond the coarser rejection threshold.
        if let TrustClassification::Suspicious(count) = eval.classification {
            if count > self.params.rejection_threshold {
                debug!(%ip, count, "admission refused: suspicious indicators");
                return Err(AdmissionError::Rejected(
                    RejectReason::MultipleSuspiciousIndicators { indicators: count },
                ));
            }
        }

        // Steps 5-7 hold one guard: checking the counts and writing the
        // ticket must not interleave with another admission, or two
        // requests could each observe pre-write counts and both pass.
        let mut limiter = self.limiter.lock().expect("limiter lock poisoned");

        // 5. Global insertion cap.
        if !limiter.admit_insert(now) {
            debug!(%ip, "admission refused: global rate limit");
            return Err(AdmissionError::Rejected(RejectReason::RateLimitExceeded));
        }

        // 6. Per-identifier debounce.
        if self
            .store
            .recent_insert(ip, self.params.debounce_window_secs, now)
        {
            debug!(%ip, "admission refused: recently verified");
            return Err(AdmissionError::Rejected(RejectReason::RecentVerification));
        }

        // 7. Issue the ticket. High trust iff the report was fully clean.
        let trust_score = eval.classification.trust_score();
        let ticket = VerificationTicket {
            ip,
            issued_at: now,
            trust_score,
            suspicious_count: eval.suspicious_count,
            user_agent: user_agent.to_string(),
        };
        self.store.upsert(ticket)?;
        limiter.record_insert(now);

        info!(%ip, %trust_score, "admission granted");
        Ok(Admission {
            trust_score,
            suspicious_count: eval.suspicious_count,
        })
    }

    /// Whether `raw_ip` currently holds a valid (unexpired) ticket.
    ///
    /// A malformed identifier can never have been verified, so it answers
    /// `false` rather than erroring.
    pub fn verify(&self, raw_ip: &str, now: Timestamp) -> bool {
        match ClientIp::parse(raw_ip) {
            Ok(ip) => self.store.lookup(ip, self.params.ticket_ttl_secs, now),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_store::{MemoryStore, StoreError};
    use serde_json::json;

    fn clean_checks() -> Value {
        json!({
            "isBot": false,
            "hasWebdriver": false,
            "isEmbedded": false,
            "hasAdBlock": false,
            "isIncognito": false,
            "isCleanLoad": true,
            "hasValidViewport": true,
            "hasValidTimezone": true,
            "hasValidCanvas": true,
            "hasValidWebGL": true,
            "isTrustedDevice": true,
        })
    }

    fn gate() -> AdmissionGate {
        AdmissionGate::new(Arc::new(MemoryStore::new()), GateParams::default())
    }

    fn reason(err: AdmissionError) -> RejectReason {
        match err {
            AdmissionError::Rejected(r) => r,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    // ── Input validation ────────────────────────────────────────────────

    #[test]
    fn malformed_ip_rejected() {
        let err = gate()
            .admit("999.999.999.999", Some(&clean_checks()), "ua", Timestamp::new(0))
            .unwrap_err();
        assert_eq!(reason(err), RejectReason::InvalidIpFormat);
    }

    #[test]
    fn missing_report_rejected() {
        let err = gate()
            .admit("203.0.113.5", None, "ua", Timestamp::new(0))
            .unwrap_err();
        assert_eq!(reason(err), RejectReason::InvalidInput);
    }

    #[test]
    fn non_object_report_rejected() {
        let err = gate()
            .admit("203.0.113.5", Some(&json!("checks")), "ua", Timestamp::new(0))
            .unwrap_err();
        assert_eq!(reason(err), RejectReason::InvalidInput);
    }

    // ── Classification outcomes ─────────────────────────────────────────

    #[test]
    fn clean_report_admitted_with_high_trust() {
        let admission = gate()
            .admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1000))
            .unwrap();
        assert_eq!(admission.trust_score, TrustScore::High);
        assert_eq!(admission.suspicious_count, 0);
    }

    #[test]
    fn bot_detection_is_terminal_and_writes_nothing() {
        let gate = gate();
        let mut checks = clean_checks();
        checks["isBot"] = json!(true);

        let err = gate
            .admit("203.0.113.5", Some(&checks), "ua", Timestamp::new(1000))
            .unwrap_err();
        let r = reason(err);
        assert_eq!(r, RejectReason::BotDetection);
        assert!(r.is_terminal());

        // No ticket was written: a subsequent verify finds nothing.
        assert!(!gate.verify("203.0.113.5", Timestamp::new(1001)));
    }

    #[test]
    fn aggregate_suspicion_rejected_retryable() {
        let mut checks = clean_checks();
        checks["isEmbedded"] = json!(true);
        checks["hasAdBlock"] = json!(true);
        checks["isIncognito"] = json!(true);

        let err = gate()
            .admit("203.0.113.5", Some(&checks), "ua", Timestamp::new(1000))
            .unwrap_err();
        let r = reason(err);
        assert_eq!(r, RejectReason::MultipleSuspiciousIndicators { indicators: 3 });
        assert!(!r.is_terminal());
    }

    #[test]
    fn suspicion_within_threshold_still_classifies_clean() {
        // Two indicators sit at the classifier threshold, not above it.
        let mut checks = clean_checks();
        checks["isEmbedded"] = json!(true);
        checks["hasAdBlock"] = json!(true);

        let admission = gate()
            .admit("203.0.113.5", Some(&checks), "ua", Timestamp::new(1000))
            .unwrap();
        assert_eq!(admission.trust_score, TrustScore::High);
        assert_eq!(admission.suspicious_count, 2);
    }

    #[test]
    fn admitted_suspicious_report_gets_low_trust() {
        // With a zero classifier threshold but a roomier rejection threshold,
        // a single indicator classifies Suspicious yet is still admitted.
        let params = GateParams {
            suspicious_threshold: 0,
            rejection_threshold: 2,
            ..GateParams::default()
        };
        let gate = AdmissionGate::new(Arc::new(MemoryStore::new()), params);
        let mut checks = clean_checks();
        checks["isEmbedded"] = json!(true);

        let admission = gate
            .admit("203.0.113.5", Some(&checks), "ua", Timestamp::new(1000))
            .unwrap();
        assert_eq!(admission.trust_score, TrustScore::Low);
        assert_eq!(admission.suspicious_count, 1);
    }

    #[test]
    fn rejection_threshold_tunable_independently() {
        // Classifier threshold 0 makes one indicator Suspicious(1); a
        // rejection threshold of 0 then refuses it.
        let params = GateParams {
            suspicious_threshold: 0,
            rejection_threshold: 0,
            ..GateParams::default()
        };
        let gate = AdmissionGate::new(Arc::new(MemoryStore::new()), params);
        let mut checks = clean_checks();
        checks["isEmbedded"] = json!(true);

        let err = gate
            .admit("203.0.113.5", Some(&checks), "ua", Timestamp::new(1000))
            .unwrap_err();
        assert_eq!(
            reason(err),
            RejectReason::MultipleSuspiciousIndicators { indicators: 1 }
        );
    }

    // ── Ticket lifecycle ────────────────────────────────────────────────

    #[test]
    fn verify_true_within_ttl_false_after() {
        let gate = gate();
        gate.admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1000))
            .unwrap();

        assert!(gate.verify("203.0.113.5", Timestamp::new(1000)));
        assert!(gate.verify("203.0.113.5", Timestamp::new(1000 + 899)));
        // 15 minutes later the ticket has expired.
        assert!(!gate.verify("203.0.113.5", Timestamp::new(1000 + 900)));
        // 16 minutes, definitely gone.
        assert!(!gate.verify("203.0.113.5", Timestamp::new(1000 + 960)));
    }

    #[test]
    fn verify_unknown_or_malformed_ip_is_false() {
        let gate = gate();
        assert!(!gate.verify("203.0.113.5", Timestamp::new(0)));
        assert!(!gate.verify("not-an-ip", Timestamp::new(0)));
    }

    #[test]
    fn reverification_replaces_ticket() {
        let store = Arc::new(MemoryStore::new());
        let gate = AdmissionGate::new(store.clone(), GateParams::default());

        gate.admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1000))
            .unwrap();
        // Past the debounce window, a second admission replaces the first.
        gate.admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1100))
            .unwrap();

        assert_eq!(store.len(), 1);
        // The surviving ticket is the later one: valid until 1100 + TTL.
        assert!(gate.verify("203.0.113.5", Timestamp::new(1100 + 899)));
    }

    // ── Rate policy ─────────────────────────────────────────────────────

    #[test]
    fn eleventh_insert_in_window_rate_limited() {
        let gate = gate();
        for i in 0..10 {
            gate.admit(
                &format!("10.0.0.{i}"),
                Some(&clean_checks()),
                "ua",
                Timestamp::new(1000 + i),
            )
            .unwrap();
        }

        let err = gate
            .admit("10.0.0.99", Some(&clean_checks()), "ua", Timestamp::new(1020))
            .unwrap_err();
        let r = reason(err);
        assert_eq!(r, RejectReason::RateLimitExceeded);
        assert!(!r.is_terminal());

        // After the 5-minute window has passed the cap frees up.
        gate.admit("10.0.0.99", Some(&clean_checks()), "ua", Timestamp::new(1000 + 301))
            .unwrap();
    }

    #[test]
    fn rapid_reverification_debounced() {
        let gate = gate();
        gate.admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1000))
            .unwrap();

        let err = gate
            .admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1010))
            .unwrap_err();
        assert_eq!(reason(err), RejectReason::RecentVerification);

        // 30 seconds on, the same identifier may re-verify.
        gate.admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1030))
            .unwrap();
    }

    #[test]
    fn rejections_do_not_consume_rate_capacity() {
        let gate = gate();
        let mut bot = clean_checks();
        bot["isBot"] = json!(true);

        // A pile of rejected requests must not count as insertions.
        for i in 0..50 {
            let _ = gate.admit("203.0.113.5", Some(&bot), "ua", Timestamp::new(1000 + i));
        }
        gate.admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(2000))
            .unwrap();
    }

    // ── Concurrent admissions ───────────────────────────────────────────

    /// Store whose writes take long enough that unsynchronized admissions
    /// would overlap their rate checks.
    struct SlowStore(MemoryStore);

    impl TicketStore for SlowStore {
        fn upsert(&self, ticket: VerificationTicket) -> Result<(), StoreError> {
            std::thread::sleep(std::time::Duration::from_millis(100));
            self.0.upsert(ticket)
        }
        fn lookup(&self, ip: ClientIp, ttl: u64, now: Timestamp) -> bool {
            self.0.lookup(ip, ttl, now)
        }
        fn recent_insert(&self, ip: ClientIp, window: u64, now: Timestamp) -> bool {
            self.0.recent_insert(ip, window, now)
        }
        fn recent_insert_count(&self, window: u64, now: Timestamp) -> usize {
            self.0.recent_insert_count(window, now)
        }
        fn snapshot(&self) -> Vec<VerificationTicket> {
            self.0.snapshot()
        }
    }

    fn race(gate: AdmissionGate, ips: [&str; 2]) -> usize {
        let gate = Arc::new(gate);
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = ips
            .map(|ip| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                let ip = ip.to_string();
                std::thread::spawn(move || {
                    barrier.wait();
                    gate.admit(&ip, Some(&clean_checks()), "ua", Timestamp::new(1000))
                        .is_ok()
                })
            })
            .into_iter()
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("admission thread panicked"))
            .filter(|ok| *ok)
            .count()
    }

    #[test]
    fn concurrent_admissions_cannot_exceed_the_global_cap() {
        let params = GateParams {
            rate_max_inserts: 1,
            ..GateParams::default()
        };
        let gate = AdmissionGate::new(Arc::new(SlowStore(MemoryStore::new())), params);
        let successes = race(gate, ["10.0.0.1", "10.0.0.2"]);
        assert_eq!(successes, 1);
    }

    #[test]
    fn concurrent_same_ip_admissions_are_debounced() {
        let gate = AdmissionGate::new(
            Arc::new(SlowStore(MemoryStore::new())),
            GateParams::default(),
        );
        let successes = race(gate, ["203.0.113.5", "203.0.113.5"]);
        assert_eq!(successes, 1);
    }

    // ── Store failure ───────────────────────────────────────────────────

    struct FailingStore;

    impl TicketStore for FailingStore {
        fn upsert(&self, _ticket: VerificationTicket) -> Result<(), StoreError> {
            Err(StoreError::Io("disk full".to_string()))
        }
        fn lookup(&self, _ip: ClientIp, _ttl: u64, _now: Timestamp) -> bool {
            false
        }
        fn recent_insert(&self, _ip: ClientIp, _window: u64, _now: Timestamp) -> bool {
            false
        }
        fn recent_insert_count(&self, _window: u64, _now: Timestamp) -> usize {
            0
        }
        fn snapshot(&self) -> Vec<VerificationTicket> {
            Vec::new()
        }
    }

    #[test]
    fn store_write_failure_surfaces_as_internal_error() {
        let gate = AdmissionGate::new(Arc::new(FailingStore), GateParams::default());
        let err = gate
            .admit("203.0.113.5", Some(&clean_checks()), "ua", Timestamp::new(1000))
            .unwrap_err();
        assert!(matches!(err, AdmissionError::Store(_)));

        // The failed write consumed no limiter capacity.
        assert!(gate
            .limiter
            .lock()
            .unwrap()
            .admit_insert(Timestamp::new(1000)));
    }
}
