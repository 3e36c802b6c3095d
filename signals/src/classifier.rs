//! Trust classifier — a pure function from a validated report to a
//! classification.
//!
//! Rule, in order: any critical signal firing dominates everything else;
//! otherwise the suspicious-count threshold decides between `Suspicious`
//! and `Clean`. Deterministic, no side effects.

use crate::schema::SignalReport;
use checkpoint_types::{GateParams, TrustClassification};

/// The classification together with the count that produced it.
///
/// The count is carried even for `Clean` reports: admitted tickets record
/// it as metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrustEvaluation {
    pub classification: TrustClassification,
    pub suspicious_count: u32,
}

/// Classify a validated signal report.
pub fn classify(report: &SignalReport, params: &GateParams) -> TrustEvaluation {
    if report.has_critical_violation() {
        return TrustEvaluation {
            classification: TrustClassification::CriticalViolation,
            suspicious_count: report.suspicious_count(),
        };
    }

    let count = report.suspicious_count();
    let classification = if count > params.suspicious_threshold {
        TrustClassification::Suspicious(count)
    } else {
        TrustClassification::Clean
    };

    TrustEvaluation {
        classification,
        suspicious_count: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SignalSchema;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn report(raw: &Value) -> SignalReport {
        SignalReport::from_value(raw, &SignalSchema::default()).unwrap()
    }

    #[test]
    fn clean_report_classifies_clean() {
        let eval = classify(&report(&json!({"isBot": false})), &GateParams::default());
        assert_eq!(eval.classification, TrustClassification::Clean);
        assert_eq!(eval.suspicious_count, 0);
    }

    #[test]
    fn critical_signal_is_hard_stop() {
        let eval = classify(&report(&json!({"isBot": true})), &GateParams::default());
        assert_eq!(eval.classification, TrustClassification::CriticalViolation);
    }

    #[test]
    fn count_at_threshold_stays_clean() {
        // Two suspicious indicators: not > 2, so still Clean.
        let raw = json!({"isEmbedded": true, "hasAdBlock": true});
        let eval = classify(&report(&raw), &GateParams::default());
        assert_eq!(eval.classification, TrustClassification::Clean);
        assert_eq!(eval.suspicious_count, 2);
    }

    #[test]
    fn count_above_threshold_is_suspicious() {
        let raw = json!({"isEmbedded": true, "hasAdBlock": true, "isIncognito": true});
        let eval = classify(&report(&raw), &GateParams::default());
        assert_eq!(eval.classification, TrustClassification::Suspicious(3));
        assert_eq!(eval.suspicious_count, 3);
    }

    #[test]
    fn threshold_is_tunable() {
        let params = GateParams {
            suspicious_threshold: 0,
            ..GateParams::default()
        };
        let eval = classify(&report(&json!({"isEmbedded": true})), &params);
        assert_eq!(eval.classification, TrustClassification::Suspicious(1));
    }

    #[test]
    fn classification_is_deterministic() {
        let raw = json!({"isEmbedded": true, "hasAdBlock": true, "isIncognito": true});
        let params = GateParams::default();
        let a = classify(&report(&raw), &params);
        let b = classify(&report(&raw), &params);
        assert_eq!(a, b);
    }

    proptest! {
        /// Critical dominates: with any critical flag set, every combination
        /// of the remaining signal values still classifies as a violation.
        #[test]
        fn critical_dominates_all_other_signals(
            critical_idx in 0usize..5,
            embedded: bool,
            adblock: bool,
            incognito: bool,
            clean_load: bool,
            viewport: bool,
            timezone: bool,
            canvas: bool,
            trusted: bool,
            width in 0u32..20_000,
            cores in 0u32..2_048,
        ) {
            let critical_names =
                ["isBot", "hasWebdriver", "hasSelenium", "hasHeadless", "hasAutomation"];
            let mut raw = json!({
                "isEmbedded": embedded,
                "hasAdBlock": adblock,
                "isIncognito": incognito,
                "isCleanLoad": clean_load,
                "hasValidViewport": viewport,
                "hasValidTimezone": timezone,
                "hasValidCanvas": canvas,
                "isTrustedDevice": trusted,
                "screenWidth": width,
                "hardwareConcurrency": cores,
            });
            raw[critical_names[critical_idx]] = json!(true);

            let eval = classify(&report(&raw), &GateParams::default());
            prop_assert_eq!(
                eval.classification,
                TrustClassification::CriticalViolation
            );
        }

        /// Without critical signals the classifier never yields a violation,
        /// and the suspicious count it carries matches the report's.
        #[test]
        fn no_critical_never_violates(
            embedded: bool,
            adblock: bool,
            incognito: bool,
            clean_load: bool,
        ) {
            let raw = json!({
                "isEmbedded": embedded,
                "hasAdBlock": adblock,
                "isIncognito": incognito,
                "isCleanLoad": clean_load,
            });
            let rep = report(&raw);
            let eval = classify(&rep, &GateParams::default());
            prop_assert_ne!(
                eval.classification,
                TrustClassification::CriticalViolation
            );
            prop_assert_eq!(eval.suspicious_count, rep.suspicious_count());
        }
    }
}
