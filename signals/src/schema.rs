//! Signal schema and report intake.
//!
//! The schema is an explicit ordered list of `SignalSpec`s instead of a
//! growing untyped record: the classifier iterates the schema, so adding a
//! detector means adding one spec entry, not another named field.

use crate::error::SignalError;
use checkpoint_types::GateParams;
use serde_json::Value;

/// How strongly a signal counts against the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalCategory {
    /// Firing alone rejects the request outright with no retry offered.
    Critical,
    /// Only rejects in aggregate, past the suspicious-count threshold.
    Secondary,
}

/// How a reported value is judged suspicious.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalKind {
    /// Boolean signal; suspicious when it equals `suspect_when`.
    ///
    /// Covers both polarities: `isBot` is suspect when `true`,
    /// `isCleanLoad` is suspect when `false`.
    Flag { suspect_when: bool },
    /// Numeric signal; suspicious outside the inclusive range.
    Bounded { min: f64, max: f64 },
}

/// One named signal in the schema.
#[derive(Clone, Debug)]
pub struct SignalSpec {
    pub name: &'static str,
    pub category: SignalCategory,
    pub kind: SignalKind,
}

impl SignalSpec {
    const fn flag(name: &'static str, category: SignalCategory, suspect_when: bool) -> Self {
        Self {
            name,
            category,
            kind: SignalKind::Flag { suspect_when },
        }
    }

    const fn bounded(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            category: SignalCategory::Secondary,
            kind: SignalKind::Bounded { min, max },
        }
    }
}

/// The ordered set of signals the gate understands.
#[derive(Clone, Debug)]
pub struct SignalSchema {
    specs: Vec<SignalSpec>,
}

impl SignalSchema {
    /// Build the schema for the given policy parameters.
    ///
    /// `privacy_signals_critical` promotes ad-block and incognito detection
    /// from secondary indicators to critical violations.
    pub fn for_params(params: &GateParams) -> Self {
        use SignalCategory::{Critical, Secondary};

        let privacy = if params.privacy_signals_critical {
            Critical
        } else {
            Secondary
        };

        let specs = vec![
            // Automation markers: each one alone is a hard stop.
            SignalSpec::flag("isBot", Critical, true),
            SignalSpec::flag("hasWebdriver", Critical, true),
            SignalSpec::flag("hasSelenium", Critical, true),
            SignalSpec::flag("hasHeadless", Critical, true),
            SignalSpec::flag("hasAutomation", Critical, true),
            // Context indicators.
            SignalSpec::flag("isEmbedded", Secondary, true),
            SignalSpec::flag("hasAdBlock", privacy, true),
            SignalSpec::flag("isIncognito", privacy, true),
            // Expected-environment indicators: suspicious when absent.
            SignalSpec::flag("isCleanLoad", Secondary, false),
            SignalSpec::flag("hasValidViewport", Secondary, false),
            SignalSpec::flag("hasValidTimezone", Secondary, false),
            SignalSpec::flag("hasValidLanguage", Secondary, false),
            SignalSpec::flag("hasValidCanvas", Secondary, false),
            SignalSpec::flag("hasValidWebGL", Secondary, false),
            SignalSpec::flag("isTrustedDevice", Secondary, false),
            // Hardware plausibility bounds.
            SignalSpec::bounded("screenWidth", 320.0, 16384.0),
            SignalSpec::bounded("hardwareConcurrency", 1.0, 1024.0),
        ];

        Self { specs }
    }

    pub fn specs(&self) -> &[SignalSpec] {
        &self.specs
    }
}

impl Default for SignalSchema {
    fn default() -> Self {
        Self::for_params(&GateParams::default())
    }
}

/// One evaluated signal: the spec it matched plus the verdict for the
/// reported value.
#[derive(Clone, Debug)]
pub struct Signal {
    pub name: &'static str,
    pub category: SignalCategory,
    pub suspicious: bool,
    /// Whether the caller actually reported a usable value. Missing or
    /// wrongly-typed values are neutral, never suspicious.
    pub reported: bool,
}

/// A validated environment report: the schema's signals in schema order,
/// each evaluated against the caller-supplied values.
#[derive(Clone, Debug)]
pub struct SignalReport {
    signals: Vec<Signal>,
}

impl SignalReport {
    /// Validate a raw JSON report against the schema.
    ///
    /// The report must be a JSON object. Unknown field names are ignored;
    /// missing or wrongly-typed fields evaluate to neutral.
    pub fn from_value(raw: &Value, schema: &SignalSchema) -> Result<Self, SignalError> {
        let fields = raw.as_object().ok_or_else(|| {
            SignalError::MalformedReport(format!("expected object, got {}", json_kind(raw)))
        })?;

        let signals = schema
            .specs()
            .iter()
            .map(|spec| evaluate(spec, fields.get(spec.name)))
            .collect();

        Ok(Self { signals })
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Count of suspicious secondary signals.
    pub fn suspicious_count(&self) -> u32 {
        self.signals
            .iter()
            .filter(|s| s.category == SignalCategory::Secondary && s.suspicious)
            .count() as u32
    }

    /// Whether any critical signal fired.
    pub fn has_critical_violation(&self) -> bool {
        self.signals
            .iter()
            .any(|s| s.category == SignalCategory::Critical && s.suspicious)
    }
}

fn evaluate(spec: &SignalSpec, value: Option<&Value>) -> Signal {
    let (suspicious, reported) = match (&spec.kind, value) {
        (SignalKind::Flag { suspect_when }, Some(Value::Bool(b))) => (b == suspect_when, true),
        (SignalKind::Bounded { min, max }, Some(v)) => match v.as_f64() {
            Some(n) => (n < *min || n > *max, true),
            None => (false, false),
        },
        // Missing, null, or type mismatch: neutral.
        _ => (false, false),
    };

    Signal {
        name: spec.name,
        category: spec.category,
        suspicious,
        reported,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
