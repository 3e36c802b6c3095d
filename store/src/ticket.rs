//! The verification ticket and its persisted wire form.
//!
//! A ticket asserts that an identifier passed admission at a point in time.
//! The store owns tickets exclusively; callers query by identifier and never
//! hold a mutable reference.

use checkpoint_types::{ClientIp, Timestamp, TrustScore};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A short-lived record asserting that an identifier passed admission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationTicket {
    pub ip: ClientIp,
    pub issued_at: Timestamp,
    pub trust_score: TrustScore,
    pub suspicious_count: u32,
    pub user_agent: String,
}

// ── Persisted form ───────────────────────────────────────────────────────
//
// The on-disk layout keeps the original checkpoint's record shape so
// existing data files remain readable:
//   {ip, timestamp: ISO-8601, userAgent,
//    browserChecks: {trustScore, suspiciousIndicators, verifiedAt}}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketRecord {
    ip: ClientIp,
    timestamp: String,
    user_agent: String,
    browser_checks: ChecksRecord,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChecksRecord {
    trust_score: TrustScore,
    suspicious_indicators: u32,
    verified_at: String,
}

impl Serialize for VerificationTicket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let iso = self.issued_at.to_rfc3339();
        TicketRecord {
            ip: self.ip,
            timestamp: iso.clone(),
            user_agent: self.user_agent.clone(),
            browser_checks: ChecksRecord {
                trust_score: self.trust_score,
                suspicious_indicators: self.suspicious_count,
                verified_at: iso,
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerificationTicket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = TicketRecord::deserialize(deserializer)?;
        let issued_at = Timestamp::from_rfc3339(&record.timestamp)
            .ok_or_else(|| D::Error::custom(format!("bad timestamp {:?}", record.timestamp)))?;
        Ok(Self {
            ip: record.ip,
            issued_at,
            trust_score: record.browser_checks.trust_score,
            suspicious_count: record.browser_checks.suspicious_indicators,
            user_agent: record.user_agent,
        })
    }
}
