//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Verify ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Kept as a raw string: a malformed identifier means "never verified",
    /// not a request error.
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

// ── Admission ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTempRequest {
    pub ip: Option<String>,
    pub browser_checks: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTempResponse {
    pub success: bool,
    pub message: &'static str,
    pub trust_score: checkpoint_types::TrustScore,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<u32>,
}

// ── IP detection ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IpResponse {
    pub ip: String,
    pub source: &'static str,
    pub method: &'static str,
}

// ── Admin data view ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub total_entries: usize,
    pub data: Value,
    /// ISO-8601 instant of the newest record, or null when empty.
    pub last_updated: Option<String>,
}

// ── Diagnostics ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DiagnosticResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: String,
    pub port: u16,
    pub endpoints: Vec<&'static str>,
}
