//! HTTP submission to the gate and the glue that drives the workflow.

use crate::error::ClientError;
use crate::providers::{resolve_ip, IpProvider};
use crate::workflow::Workflow;
use checkpoint_types::TrustScore;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::info;

/// Reason codes that get a static failure message instead of a retry
/// challenge: input errors, automation detection, and the capacity cap
/// (whose remedy is waiting out the window, not re-running the checks).
const NO_CHALLENGE_REASONS: &[&str] = &[
    "invalid_input",
    "invalid_ip_format",
    "bot_detection",
    "rate_limit_exceeded",
];

/// The gate's refusal, as parsed off the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
    pub message: String,
    pub indicators: Option<u32>,
}

impl Rejection {
    pub fn is_retryable(&self) -> bool {
        !NO_CHALLENGE_REASONS.contains(&self.reason.as_str())
    }
}

/// Outcome of one admission attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Admitted { trust_score: TrustScore },
    Rejected(Rejection),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody {
    trust_score: TrustScore,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
    indicators: Option<u32>,
}

#[derive(Deserialize)]
struct VerifyBody {
    valid: bool,
}

/// Client for one checkpoint gate.
pub struct GateClient {
    http: reqwest::Client,
    base_url: String,
}

impl GateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Submit `{ip, browserChecks}` and parse the gate's decision.
    pub async fn submit(
        &self,
        ip: Ipv4Addr,
        browser_checks: &Value,
    ) -> Result<AdmissionOutcome, ClientError> {
        let resp = self
            .http
            .post(format!("{}/addtemp", self.base_url))
            .json(&json!({ "ip": ip.to_string(), "browserChecks": browser_checks }))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            let parsed: SuccessBody = serde_json::from_str(&body)
                .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
            return Ok(AdmissionOutcome::Admitted {
                trust_score: parsed.trust_score,
            });
        }

        let parsed: ErrorBody = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        Ok(AdmissionOutcome::Rejected(Rejection {
            reason: parsed.reason,
            message: parsed.error,
            indicators: parsed.indicators,
        }))
    }

    /// Ask whether `ip` currently holds a valid ticket.
    pub async fn verify(&self, ip: Ipv4Addr) -> Result<bool, ClientError> {
        let resp = self
            .http
            .post(format!("{}/verify", self.base_url))
            .json(&json!({ "ip": ip.to_string() }))
            .send()
            .await?;
        let body: VerifyBody = resp
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        Ok(body.valid)
    }

    /// Run one full verification attempt, driving `workflow` through its
    /// states: resolve the IP, submit, and settle on success or failure.
    pub async fn run_attempt(
        &self,
        workflow: &mut Workflow,
        providers: &[IpProvider],
        provider_timeout: Duration,
        browser_checks: &Value,
    ) -> Result<AdmissionOutcome, ClientError> {
        workflow.begin()?;
        let ip = match resolve_ip(&self.http, providers, provider_timeout).await {
            Ok(ip) => ip,
            Err(err) => {
                // Resolution failure counts as a retryable failed attempt.
                workflow.submit()?;
                workflow.fail(true)?;
                return Err(err);
            }
        };

        workflow.submit()?;
        let outcome = self.submit(ip, browser_checks).await?;
        match &outcome {
            AdmissionOutcome::Admitted { trust_score } => {
                info!(%ip, %trust_score, "admitted");
                workflow.succeed()?;
            }
            AdmissionOutcome::Rejected(rejection) => {
                info!(%ip, reason = %rejection.reason, "rejected");
                workflow.fail(rejection.is_retryable())?;
            }
        }
        Ok(outcome)
    }
}
