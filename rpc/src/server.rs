//! Axum-based HTTP server and request handlers.

use crate::error::{status_for_error, RpcError};
use crate::handlers::{
    AddTempRequest, AddTempResponse, DataResponse, DiagnosticResponse, ErrorResponse, IpResponse,
    VerifyRequest, VerifyResponse,
};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use checkpoint_admission::{AdmissionError, AdmissionGate, RejectReason};
use checkpoint_types::Timestamp;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// The interactive challenge page. A placeholder: production deployments
/// put the real checkpoint frontend behind a CDN.
const CHALLENGE_PAGE: &str = include_str!("../assets/challenge.html");

/// Shared state for all handlers.
pub struct AppState {
    pub gate: AdmissionGate,
    pub started_at: Timestamp,
    pub port: u16,
}

/// The HTTP server, configured with a port and the admission gate.
pub struct RpcServer {
    state: Arc<AppState>,
}

impl RpcServer {
    pub fn new(port: u16, gate: AdmissionGate) -> Self {
        Self {
            state: Arc::new(AppState {
                gate,
                started_at: Timestamp::now(),
                port,
            }),
        }
    }

    /// Build the router. The challenge page may be served from another
    /// origin, so CORS is wide open.
    pub fn router(state: Arc<AppState>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/verify", post(verify))
            .route("/addtemp", get(challenge_page).post(addtemp))
            .route("/api/ip", get(api_ip))
            .route("/api/data", get(api_data))
            .route("/diagnostic", get(diagnostic))
            .layer(cors)
            .with_state(state)
    }

    /// Start serving. Runs until the process is shut down.
    pub async fn start(&self) -> Result<(), RpcError> {
        let addr = format!("0.0.0.0:{}", self.state.port);
        let app = Self::router(self.state.clone());

        info!("checkpoint gate listening on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Bind(e.to_string()))?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// `POST /verify` — is this identifier currently admitted?
///
/// A missing `ip` field is a request error; a malformed one means "never
/// verified" and answers `valid: false`.
async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> (StatusCode, Json<Value>) {
    let Some(ip) = req.ip.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "IP address is required" })),
        );
    };
    let valid = state.gate.verify(ip, Timestamp::now());
    (StatusCode::OK, Json(to_value(&VerifyResponse { valid })))
}

/// `POST /addtemp` — run the admission decision and issue a ticket.
async fn addtemp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AddTempRequest>,
) -> (StatusCode, Json<Value>) {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown");

    let Some(ip) = req.ip.as_deref() else {
        return reject(RejectReason::InvalidInput);
    };

    match state
        .gate
        .admit(ip, req.browser_checks.as_ref(), user_agent, Timestamp::now())
    {
        Ok(admission) => {
            let body = AddTempResponse {
                success: true,
                message: "IP verification successful",
                trust_score: admission.trust_score,
            };
            (StatusCode::OK, Json(to_value(&body)))
        }
        Err(AdmissionError::Rejected(reason)) => reject(reason),
        Err(err @ AdmissionError::Store(_)) => {
            error!("admission failed: {err}");
            let body = ErrorResponse {
                error: "Internal server error",
                reason: "server_error",
                indicators: None,
            };
            (status_for_error(&err), Json(to_value(&body)))
        }
    }
}

fn reject(reason: RejectReason) -> (StatusCode, Json<Value>) {
    let indicators = match reason {
        RejectReason::MultipleSuspiciousIndicators { indicators } => Some(indicators),
        _ => None,
    };
    let body = ErrorResponse {
        error: reason.message(),
        reason: reason.code(),
        indicators,
    };
    (crate::error::status_for(&reason), Json(to_value(&body)))
}

/// `GET /addtemp` — the interactive challenge page.
async fn challenge_page() -> Html<&'static str> {
    Html(CHALLENGE_PAGE)
}

/// `GET /api/ip` — report the identifier the server observed, for clients
/// whose provider chain came up empty.
async fn api_ip(
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    match detect_client_ip(&headers, remote.ip()) {
        Some((ip, method)) => {
            let body = IpResponse {
                ip: ip.to_string(),
                source: "server",
                method,
            };
            (StatusCode::OK, Json(to_value(&body)))
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Unable to determine valid IPv4 address",
            })),
        ),
    }
}

/// `GET /api/data` — the held records, for debugging and admin use.
async fn api_data(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tickets = state.gate.tickets();
    let last_updated = tickets
        .iter()
        .map(|t| t.issued_at)
        .max()
        .map(|ts| ts.to_rfc3339());
    let body = DataResponse {
        total_entries: tickets.len(),
        data: to_value(&tickets),
        last_updated,
    };
    Json(to_value(&body))
}

/// `GET /diagnostic` — liveness probe with basic server facts.
async fn diagnostic(State(state): State<Arc<AppState>>) -> Json<Value> {
    let now = Timestamp::now();
    let body = DiagnosticResponse {
        status: "ok",
        timestamp: now.to_rfc3339(),
        uptime: format_uptime(state.started_at.elapsed_since(now)),
        port: state.port,
        endpoints: vec!["/verify", "/addtemp", "/api/ip", "/api/data", "/diagnostic"],
    };
    Json(to_value(&body))
}

/// Uptime as its two most significant units, e.g. "3m 42s" or "2d 5h".
fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;
    match (days, hours, mins) {
        (0, 0, 0) => format!("{secs}s"),
        (0, 0, m) => format!("{m}m {secs}s"),
        (0, h, m) => format!("{h}h {m}m"),
        (d, h, _) => format!("{d}d {h}h"),
    }
}

fn to_value<T: serde::Serialize>(body: &T) -> Value {
    serde_json::to_value(body).expect("response bodies are always serializable")
}

// ── Client IP detection ──────────────────────────────────────────────────

/// Resolve the caller's IPv4 identifier.
///
/// Precedence: CDN-asserted client IP, then the first hop of a generic
/// forwarded-for header, then a reverse-proxy real-ip header, then the raw
/// transport address. The first candidate that normalizes to IPv4 wins.
fn detect_client_ip(headers: &HeaderMap, remote: IpAddr) -> Option<(Ipv4Addr, &'static str)> {
    if let Some(ip) = header_ip(headers, "cf-connecting-ip") {
        return Some((ip, "cloudflare"));
    }
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = value.split(',').next() {
            if let Some(ip) = normalize_ipv4(first.trim()) {
                return Some((ip, "forwarded"));
            }
        }
    }
    if let Some(ip) = header_ip(headers, "x-real-ip") {
        return Some((ip, "real-ip"));
    }
    match remote {
        IpAddr::V4(v4) => Some((v4, "direct")),
        IpAddr::V6(v6) if v6.is_loopback() => Some((Ipv4Addr::LOCALHOST, "direct")),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(|v4| (v4, "direct")),
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<Ipv4Addr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| normalize_ipv4(s.trim()))
}

/// Parse a textual address into IPv4, unwrapping IPv6 localhost and
/// IPv6-mapped (`::ffff:a.b.c.d`) forms.
fn normalize_ipv4(s: &str) -> Option<Ipv4Addr> {
    if s == "::1" {
        return Some(Ipv4Addr::LOCALHOST);
    }
    if let Some(stripped) = s.strip_prefix("::ffff:") {
        return stripped.parse().ok();
    }
    s.parse().ok()
}
