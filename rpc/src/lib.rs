//! HTTP server for the checkpoint gate.
//!
//! Provides endpoints for:
//! - Ticket lookup (`POST /verify`)
//! - Admission (`POST /addtemp`) and the interactive challenge page
//!   (`GET /addtemp`)
//! - Server-observed client IP fallback (`GET /api/ip`)
//! - Liveness diagnostics (`GET /diagnostic`)

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{AppState, RpcServer};
