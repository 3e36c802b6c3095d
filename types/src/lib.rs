//! Fundamental types for the checkpoint admission gate.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: client identifiers, timestamps, trust classifications, and the
//! tunable gate parameters.

pub mod ip;
pub mod params;
pub mod time;
pub mod trust;

pub use ip::{ClientIp, InvalidIpError};
pub use params::GateParams;
pub use time::Timestamp;
pub use trust::{TrustClassification, TrustScore};
