//! Client side of the checkpoint gate.
//!
//! Two pieces: the verification workflow state machine, and the IP provider
//! chain that resolves the caller's public IPv4 before submission.

pub mod error;
pub mod gateway;
pub mod providers;
pub mod workflow;

pub use error::ClientError;
pub use gateway::{AdmissionOutcome, GateClient, Rejection};
pub use providers::{resolve_ip, IpProvider, ProviderFormat};
pub use workflow::{Workflow, WorkflowState};
