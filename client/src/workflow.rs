//! Verification workflow state machine.
//!
//! The states mirror what a challenge page walks a visitor through:
//! collect signals, submit, and either pass or land on a retry challenge.
//! Terminal failures (automation detected, unusable input) have no edge to
//! the challenge; the visitor cannot retry their way past them.

use crate::error::ClientError;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing in flight.
    Idle,
    /// Gathering browser signals and resolving the public IP.
    Collecting,
    /// Submission sent, awaiting the gate's decision.
    Verifying,
    /// Admitted; a ticket was issued.
    Success,
    /// Refused. `retryable` decides whether a challenge may follow.
    Failed { retryable: bool },
    /// Showing the retry challenge to the visitor.
    Challenge,
}

/// Tracks the workflow position and enforces legal transitions.
#[derive(Debug)]
pub struct Workflow {
    state: WorkflowState,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Idle → Collecting.
    pub fn begin(&mut self) -> Result<(), ClientError> {
        self.transition(WorkflowState::Idle, WorkflowState::Collecting)
    }

    /// Collecting → Verifying.
    pub fn submit(&mut self) -> Result<(), ClientError> {
        self.transition(WorkflowState::Collecting, WorkflowState::Verifying)
    }

    /// Verifying → Success.
    pub fn succeed(&mut self) -> Result<(), ClientError> {
        self.transition(WorkflowState::Verifying, WorkflowState::Success)
    }

    /// Verifying → Failed.
    pub fn fail(&mut self, retryable: bool) -> Result<(), ClientError> {
        self.transition(WorkflowState::Verifying, WorkflowState::Failed { retryable })
    }

    /// Failed(retryable) → Challenge. A terminal failure has no such edge.
    pub fn challenge(&mut self) -> Result<(), ClientError> {
        self.transition(
            WorkflowState::Failed { retryable: true },
            WorkflowState::Challenge,
        )
    }

    /// Challenge → Verifying (the visitor retried).
    pub fn retry(&mut self) -> Result<(), ClientError> {
        self.transition(WorkflowState::Challenge, WorkflowState::Verifying)
    }

    /// Challenge → Idle (the visitor gave up). Any in-flight request is
    /// simply dropped; nothing was written server-side.
    pub fn cancel(&mut self) -> Result<(), ClientError> {
        self.transition(WorkflowState::Challenge, WorkflowState::Idle)
    }

    fn transition(&mut self, expected: WorkflowState, to: WorkflowState) -> Result<(), ClientError> {
        if self.state != expected {
            return Err(ClientError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = ?self.state, ?to, "workflow transition");
        self.state = to;
        Ok(())
    }
}
