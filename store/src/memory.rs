//! In-memory ticket store for tests and ephemeral deployments.

use crate::{StoreError, TicketStore, VerificationTicket};
use checkpoint_types::{ClientIp, Timestamp};
use std::sync::Mutex;

/// Ticket store backed by a plain `Vec` behind a mutex. Nothing persists.
#[derive(Default)]
pub struct MemoryStore {
    tickets: Mutex<Vec<VerificationTicket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records (test helper, ignores TTL).
    pub fn len(&self) -> usize {
        self.tickets.lock().expect("ticket lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TicketStore for MemoryStore {
    fn upsert(&self, ticket: VerificationTicket) -> Result<(), StoreError> {
        let mut tickets = self.tickets.lock().expect("ticket lock poisoned");
        tickets.retain(|t| t.ip != ticket.ip);
        tickets.push(ticket);
        Ok(())
    }

    fn lookup(&self, ip: ClientIp, ttl_secs: u64, now: Timestamp) -> bool {
        let tickets = self.tickets.lock().expect("ticket lock poisoned");
        tickets
            .iter()
            .any(|t| t.ip == ip && !t.issued_at.has_expired(ttl_secs, now))
    }

    fn recent_insert(&self, ip: ClientIp, window_secs: u64, now: Timestamp) -> bool {
        let tickets = self.tickets.lock().expect("ticket lock poisoned");
        tickets
            .iter()
            .any(|t| t.ip == ip && t.issued_at.within_window(window_secs, now))
    }

    fn recent_insert_count(&self, window_secs: u64, now: Timestamp) -> usize {
        let tickets = self.tickets.lock().expect("ticket lock poisoned");
        tickets
            .iter()
            .filter(|t| t.issued_at.within_window(window_secs, now))
            .count()
    }

    fn snapshot(&self) -> Vec<VerificationTicket> {
        self.tickets.lock().expect("ticket lock poisoned").clone()
    }
}
