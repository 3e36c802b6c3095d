//! JSON-file-backed ticket store.
//!
//! The full record set is rewritten wholesale on every mutation, matching
//! the original data-file format. Failure handling is asymmetric on
//! purpose: a file that cannot be read or parsed degrades to an empty store
//! so the gate stays available, while a failed write surfaces as an error
//! and commits nothing.

use crate::{StoreError, TicketStore, VerificationTicket};
use checkpoint_types::{ClientIp, Timestamp};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Ticket store persisted as a JSON array of records.
///
/// All mutations go through one mutex guarding the in-memory record set and
/// the file write, so concurrent upserts cannot lose each other's tickets.
pub struct JsonFileStore {
    path: PathBuf,
    tickets: Mutex<Vec<VerificationTicket>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading any existing records.
    ///
    /// A missing, unreadable, or corrupt file starts the store empty rather
    /// than failing: the gate must keep admitting while an operator
    /// investigates.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let tickets = load_records(&path);
        Self {
            path,
            tickets: Mutex::new(tickets),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tickets: &[VerificationTicket]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tickets)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Io(e.to_string()))
    }
}

fn load_records(path: &Path) -> Vec<VerificationTicket> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), "ticket file unreadable, starting empty: {e}");
            return Vec::new();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), "ticket file corrupt, starting empty: {e}");
            Vec::new()
        }
    }
}

impl TicketStore for JsonFileStore {
    fn upsert(&self, ticket: VerificationTicket) -> Result<(), StoreError> {
        let mut tickets = self.tickets.lock().expect("ticket lock poisoned");

        // Build the replacement set first; commit to memory only after the
        // file write succeeds, so a failed write leaves no partial state.
        let mut next: Vec<VerificationTicket> =
            tickets.iter().filter(|t| t.ip != ticket.ip).cloned().collect();
        next.push(ticket);

        self.persist(&next)?;
        *tickets = next;
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
