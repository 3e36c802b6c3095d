//! TTL-aware storage for verification tickets.
//!
//! Every storage backend (JSON file, in-memory for testing) implements the
//! `TicketStore` trait. The rest of the workspace depends only on the trait.
//!
//! Invariants every backend upholds:
//! - at most one ticket per identifier; `upsert` atomically replaces;
//! - mutations are serialized behind one lock;
//! - expiry is evaluated at lookup time, never by active deletion;
//! - read failures degrade to an empty store, write failures surface.

pub mod error;
pub mod file;
pub mod memory;
pub mod ticket;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use ticket::VerificationTicket;

use checkpoint_types::{ClientIp, Timestamp};

/// Storage for verification tickets, keyed by client identifier.
///
/// Implementations synchronize internally; all methods take `&self`.
pub trait TicketStore: Send + Sync {
    /// Insert a ticket, replacing any existing ticket for the same
    /// identifier. The replacement is atomic: concurrent upserts never leave
    /// two tickets for one identifier, and an upsert that fails to persist
    /// commits nothing.
    fn upsert(&self, ticket: VerificationTicket) -> Result<(), StoreError>;

    /// Whether a ticket exists for `ip` and is still inside its TTL.
    ///
    /// Absent, expired, and never-verified identifiers all answer `false`.
    fn lookup(&self, ip: ClientIp, ttl_secs: u64, now: Timestamp) -> bool;

    /// Whether a ticket for `ip` was written within the trailing
    /// `window_secs` (the debounce probe).
    fn recent_insert(&self, ip: ClientIp, window_secs: u64, now: Timestamp) -> bool;

    /// How many tickets, across all identifiers, were written within the
    /// trailing `window_secs`. Used to warm the rate limiter on restart.
    fn recent_insert_count(&self, window_secs: u64, now: Timestamp) -> usize;

    /// A copy of every held record, in insertion order, expired or not.
    /// Serves the admin data view; expiry stays a lookup-time concern.
    fn snapshot(&self) -> Vec<VerificationTicket>;
}
