//! Domain model for the fund ledger and presence roster.
//!
//! # Responsibility
//! - Define canonical data structures used by storage, replication and
//!   presence.
//! - Keep validation of caller-supplied input next to the types it guards.
//!
//! # Invariants
//! - Every ledger record is identified by a stable `RecordId`.
//! - Presence identities are keyed by `name`; the latest broadcast for a
//!   name fully replaces earlier attributes.

pub mod identity;
pub mod record;
pub mod stats;
