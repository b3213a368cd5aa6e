//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for the durable ledger medium.
//! - Isolate SQLite and blob-encoding details from service orchestration.
//!
//! # Invariants
//! - Repositories store opaque JSON blobs under fixed logical keys; they do
//!   not validate record semantics (services do, before writing).
//! - A missing key is reported as absence, not as an error.

pub mod ledger_repo;
