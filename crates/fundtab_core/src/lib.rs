//! Core domain logic for fundtab, a browser-local-style team fund ledger.
//!
//! One `fundtab_core` instance per execution context owns a durable copy of
//! the record ledger, replicates mutations to sibling contexts over an
//! in-process broadcast bus, and tracks which collaborators are present via
//! heartbeats. Contexts share nothing but the bus handles and the storage
//! medium.

pub mod bus;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use bus::{Bus, BusEndpoint, BusSubscription};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::identity::Identity;
pub use model::record::{
    Record, RecordDraft, RecordId, RecordKind, RecordState, RecordValidationError,
};
pub use model::stats::LedgerStats;
pub use repo::ledger_repo::{LedgerRepository, RepoError, RepoResult, SqliteLedgerRepository};
pub use service::category_service::{CategoryService, BUILTIN_CATEGORIES};
pub use service::ledger_service::{
    LedgerEvent, LedgerMessage, LedgerService, LedgerSubscription, StoreError, StoreResult,
};
pub use service::presence_service::{
    PresenceConfig, PresenceHandle, PresenceMessage, PresenceService,
};
pub use service::summary_service::{
    ledger_snapshot, AnalystConfig, HttpAnalyst, LedgerAnalyst, SnapshotRow, SummaryError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
