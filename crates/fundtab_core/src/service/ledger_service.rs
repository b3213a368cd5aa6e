//! Replicated ledger service.
//!
//! # Responsibility
//! - Own the durable record ledger for one execution context.
//! - Rebroadcast every local mutation so sibling contexts can update their
//!   in-memory views without re-reading storage.
//! - Apply incoming mutations from siblings to this context's replica view.
//!
//! # Invariants
//! - Durable storage is the single source of truth; `load_all` always
//!   recovers exact state.
//! - A mutation either persists and broadcasts, or does neither. Validation
//!   and storage failures surface before any broadcast.
//! - Local writes are returned synchronously to the caller and are never
//!   echoed through this context's own event subscription (no loopback).

use crate::bus::{Bus, BusEndpoint, BusSubscription};
use crate::model::record::{Record, RecordDraft, RecordId, RecordValidationError};
use crate::repo::ledger_repo::{LedgerRepository, RepoError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// Wire unit of the ledger-mutation channel.
///
/// Ephemeral: never persisted, no delivery guarantee to contexts that
/// subscribe late.
#[derive(Debug, Clone)]
pub enum LedgerMessage {
    RecordInserted(Record),
    RecordDeleted(RecordId),
    LedgerReset,
}

/// Change notification delivered to this context's subscribers.
///
/// `Reset` means "discard everything and call `load_all` again" — it marks a
/// destructive change of storage identity, not an incremental delta.
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    Inserted(Record),
    Deleted(RecordId),
    Reset,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Error surfaced by mutating ledger operations.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before any durable write.
    Validation(RecordValidationError),
    /// Durable read or write failed; no broadcast was attempted.
    Storage(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

type Listener = Arc<dyn Fn(&LedgerEvent) + Send + Sync>;

struct LedgerShared {
    /// Replica view: updated by local mutations and by broadcast traffic,
    /// only as fresh as the messages received since the last `load_all`.
    view: Mutex<Vec<Record>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: Mutex<u64>,
}

impl LedgerShared {
    fn apply_incoming(&self, message: &LedgerMessage) {
        let event = {
            let mut view = self.view.lock().expect("ledger view lock poisoned");
            match message {
                LedgerMessage::RecordInserted(record) => {
                    view.insert(0, record.clone());
                    LedgerEvent::Inserted(record.clone())
                }
                LedgerMessage::RecordDeleted(id) => {
                    view.retain(|record| record.id != *id);
                    LedgerEvent::Deleted(*id)
                }
                LedgerMessage::LedgerReset => {
                    view.clear();
                    LedgerEvent::Reset
                }
            }
        };
        self.notify(&event);
    }

    fn notify(&self, event: &LedgerEvent) {
        let listeners: Vec<Listener> = {
            let registered = self.listeners.lock().expect("ledger listeners lock poisoned");
            registered.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event);
        }
    }
}

/// Durable single-writer ledger for one execution context, replicated to
/// sibling contexts over the ledger bus.
pub struct LedgerService<R: LedgerRepository> {
    repo: R,
    endpoint: BusEndpoint<LedgerMessage>,
    shared: Arc<LedgerShared>,
    // Kept for the service lifetime; dropping it detaches from the bus.
    _incoming: BusSubscription<LedgerMessage>,
}

impl<R: LedgerRepository> LedgerService<R> {
    /// Attaches a service to its storage repository and the shared ledger
    /// bus. One instance per execution context; no ambient singletons.
    pub fn new(repo: R, bus: &Bus<LedgerMessage>) -> Self {
        let endpoint = bus.endpoint();
        let shared = Arc::new(LedgerShared {
            view: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: Mutex::new(0),
        });

        let receiver = Arc::clone(&shared);
        let incoming = endpoint.subscribe(move |message| receiver.apply_incoming(message));

        Self {
            repo,
            endpoint,
            shared,
            _incoming: incoming,
        }
    }

    /// Reads the full ledger from durable storage, initializing an empty
    /// ledger on first access.
    ///
    /// This is the resynchronization point: a context that missed broadcast
    /// traffic gets ground truth from storage, not from peers. The replica
    /// view is refreshed as a side effect.
    pub fn load_all(&self) -> StoreResult<Vec<Record>> {
        let records = match self.repo.load_records()? {
            Some(records) => records,
            None => {
                self.repo.save_records(&[])?;
                Vec::new()
            }
        };
        *self.shared.view.lock().expect("ledger view lock poisoned") = records.clone();
        debug!(
            "event=ledger_load module=ledger status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    /// Validates and persists a new record, then broadcasts it.
    ///
    /// Returns the created record (with its freshly assigned id)
    /// synchronously; the caller's own view is updated via this return
    /// value, not via the broadcast.
    pub fn create(&self, draft: RecordDraft) -> StoreResult<Record> {
        draft.validate()?;
        let record = draft.into_record();

        let mut records = self.repo.load_records()?.unwrap_or_default();
        records.insert(0, record.clone());
        self.repo.save_records(&records)?;
        *self.shared.view.lock().expect("ledger view lock poisoned") = records;

        self.endpoint
            .publish(LedgerMessage::RecordInserted(record.clone()));
        info!(
            "event=ledger_create module=ledger status=ok id={} kind={:?}",
            record.id, record.kind
        );
        Ok(record)
    }

    /// Removes a record by id and broadcasts the deletion.
    ///
    /// Unknown ids are a silent no-op: storage stays untouched and nothing
    /// is broadcast.
    pub fn delete(&self, id: RecordId) -> StoreResult<()> {
        let mut records = self.repo.load_records()?.unwrap_or_default();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            debug!("event=ledger_delete module=ledger status=skipped id={id}");
            return Ok(());
        }

        self.repo.save_records(&records)?;
        *self.shared.view.lock().expect("ledger view lock poisoned") = records;

        self.endpoint.publish(LedgerMessage::RecordDeleted(id));
        info!("event=ledger_delete module=ledger status=ok id={id}");
        Ok(())
    }

    /// Clears the durable ledger and broadcasts the reset. Idempotent.
    pub fn reset(&self) -> StoreResult<()> {
        self.repo.save_records(&[])?;
        self.shared
            .view
            .lock()
            .expect("ledger view lock poisoned")
            .clear();

        self.endpoint.publish(LedgerMessage::LedgerReset);
        info!("event=ledger_reset module=ledger status=ok");
        Ok(())
    }

    /// Registers a callback for mutations made by *other* contexts.
    ///
    /// Local `create`/`delete`/`reset` calls do not echo here.
    pub fn subscribe(
        &self,
        listener: impl Fn(&LedgerEvent) + Send + Sync + 'static,
    ) -> LedgerSubscription {
        let id = {
            let mut next = self
                .shared
                .next_listener_id
                .lock()
                .expect("ledger listeners lock poisoned");
            let id = *next;
            *next += 1;
            id
        };
        self.shared
            .listeners
            .lock()
            .expect("ledger listeners lock poisoned")
            .push((id, Arc::new(listener)));
        LedgerSubscription {
            shared: Arc::clone(&self.shared),
            id,
            active: true,
        }
    }

    /// Current replica view snapshot.
    ///
    /// Only as fresh as the broadcasts received since the last `load_all`;
    /// if messages were dropped it may diverge from durable storage until
    /// the next `load_all`.
    pub fn view(&self) -> Vec<Record> {
        self.shared
            .view
            .lock()
            .expect("ledger view lock poisoned")
            .clone()
    }
}

/// Active ledger event subscription; detaches on drop.
pub struct LedgerSubscription {
    shared: Arc<LedgerShared>,
    id: u64,
    active: bool,
}

impl LedgerSubscription {
    /// Idempotent.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.shared
                .listeners
                .lock()
                .expect("ledger listeners lock poisoned")
                .retain(|(id, _)| *id != self.id);
            self.active = false;
        }
    }
}

impl Drop for LedgerSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
