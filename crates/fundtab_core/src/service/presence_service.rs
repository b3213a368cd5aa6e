//! Heartbeat-based presence roster.
//!
//! # Responsibility
//! - Announce this context's identity on the presence channel and keep it
//!   alive with periodic heartbeats.
//! - Maintain a local roster of every identity seen via JOIN or HEARTBEAT
//!   within the eviction window.
//!
//! # Invariants
//! - The roster is owned by one context and rebuilt purely from bus
//!   traffic; it is never shared by reference across contexts.
//! - Per name, the latest message wins: attributes are fully overwritten,
//!   never merged.
//! - Peers silent for longer than `eviction_timeout` are dropped, so a
//!   context that dies without sending LEAVE cannot leave a ghost entry.
//! - `leave` is idempotent and joins the heartbeat thread before returning;
//!   no heartbeat fires after `leave` returns.
//!
//! Presence is best-effort by design: there is no error channel, and a bus
//! with no listeners silently degrades to "nobody else sees me".

use crate::bus::{Bus, BusEndpoint, BusSubscription};
use crate::model::identity::Identity;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Wire unit of the presence channel.
#[derive(Debug, Clone)]
pub enum PresenceMessage {
    Join(Identity),
    Heartbeat(Identity),
    Leave(Identity),
}

/// Timing knobs for heartbeats and ghost eviction.
#[derive(Debug, Clone, Copy)]
pub struct PresenceConfig {
    /// Interval between HEARTBEAT broadcasts.
    pub heartbeat_interval: Duration,
    /// Silence period after which a peer is evicted. Must comfortably
    /// exceed the heartbeat interval; the default is 3x.
    pub eviction_timeout: Duration,
}

impl PresenceConfig {
    /// Derives a config from a heartbeat interval, with eviction at 3x.
    pub fn with_heartbeat(interval: Duration) -> Self {
        Self {
            heartbeat_interval: interval,
            eviction_timeout: interval * 3,
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self::with_heartbeat(Duration::from_secs(3))
    }
}

struct PeerEntry {
    identity: Identity,
    last_seen: Instant,
}

struct RosterState {
    self_identity: Identity,
    peers: HashMap<String, PeerEntry>,
}

impl RosterState {
    /// Drops stale peers and returns the roster ordered by name.
    ///
    /// Self is refreshed by the heartbeat tick and never evicted here.
    fn sweep_and_snapshot(&mut self, timeout: Duration) -> Vec<Identity> {
        let now = Instant::now();
        let keep = self.self_identity.name.clone();
        self.peers
            .retain(|name, entry| *name == keep || now.duration_since(entry.last_seen) < timeout);

        let mut roster: Vec<Identity> = self
            .peers
            .values()
            .map(|entry| entry.identity.clone())
            .collect();
        roster.sort_by(|a, b| a.name.cmp(&b.name));
        roster
    }

    fn upsert(&mut self, identity: Identity) {
        self.peers.insert(
            identity.name.clone(),
            PeerEntry {
                identity,
                last_seen: Instant::now(),
            },
        );
    }
}

type RosterCallback = Arc<dyn Fn(Vec<Identity>) + Send + Sync>;

struct PresenceShared {
    config: PresenceConfig,
    endpoint: BusEndpoint<PresenceMessage>,
    state: Mutex<RosterState>,
    on_roster: RosterCallback,
}

impl PresenceShared {
    fn notify(&self) {
        let snapshot = {
            let mut state = self.state.lock().expect("roster lock poisoned");
            state.sweep_and_snapshot(self.config.eviction_timeout)
        };
        (self.on_roster)(snapshot);
    }

    /// Bus handler for one incoming presence message.
    fn on_message(&self, message: &PresenceMessage) {
        match message {
            PresenceMessage::Join(peer) | PresenceMessage::Heartbeat(peer) => {
                if peer.name.is_empty() {
                    return;
                }
                let is_join = matches!(message, PresenceMessage::Join(_));
                let own = {
                    let mut state = self.state.lock().expect("roster lock poisoned");
                    state.upsert(peer.clone());
                    state.self_identity.clone()
                };
                self.notify();
                // A peer just arrived: reply with one heartbeat so it learns
                // about this context without waiting for the next tick.
                if is_join {
                    self.endpoint.publish(PresenceMessage::Heartbeat(own));
                }
            }
            PresenceMessage::Leave(peer) => {
                let removed = {
                    let mut state = self.state.lock().expect("roster lock poisoned");
                    state.peers.remove(&peer.name).is_some()
                };
                if removed {
                    self.notify();
                }
            }
        }
    }

    fn tick(&self) {
        let own = {
            let mut state = self.state.lock().expect("roster lock poisoned");
            let own = state.self_identity.clone();
            // Self-heartbeat also refreshes our own last-seen stamp.
            state.upsert(own.clone());
            own
        };
        self.endpoint.publish(PresenceMessage::Heartbeat(own));
        self.notify();
    }
}

/// Presence announcer and roster tracker for one execution context.
///
/// Constructed explicitly around a shared bus handle; holds no state of its
/// own beyond configuration until [`PresenceService::join`] is called.
pub struct PresenceService {
    bus: Bus<PresenceMessage>,
    config: PresenceConfig,
}

impl PresenceService {
    pub fn new(bus: Bus<PresenceMessage>, config: PresenceConfig) -> Self {
        Self { bus, config }
    }

    /// Registers `identity` as present and starts the heartbeat loop.
    ///
    /// Self appears in the roster immediately and `on_roster` fires once
    /// before any bus traffic. The callback runs on whichever thread
    /// produced the change: the caller's, the heartbeat thread, or a
    /// publishing sibling's.
    pub fn join(
        &self,
        identity: Identity,
        on_roster: impl Fn(Vec<Identity>) + Send + Sync + 'static,
    ) -> PresenceHandle {
        let endpoint = self.bus.endpoint();
        let shared = Arc::new(PresenceShared {
            config: self.config,
            endpoint,
            state: Mutex::new(RosterState {
                self_identity: identity.clone(),
                peers: HashMap::new(),
            }),
            on_roster: Arc::new(on_roster),
        });

        {
            let mut state = shared.state.lock().expect("roster lock poisoned");
            state.upsert(identity.clone());
        }
        shared.notify();

        let receiver = Arc::clone(&shared);
        let subscription = shared
            .endpoint
            .subscribe(move |message| receiver.on_message(message));

        shared.endpoint.publish(PresenceMessage::Join(identity.clone()));
        info!("event=presence_join module=presence name={}", identity.name);

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ticker = Arc::clone(&shared);
        let interval = self.config.heartbeat_interval;
        let heartbeat = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => ticker.tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        PresenceHandle {
            shared,
            stop_tx: Some(stop_tx),
            heartbeat: Some(heartbeat),
            subscription: Some(subscription),
        }
    }
}

/// Live presence registration; leaves on drop.
pub struct PresenceHandle {
    shared: Arc<PresenceShared>,
    stop_tx: Option<mpsc::Sender<()>>,
    heartbeat: Option<JoinHandle<()>>,
    subscription: Option<BusSubscription<PresenceMessage>>,
}

impl PresenceHandle {
    /// Current roster for this context, stale peers already swept.
    pub fn roster(&self) -> Vec<Identity> {
        let mut state = self.shared.state.lock().expect("roster lock poisoned");
        state.sweep_and_snapshot(self.shared.config.eviction_timeout)
    }

    /// Replaces the announced identity and heartbeats it immediately so
    /// peers converge without waiting for the next tick.
    ///
    /// Renames are keyed moves: the old name is dropped locally and ages
    /// out on peers via timeout eviction.
    pub fn update_identity(&self, identity: Identity) {
        {
            let mut state = self.shared.state.lock().expect("roster lock poisoned");
            if state.self_identity.name != identity.name {
                let old = state.self_identity.name.clone();
                state.peers.remove(&old);
            }
            state.self_identity = identity.clone();
            state.upsert(identity.clone());
        }
        self.shared
            .endpoint
            .publish(PresenceMessage::Heartbeat(identity));
        self.shared.notify();
    }

    /// Announces departure and tears the registration down.
    ///
    /// Idempotent. The heartbeat thread is stopped and joined before this
    /// returns, and the bus subscription is detached, so neither a tick nor
    /// an incoming message can fire afterwards.
    pub fn leave(&mut self) {
        let Some(stop_tx) = self.stop_tx.take() else {
            return;
        };
        // Dropping the sender is enough to stop the loop, but send first so
        // the thread wakes without waiting out the current interval.
        let _ = stop_tx.send(());
        drop(stop_tx);
        if let Some(heartbeat) = self.heartbeat.take() {
            let _ = heartbeat.join();
        }

        let own = {
            let state = self.shared.state.lock().expect("roster lock poisoned");
            state.self_identity.clone()
        };
        self.shared.endpoint.publish(PresenceMessage::Leave(own.clone()));
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        debug!("event=presence_leave module=presence name={}", own.name);
    }
}

impl Drop for PresenceHandle {
    fn drop(&mut self) {
        self.leave();
    }
}
