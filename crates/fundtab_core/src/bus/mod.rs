//! In-process broadcast bus shared by all execution contexts.
//!
//! # Responsibility
//! - Fan each published message out to every subscriber on the same channel,
//!   except subscribers registered through the publishing endpoint.
//! - Keep presence and ledger traffic on separate, separately-typed buses.
//!
//! # Invariants
//! - No loopback: a publisher never receives its own messages. Callers apply
//!   their own writes locally, independent of publishing.
//! - Delivery is best-effort and unacknowledged; publishing with no
//!   listeners is a silent no-op, not an error.
//! - Messages from one endpoint are delivered in send order; nothing is
//!   guaranteed across distinct endpoints.
//! - Messages are never persisted; a context that subscribes late simply
//!   misses earlier traffic.

use std::sync::{Arc, Mutex};

type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

struct Subscriber<M> {
    id: u64,
    endpoint_id: u64,
    handler: Handler<M>,
}

struct BusState<M> {
    next_endpoint_id: u64,
    next_subscriber_id: u64,
    subscribers: Vec<Subscriber<M>>,
}

/// One logical broadcast channel, shared by every execution context.
///
/// `Bus` is a cheap handle over shared state; clone it into each context and
/// call [`Bus::endpoint`] there. The message type parameter closes the
/// channel vocabulary: a receiver can exhaustively match on `M`.
pub struct Bus<M> {
    channel: &'static str,
    state: Arc<Mutex<BusState<M>>>,
}

impl<M> Clone for Bus<M> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel,
            state: Arc::clone(&self.state),
        }
    }
}

impl<M> Bus<M> {
    /// Creates an empty channel. The name is only used for diagnostics.
    pub fn new(channel: &'static str) -> Self {
        Self {
            channel,
            state: Arc::new(Mutex::new(BusState {
                next_endpoint_id: 0,
                next_subscriber_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn channel_name(&self) -> &'static str {
        self.channel
    }

    /// Allocates an endpoint for one execution context.
    pub fn endpoint(&self) -> BusEndpoint<M> {
        let mut state = self.state.lock().expect("bus state lock poisoned");
        let endpoint_id = state.next_endpoint_id;
        state.next_endpoint_id += 1;
        BusEndpoint {
            bus: self.clone(),
            endpoint_id,
        }
    }

    fn unsubscribe(&self, subscriber_id: u64) {
        let mut state = self.state.lock().expect("bus state lock poisoned");
        state.subscribers.retain(|entry| entry.id != subscriber_id);
    }
}

/// Per-context publish/subscribe handle on one [`Bus`].
pub struct BusEndpoint<M> {
    bus: Bus<M>,
    endpoint_id: u64,
}

impl<M> BusEndpoint<M> {
    /// Delivers `message` to every subscriber of other endpoints.
    ///
    /// Handlers are snapshotted out of the registry lock before invocation,
    /// so a handler may itself publish to the same bus. Fire-and-forget: the
    /// caller gets no acknowledgment and no listener count.
    pub fn publish(&self, message: M) {
        let handlers: Vec<Handler<M>> = {
            let state = self.bus.state.lock().expect("bus state lock poisoned");
            state
                .subscribers
                .iter()
                .filter(|entry| entry.endpoint_id != self.endpoint_id)
                .map(|entry| Arc::clone(&entry.handler))
                .collect()
        };
        for handler in handlers {
            handler(&message);
        }
    }

    /// Registers a handler for messages published by other endpoints.
    ///
    /// Delivery stops once the returned guard is unsubscribed or dropped.
    pub fn subscribe(&self, handler: impl Fn(&M) + Send + Sync + 'static) -> BusSubscription<M> {
        let mut state = self.bus.state.lock().expect("bus state lock poisoned");
        let id = state.next_subscriber_id;
        state.next_subscriber_id += 1;
        state.subscribers.push(Subscriber {
            id,
            endpoint_id: self.endpoint_id,
            handler: Arc::new(handler),
        });
        BusSubscription {
            bus: self.bus.clone(),
            subscriber_id: id,
            active: true,
        }
    }
}

/// Active subscription on a [`Bus`]; unsubscribes on drop.
pub struct BusSubscription<M> {
    bus: Bus<M>,
    subscriber_id: u64,
    active: bool,
}

impl<M> BusSubscription<M> {
    /// Stops delivery for messages published after this call returns.
    ///
    /// Idempotent.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.bus.unsubscribe(self.subscriber_id);
            self.active = false;
        }
    }
}

impl<M> Drop for BusSubscription<M> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
