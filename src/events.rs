/// Discrete flight events and the bus that delivers them to the active session.
///
/// The host reports four event kinds (launch, destructive overheat, stage
/// separation, sphere-of-influence change). A session subscribes when it
/// starts and releases its `Subscription` when it ends, so handlers never
/// leak from one flight into the next.
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError, Receiver, Sender};

/// Per-subscriber queue depth. Events are tiny and drained every loop turn.
const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlightEvent {
    Launch,
    /// A part exploded from overheating.
    Overheat { part: String },
    StageSeparation { stage: i32 },
    SoiChanged { vessel_id: String, body: String },
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BusInner {
    next_id:     u64,
    subscribers: Vec<(u64, Sender<FlightEvent>)>,
}

/// Cheap, cloneable handle to the shared subscriber list.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let id = match self.inner.lock() {
            Ok(mut inner) => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.subscribers.push((id, tx));
                id
            }
            Err(_) => {
                tracing::error!("Event bus lock poisoned, subscription will receive nothing");
                u64::MAX
            }
        };
        tracing::debug!("Event bus: subscriber {} registered", id);
        Subscription { id, bus: self.clone(), rx }
    }

    /// Deliver `event` to every live subscriber. Never blocks.
    pub fn publish(&self, event: FlightEvent) {
        let Ok(mut inner) = self.inner.lock() else {
            tracing::error!("Event bus lock poisoned, dropping {:?}", event);
            return;
        };
        if inner.subscribers.is_empty() {
            tracing::debug!("No active session, {:?} not delivered", event);
            return;
        }
        inner.subscribers.retain(|(id, tx)| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Subscriber {} queue full, dropping {:?}", id, event);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().map(|i| i.subscribers.len()).unwrap_or(0)
    }

    fn remove(&self, id: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.retain(|(sid, _)| *sid != id);
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription token
// ---------------------------------------------------------------------------

/// Registration on an `EventBus`. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id:  u64,
    bus: EventBus,
    rx:  Receiver<FlightEvent>,
}

impl Subscription {
    /// Next queued event, if one is waiting.
    pub fn try_next(&mut self) -> Option<FlightEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn drain(&mut self) -> Vec<FlightEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.remove(self.id);
        tracing::debug!("Event bus: subscriber {} released", self.id);
    }
}
