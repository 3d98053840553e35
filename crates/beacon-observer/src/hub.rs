//! The connection hub: live observer bookkeeping and fan-out.
//!
//! Every attached observer owns a bounded queue of pre-serialized text
//! frames. [`ObserverHub::broadcast`] encodes a message once and offers
//! the frame to each queue with `try_send`, so a slow observer costs the
//! scheduler nothing:
//!
//! - queue accepted the frame: counted as delivered
//! - queue full: this frame is dropped for that observer only
//! - queue closed: the observer is detached on the spot
//!
//! The membership map sits behind a [`std::sync::Mutex`] that is never
//! held across an `.await`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::ws::Utf8Bytes;
use beacon_core::config::HubConfig;
use beacon_core::scheduler::Broadcaster;
use beacon_core::store::StateStore;
use beacon_types::ServerMessage;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Unique handle for one attached observer. Never reused within a
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// The raw sequence number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Observer {
    sender: mpsc::Sender<Utf8Bytes>,
    attached_at: DateTime<Utc>,
}

/// Registry of live observers.
#[derive(Debug)]
pub struct ObserverHub {
    store: Arc<StateStore>,
    observers: Mutex<HashMap<ObserverId, Observer>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl ObserverHub {
    /// Create an empty hub. New observers are greeted with the current
    /// network status read from `store`.
    pub fn new(store: Arc<StateStore>, config: &HubConfig) -> Self {
        Self {
            store,
            observers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: config.observer_buffer.max(1),
        }
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<ObserverId, Observer>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-observer queue depth.
    pub const fn buffer(&self) -> usize {
        self.buffer
    }

    /// Create a queue of [`buffer`](Self::buffer) frames and attach its
    /// sending half.
    pub fn open(&self) -> (ObserverId, mpsc::Receiver<Utf8Bytes>) {
        let (sender, receiver) = mpsc::channel(self.buffer);
        (self.attach(sender), receiver)
    }

    /// Register `sender` as a live observer.
    ///
    /// A `NETWORK_UPDATE` with the current status is queued before the
    /// observer becomes visible to [`broadcast`](Self::broadcast), so it
    /// is always the first frame the observer sees.
    pub fn attach(&self, sender: mpsc::Sender<Utf8Bytes>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));

        // read under the membership lock so no status broadcast can land
        // between the greeting snapshot and registration
        let mut observers = self.observers();
        let greeting = ServerMessage::NetworkUpdate(self.store.network_status());
        if let Some(frame) = encode(&greeting)
            && let Err(e) = sender.try_send(frame)
        {
            debug!(observer = %id, error = %e, "Initial snapshot not queued");
        }
        observers.insert(
            id,
            Observer {
                sender,
                attached_at: Utc::now(),
            },
        );
        let live = observers.len();
        drop(observers);

        info!(observer = %id, live, "Observer attached");
        id
    }

    /// Remove `id` from the live set. Returns whether it was present.
    pub fn detach(&self, id: ObserverId) -> bool {
        let mut observers = self.observers();
        let removed = observers.remove(&id);
        let live = observers.len();
        drop(observers);

        let Some(observer) = removed else {
            return false;
        };
        let connected_secs = Utc::now()
            .signed_duration_since(observer.attached_at)
            .num_seconds();
        info!(observer = %id, live, connected_secs, "Observer detached");
        true
    }

    /// Offer `message` to every live observer.
    ///
    /// Returns the number of observers whose queue accepted the frame.
    pub fn broadcast(&self, message: &ServerMessage) -> usize {
        let Some(frame) = encode(message) else {
            return 0;
        };

        let mut delivered = 0_usize;
        let mut dropped = 0_usize;
        let mut observers = self.observers();
        observers.retain(|id, observer| match observer.sender.try_send(frame.clone()) {
            Ok(()) => {
                delivered = delivered.saturating_add(1);
                true
            }
            Err(TrySendError::Full(_)) => {
                dropped = dropped.saturating_add(1);
                debug!(observer = %id, "Observer queue full, frame dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(observer = %id, "Observer queue closed, detaching");
                false
            }
        });
        let live = observers.len();
        drop(observers);

        debug!(kind = message.kind(), delivered, dropped, live, "Broadcast");
        delivered
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.observers().len()
    }

    /// Whether `id` is still attached.
    pub fn is_live(&self, id: ObserverId) -> bool {
        self.observers().contains_key(&id)
    }
}

impl Broadcaster for ObserverHub {
    fn broadcast(&self, message: &ServerMessage) -> usize {
        Self::broadcast(self, message)
    }
}

fn encode(message: &ServerMessage) -> Option<Utf8Bytes> {
    serde_json::to_string(message)
        .inspect_err(|e| warn!(kind = message.kind(), error = %e, "Failed to serialize message"))
        .ok()
        .map(Utf8Bytes::from)
}
