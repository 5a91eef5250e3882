//! Devtools-style instrumentation for stores.
//!
//! [`Devtools`] is a pass-through [`Middleware`] that records every update as
//! a `(action, prev, next)` event. Events are logged at `debug`, kept in a
//! bounded history, and broadcast to listeners. A lagging listener loses
//! events; it never slows the store down.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::store::{Middleware, State};

pub const DEFAULT_HISTORY: usize = 64;

/// One recorded update.
#[derive(Debug, Clone, PartialEq)]
pub struct DevtoolsEvent<V> {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    pub store: String,
    pub action: String,
    pub prev: V,
    pub next: V,
}

pub struct Devtools<V> {
    seq: AtomicU64,
    capacity: usize,
    history: Mutex<VecDeque<DevtoolsEvent<V>>>,
    sender: broadcast::Sender<DevtoolsEvent<V>>,
}

impl<V: State + Debug> Devtools<V> {
    /// Keep at most `capacity` events in history (minimum 1).
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Arc::new(Self {
            seq: AtomicU64::new(0),
            capacity,
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            sender,
        })
    }

    /// Receive events emitted from now on.
    pub fn listen(&self) -> broadcast::Receiver<DevtoolsEvent<V>> {
        self.sender.subscribe()
    }

    /// Recorded events, oldest first.
    pub fn history(&self) -> Vec<DevtoolsEvent<V>> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl<V: State + Debug> Middleware<V> for Devtools<V> {
    fn after_set(&self, store: &str, action: &str, prev: &V, next: &V) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            store = %store,
            action = %action,
            seq = seq,
            prev = ?prev,
            next = ?next,
            "Store action"
        );

        let event = DevtoolsEvent {
            seq,
            store: store.to_string(),
            action: action.to_string(),
            prev: prev.clone(),
            next: next.clone(),
        };

        {
            let mut history = self.history.lock();
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // No listeners is fine.
        let _ = self.sender.send(event);
    }
}
