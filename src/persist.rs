//! Write-through persistence for stores.
//!
//! A [`Persistence`] is attached to a store through
//! [`StoreBuilder::persist`]. On construction the snapshot stored under the
//! key is shallow-merged over the initial value; afterwards every successful
//! update is serialised and written back.
//!
//! Persistence is best-effort: a missing or malformed snapshot means "start
//! from the initial value", and a failed write is logged and recorded in
//! [`Persistence::last_write`] while the in-memory value stays authoritative.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::storage::{Storage, StorageError};
use crate::store::{Middleware, State, Store, StoreBuilder};

/// Outcome of the most recent snapshot write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Nothing has been written yet.
    Pending,
    Written,
    Failed { reason: String },
}

impl WriteStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, WriteStatus::Failed { .. })
    }
}

/// Reasons a stored snapshot is ignored.
#[derive(Debug, Error)]
enum SnapshotError {
    #[error("storage read failed: {0}")]
    Read(#[from] StorageError),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot is not a JSON object")]
    NotAnObject,

    #[error("state does not serialise to a JSON object")]
    StateNotAnObject,
}

/// Mirrors a store's value into a [`Storage`] under a fixed key.
pub struct Persistence<V> {
    storage: Arc<dyn Storage>,
    key: String,
    last_write: Mutex<WriteStatus>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Persistence<V>
where
    V: State + Serialize + DeserializeOwned,
{
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            storage,
            key: key.into(),
            last_write: Mutex::new(WriteStatus::Pending),
            _value: PhantomData,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Merge the stored snapshot over `initial`, or return `initial` unchanged.
    pub fn rehydrate(&self, initial: V) -> V {
        match self.load_snapshot(&initial) {
            Ok(Some(value)) => {
                tracing::debug!(key = %self.key, "Rehydrated store from snapshot");
                value
            }
            Ok(None) => {
                tracing::debug!(key = %self.key, "No snapshot found, using initial value");
                initial
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "Ignoring unusable snapshot, using initial value"
                );
                initial
            }
        }
    }

    fn load_snapshot(&self, initial: &V) -> Result<Option<V>, SnapshotError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(None);
        };

        let Value::Object(overlay) = serde_json::from_str::<Value>(&raw)? else {
            return Err(SnapshotError::NotAnObject);
        };

        let Value::Object(mut base) = serde_json::to_value(initial)? else {
            return Err(SnapshotError::StateNotAnObject);
        };

        for (field, value) in overlay {
            base.insert(field, value);
        }

        Ok(Some(serde_json::from_value(Value::Object(base))?))
    }

    /// Serialise `value` and write it under the key.
    ///
    /// The returned status is also kept in [`Persistence::last_write`];
    /// callers are free to ignore it.
    pub fn write(&self, value: &V) -> WriteStatus {
        let status = match serde_json::to_string(value) {
            Ok(json) => match self.storage.set(&self.key, &json) {
                Ok(()) => WriteStatus::Written,
                Err(e) => WriteStatus::Failed {
                    reason: e.to_string(),
                },
            },
            Err(e) => WriteStatus::Failed {
                reason: format!("serialization failed: {}", e),
            },
        };

        if let WriteStatus::Failed { reason } = &status {
            tracing::warn!(
                key = %self.key,
                reason = %reason,
                "Snapshot write failed, keeping in-memory state"
            );
        }

        *self.last_write.lock() = status.clone();
        status
    }

    /// Write the store's current value now.
    pub fn flush(&self, store: &Store<V>) -> WriteStatus {
        store.read(|value| self.write(value))
    }

    pub fn last_write(&self) -> WriteStatus {
        self.last_write.lock().clone()
    }

    /// Delete the snapshot. The in-memory value is untouched.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }
}

impl<V> Middleware<V> for Persistence<V>
where
    V: State + Serialize + DeserializeOwned,
{
    fn after_set(&self, _store: &str, _action: &str, _prev: &V, next: &V) {
        self.write(next);
    }
}

impl<V> StoreBuilder<V>
where
    V: State + Serialize + DeserializeOwned,
{
    /// Rehydrate from `persistence` at construction and write through on every update.
    pub fn persist(self, persistence: &Arc<Persistence<V>>) -> Self {
        let rehydrate = Arc::clone(persistence);
        self.rehydrate_with(Box::new(move |initial| rehydrate.rehydrate(initial)))
            .middleware(Arc::clone(persistence) as Arc<dyn Middleware<V>>)
    }
}
