//! Counter whose actions go through the remote counter API.
//!
//! Each action awaits the server and only then writes the server's value
//! into the store. Nothing is locked across the await: a slow response can
//! overwrite a newer local edit (last write wins).

use std::sync::Arc;

use super::state::{Counter, CounterPatch, API_STORE};
use super::ActionError;
use crate::persist::Persistence;
use crate::remote::{validate_id, CountClient, RemoteError};
use crate::store::{Bound, Setter, Store, Update};

#[derive(Clone)]
pub struct ApiCounterActions {
    set: Setter<Counter>,
    client: Arc<CountClient>,
    id: String,
}

impl ApiCounterActions {
    pub fn new(set: Setter<Counter>, client: Arc<CountClient>, id: impl Into<String>) -> Self {
        Self {
            set,
            client,
            id: id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Load the server value into the store.
    pub async fn fetch(&self) -> Result<i64, ActionError> {
        let value = self.client.get(&self.id).await.map_err(|e| self.log_failure("fetch", e))?;
        self.apply("fetch", value)
    }

    /// Ask the server to store `count + 1`, then apply what it reports.
    pub async fn increase(&self) -> Result<i64, ActionError> {
        let current = self.set.get()?.count;
        let value = self
            .client
            .increase(&self.id, current)
            .await
            .map_err(|e| self.log_failure("increase", e))?;
        self.apply("increase", value)
    }

    pub async fn reset(&self) -> Result<i64, ActionError> {
        let value = self.client.reset(&self.id).await.map_err(|e| self.log_failure("reset", e))?;
        self.apply("reset", value)
    }

    fn apply(&self, action: &str, value: i64) -> Result<i64, ActionError> {
        self.set
            .set_named(action, Update::replace(CounterPatch::count(value)))?;
        Ok(value)
    }

    fn log_failure(&self, action: &str, error: RemoteError) -> ActionError {
        tracing::debug!(
            id = %self.id,
            action = %action,
            kind = error.kind(),
            error = %error,
            "Remote counter action failed, store unchanged"
        );
        ActionError::Remote(error)
    }
}

/// Remote-backed counter persisted under [`API_STORE`].
///
/// An invalid `id` is rejected here, before the store exists.
pub fn api_counter(
    client: Arc<CountClient>,
    id: impl Into<String>,
    persistence: &Arc<Persistence<Counter>>,
) -> Result<Bound<Counter, ApiCounterActions>, RemoteError> {
    let id = id.into();
    validate_id(&id)?;
    Ok(Store::builder(API_STORE)
        .persist(persistence)
        .combine(Counter::default(), |set| {
            ApiCounterActions::new(set, client, id)
        }))
}
