use std::sync::Arc;

use super::state::{Counter, CounterPatch, COUNT_STORE};
use crate::devtools::Devtools;
use crate::persist::Persistence;
use crate::store::{combine, create, Bound, Setter, Store, StoreError, Update};

/// Synchronous counter actions.
#[derive(Clone)]
pub struct CounterActions {
    set: Setter<Counter>,
}

impl CounterActions {
    pub fn new(set: Setter<Counter>) -> Self {
        Self { set }
    }

    pub fn increase(&self) -> Result<(), StoreError> {
        self.set.set_named(
            "increase",
            Update::transform(|c: &Counter| {
                let next = c
                    .count
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("count {} cannot increase", c.count))?;
                Ok(CounterPatch::count(next))
            }),
        )
    }

    pub fn reset(&self) -> Result<(), StoreError> {
        self.set
            .set_named("reset", Update::replace(CounterPatch::count(0)))
    }

    pub fn set_count(&self, count: i64) -> Result<(), StoreError> {
        self.set
            .set_named("setCount", Update::replace(CounterPatch::count(count)))
    }
}

/// Counter whose initializer receives the setter.
pub fn basic_counter() -> Bound<Counter, CounterActions> {
    create(COUNT_STORE, |set| {
        (Counter::default(), CounterActions::new(set))
    })
}

/// Counter built from an initial shape plus actions.
pub fn combined_counter() -> Bound<Counter, CounterActions> {
    combine(COUNT_STORE, Counter::default(), CounterActions::new)
}

/// Counter rehydrated from and written through to `persistence`, with every
/// action recorded by `devtools`.
pub fn persisted_counter(
    persistence: &Arc<Persistence<Counter>>,
    devtools: &Arc<Devtools<Counter>>,
) -> Bound<Counter, CounterActions> {
    Store::<Counter>::builder(COUNT_STORE)
        .persist(persistence)
        .middleware(Arc::clone(devtools) as _)
        .combine(Counter::default(), CounterActions::new)
}
