//! Stores bound to their actions.

use super::container::{Setter, Store, StoreBuilder};
use super::update::State;

/// A store plus the actions closed over its setter.
pub struct Bound<V: State, A> {
    store: Store<V>,
    actions: A,
}

impl<V: State, A> Bound<V, A> {
    pub fn store(&self) -> &Store<V> {
        &self.store
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Shortcut for `self.store().get()`.
    pub fn get(&self) -> V {
        self.store.get()
    }

    pub fn into_parts(self) -> (Store<V>, A) {
        (self.store, self.actions)
    }
}

impl<V: State> StoreBuilder<V> {
    /// Create a store whose initializer receives the setter and returns
    /// both the initial value and the actions.
    pub fn create<A, F>(self, init: F) -> Bound<V, A>
    where
        F: FnOnce(Setter<V>) -> (V, A),
    {
        let (store, actions) = self.build_with(init);
        Bound { store, actions }
    }

    /// Create a store from an initial shape and an action-producing function.
    pub fn combine<A, F>(self, initial: V, actions: F) -> Bound<V, A>
    where
        F: FnOnce(Setter<V>) -> A,
    {
        self.create(|set| (initial, actions(set)))
    }
}

/// See [`StoreBuilder::create`].
pub fn create<V, A, F>(name: impl Into<String>, init: F) -> Bound<V, A>
where
    V: State,
    F: FnOnce(Setter<V>) -> (V, A),
{
    Store::builder(name).create(init)
}

/// See [`StoreBuilder::combine`].
pub fn combine<V, A, F>(name: impl Into<String>, initial: V, actions: F) -> Bound<V, A>
where
    V: State,
    F: FnOnce(Setter<V>) -> A,
{
    Store::builder(name).combine(initial, actions)
}
