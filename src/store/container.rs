//! The state container.
//!
//! A `Store` is a cheap, cloneable handle. Reads clone the current value
//! under a read lock; writes are serialised by a per-store dispatch lock
//! which is held until every subscriber and middleware has seen the new
//! value, so observers never see values out of order.
//!
//! A `set` issued while a dispatch is running (from a subscriber or a
//! middleware on the same store) is queued and applied once the running
//! pass has finished.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use super::error::StoreError;
use super::middleware::Middleware;
use super::update::{State, Update};
use crate::selector::SelectorMap;

type Subscriber<V> = Arc<dyn Fn(&V) + Send + Sync>;
type Rehydrator<V> = Box<dyn FnOnce(V) -> V>;

/// Action name used by [`Store::set`].
pub const ANONYMOUS_ACTION: &str = "anonymous";

pub(crate) struct StoreInner<V: State> {
    name: String,
    state: RwLock<V>,
    subscribers: Mutex<Vec<(u64, Subscriber<V>)>>,
    next_subscriber_id: AtomicU64,
    /// Re-entrant so a subscriber may call `set` on the same store.
    dispatch: ReentrantMutex<()>,
    /// Only touched while `dispatch` is held.
    dispatching: AtomicBool,
    pending: Mutex<VecDeque<(String, Update<V>)>>,
    middleware: Vec<Arc<dyn Middleware<V>>>,
    selectors: OnceLock<Arc<SelectorMap<V>>>,
}

/// Observable state container.
pub struct Store<V: State> {
    inner: Arc<StoreInner<V>>,
}

impl<V: State> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: State> Store<V> {
    /// Create a store with no middleware.
    pub fn new(name: impl Into<String>, initial: V) -> Self {
        Self::builder(name).build(initial)
    }

    pub fn builder(name: impl Into<String>) -> StoreBuilder<V> {
        StoreBuilder {
            name: name.into(),
            middleware: Vec::new(),
            rehydrators: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> V {
        self.inner.state.read().clone()
    }

    /// Read the current value without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&V) -> R,
    {
        f(&self.inner.state.read())
    }

    /// Apply an update under the anonymous action name.
    pub fn set(&self, update: Update<V>) -> Result<(), StoreError> {
        self.set_named(ANONYMOUS_ACTION, update)
    }

    /// Apply an update, notify subscribers, then run middleware.
    ///
    /// A failing transform leaves the value unchanged and nobody is notified.
    /// Called from inside a running dispatch, the update is queued and
    /// `Ok(())` is returned; a queued transform that fails is logged.
    pub fn set_named(&self, action: &str, update: Update<V>) -> Result<(), StoreError> {
        let _dispatch = self.inner.dispatch.lock();

        if self.inner.dispatching.load(Ordering::Acquire) {
            tracing::trace!(
                store = %self.inner.name,
                action = %action,
                "Store update queued behind running dispatch"
            );
            self.inner
                .pending
                .lock()
                .push_back((action.to_string(), update));
            return Ok(());
        }

        let _running = DispatchFlag::raise(&self.inner.dispatching);
        let result = self.dispatch(action, update);

        loop {
            let Some((action, update)) = self.inner.pending.lock().pop_front() else {
                break;
            };
            if let Err(err) = self.dispatch(&action, update) {
                tracing::warn!(
                    store = %self.inner.name,
                    action = %action,
                    error = %err,
                    "Queued store update rejected"
                );
            }
        }

        result
    }

    fn dispatch(&self, action: &str, update: Update<V>) -> Result<(), StoreError> {
        let kind = update.kind();
        let current = self.get();
        let patch = update.into_patch(&current).map_err(|source| {
            tracing::debug!(
                store = %self.inner.name,
                action = %action,
                error = %source,
                "Store update rejected"
            );
            StoreError::Transform {
                store: self.inner.name.clone(),
                action: action.to_string(),
                source,
            }
        })?;

        let next = {
            let mut state = self.inner.state.write();
            state.apply(patch);
            state.clone()
        };

        // Snapshot the list so callbacks may subscribe/unsubscribe freely.
        let subscribers: Vec<Subscriber<V>> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::trace!(
            store = %self.inner.name,
            action = %action,
            kind = kind,
            subscribers = subscribers.len(),
            "Store updated"
        );

        for subscriber in &subscribers {
            subscriber(&next);
        }

        for middleware in &self.inner.middleware {
            middleware.after_set(&self.inner.name, action, &current, &next);
        }

        Ok(())
    }

    /// Register a callback for future changes. The current value is not replayed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription<V>
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));
        Subscription {
            store: self.downgrade(),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// The update capability of this store, without ownership.
    pub fn setter(&self) -> Setter<V> {
        Setter {
            store: self.downgrade(),
        }
    }

    pub fn downgrade(&self) -> WeakStore<V> {
        WeakStore {
            name: self.inner.name.clone(),
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &Store<V>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn selector_cell(&self) -> &OnceLock<Arc<SelectorMap<V>>> {
        &self.inner.selectors
    }

    fn unsubscribe(&self, id: u64) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }
}

/// Marks a dispatch as running; lowered on drop, including on unwind.
struct DispatchFlag<'a>(&'a AtomicBool);

impl<'a> DispatchFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for DispatchFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Non-owning handle to a store.
pub struct WeakStore<V: State> {
    name: String,
    inner: Weak<StoreInner<V>>,
}

impl<V: State> Clone for WeakStore<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<V: State> WeakStore<V> {
    pub fn upgrade(&self) -> Option<Store<V>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn upgrade_or_closed(&self) -> Result<Store<V>, StoreError> {
        self.upgrade().ok_or_else(|| StoreError::Closed {
            store: self.name.clone(),
        })
    }
}

/// The update capability handed to actions.
///
/// Holds the store weakly, so actions never keep a store alive on their own.
pub struct Setter<V: State> {
    store: WeakStore<V>,
}

impl<V: State> Clone for Setter<V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<V: State> Setter<V> {
    pub fn set(&self, update: Update<V>) -> Result<(), StoreError> {
        self.store.upgrade_or_closed()?.set(update)
    }

    pub fn set_named(&self, action: &str, update: Update<V>) -> Result<(), StoreError> {
        self.store.upgrade_or_closed()?.set_named(action, update)
    }

    pub fn get(&self) -> Result<V, StoreError> {
        Ok(self.store.upgrade_or_closed()?.get())
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping it keeps the callback registered; call [`Subscription::unsubscribe`]
/// to remove it.
pub struct Subscription<V: State> {
    store: WeakStore<V>,
    id: u64,
}

impl<V: State> Subscription<V> {
    /// Remove the callback. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.store.upgrade() {
            Some(store) => store.unsubscribe(self.id),
            None => false,
        }
    }
}

/// Configures middleware and rehydration before a store is created.
pub struct StoreBuilder<V: State> {
    name: String,
    middleware: Vec<Arc<dyn Middleware<V>>>,
    rehydrators: Vec<Rehydrator<V>>,
}

impl<V: State> StoreBuilder<V> {
    pub fn middleware(mut self, middleware: Arc<dyn Middleware<V>>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Register a step that rewrites the initial value before first use.
    pub(crate) fn rehydrate_with(mut self, step: Rehydrator<V>) -> Self {
        self.rehydrators.push(step);
        self
    }

    pub fn build(self, initial: V) -> Store<V> {
        self.build_with(|_| (initial, ())).0
    }

    /// Build the store, handing `init` the setter before the store exists.
    ///
    /// The setter cannot update anything until `init` has returned.
    pub(crate) fn build_with<A, F>(self, init: F) -> (Store<V>, A)
    where
        F: FnOnce(Setter<V>) -> (V, A),
    {
        let StoreBuilder {
            name,
            middleware,
            rehydrators,
        } = self;

        let mut actions = None;
        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner<V>>| {
            let setter = Setter {
                store: WeakStore {
                    name: name.clone(),
                    inner: Weak::clone(weak),
                },
            };
            let (mut initial, bound) = init(setter);
            actions = Some(bound);
            for step in rehydrators {
                initial = step(initial);
            }

            StoreInner {
                name,
                state: RwLock::new(initial),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber_id: AtomicU64::new(0),
                dispatch: ReentrantMutex::new(()),
                dispatching: AtomicBool::new(false),
                pending: Mutex::new(VecDeque::new()),
                middleware,
                selectors: OnceLock::new(),
            }
        });

        match actions {
            Some(actions) => (Store { inner }, actions),
            None => unreachable!("new_cyclic runs its closure exactly once"),
        }
    }
}
