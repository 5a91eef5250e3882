//! Per-field selectors derived from a record-shaped store.
//!
//! The fields of a store are the top-level keys of its value's JSON form.
//! [`Store::selectors`] derives one [`Selector`] per field the first time it
//! is called and hands out the same map afterwards, so a selector for a
//! given key keeps its identity for the life of the store.
//!
//! The key set is fixed at derivation time. Fields that appear later get no
//! selector.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::{State, Store, StoreError, Subscription, WeakStore};

/// Read-only accessor for one field of a store.
///
/// Clones share identity; see [`Selector::ptr_eq`].
pub struct Selector<V: State> {
    inner: Arc<SelectorInner<V>>,
}

struct SelectorInner<V: State> {
    store: WeakStore<V>,
    key: String,
}

impl<V: State> Clone for Selector<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: State + Serialize> Selector<V> {
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Current value of the field. `None` once the store is gone.
    pub fn get(&self) -> Option<Value> {
        let store = self.inner.store.upgrade()?;
        store.read(|value| field_of(value, &self.inner.key))
    }

    /// Current value of the field, deserialised into `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.get().and_then(|v| serde_json::from_value(v).ok())
    }

    /// Call `callback` whenever this field changes.
    ///
    /// Updates that leave the field equal do not trigger it.
    pub fn subscribe<F>(&self, callback: F) -> Result<Subscription<V>, StoreError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let store = self.inner.store.upgrade_or_closed()?;
        let key = self.inner.key.clone();
        let last = Mutex::new(store.read(|value| field_of(value, &key)));

        Ok(store.subscribe(move |value| {
            let current = field_of(value, &key);
            let mut last = last.lock();
            if *last == current {
                return;
            }
            *last = current.clone();
            drop(last);
            callback(current.as_ref().unwrap_or(&Value::Null));
        }))
    }

    pub fn ptr_eq(&self, other: &Selector<V>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Field name → selector, derived once per store.
pub struct SelectorMap<V: State> {
    selectors: BTreeMap<String, Selector<V>>,
}

impl<V: State + Serialize> SelectorMap<V> {
    fn derive(store: &Store<V>) -> Self {
        let weak = store.downgrade();
        let selectors = store
            .read(|value| match serde_json::to_value(value) {
                Ok(Value::Object(fields)) => fields.keys().cloned().collect::<Vec<_>>(),
                Ok(_) => {
                    tracing::warn!(
                        store = %store.name(),
                        "Store value is not a record, no selectors derived"
                    );
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(
                        store = %store.name(),
                        error = %e,
                        "Store value failed to serialise, no selectors derived"
                    );
                    Vec::new()
                }
            })
            .into_iter()
            .map(|key| {
                let selector = Selector {
                    inner: Arc::new(SelectorInner {
                        store: weak.clone(),
                        key: key.clone(),
                    }),
                };
                (key, selector)
            })
            .collect();

        Self { selectors }
    }

    pub fn get(&self, key: &str) -> Option<&Selector<V>> {
        self.selectors.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector<V>)> {
        self.selectors.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl<V: State + Serialize> Store<V> {
    /// Derive (once) and return the selector map for this store.
    pub fn selectors(&self) -> Arc<SelectorMap<V>> {
        Arc::clone(
            self.selector_cell()
                .get_or_init(|| Arc::new(SelectorMap::derive(self))),
        )
    }
}

/// Free-function form of [`Store::selectors`].
pub fn selectors<V: State + Serialize>(store: &Store<V>) -> Arc<SelectorMap<V>> {
    store.selectors()
}

fn field_of<V: Serialize>(value: &V, key: &str) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => fields.remove(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Update;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        count: i64,
        label: String,
    }

    #[derive(Default)]
    struct ProfilePatch {
        count: Option<i64>,
        label: Option<String>,
    }

    impl State for Profile {
        type Patch = ProfilePatch;

        fn apply(&mut self, patch: ProfilePatch) {
            if let Some(count) = patch.count {
                self.count = count;
            }
            if let Some(label) = patch.label {
                self.label = label;
            }
        }
    }

    fn profile_store() -> Store<Profile> {
        Store::new(
            "profile",
            Profile {
                count: 0,
                label: "a".to_string(),
            },
        )
    }

    #[test]
    fn keys_mirror_fields() {
        let store = profile_store();
        let map = store.selectors();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["count", "label"]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn selectors_are_derived_once() {
        let store = profile_store();
        let first = store.selectors();
        let second = selectors(&store);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first
            .get("count")
            .unwrap()
            .ptr_eq(second.get("count").unwrap()));
    }

    #[test]
    fn selector_reads_current_value() {
        let store = profile_store();
        let count = store.selectors().get("count").unwrap().clone();
        assert_eq!(count.get_as::<i64>(), Some(0));

        store
            .set(Update::replace(ProfilePatch {
                count: Some(4),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(count.get(), Some(Value::from(4)));
    }

    #[test]
    fn selector_subscription_ignores_other_fields() {
        let store = profile_store();
        let count = store.selectors().get("count").unwrap().clone();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        count
            .subscribe(move |value| {
                assert!(value.is_i64());
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        store
            .set(Update::replace(ProfilePatch {
                label: Some("b".to_string()),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store
            .set(Update::replace(ProfilePatch {
                count: Some(1),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Same value again: no change, no call.
        store
            .set(Update::replace(ProfilePatch {
                count: Some(1),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn selector_outliving_store_reads_none() {
        let store = profile_store();
        let label = store.selectors().get("label").unwrap().clone();
        drop(store);
        assert_eq!(label.get(), None);
        assert!(matches!(label.subscribe(|_| {}), Err(StoreError::Closed { .. })));
    }

    #[test]
    fn non_record_store_has_no_selectors() {
        #[derive(Debug, Clone, Serialize)]
        struct Scalar(i64);

        impl State for Scalar {
            type Patch = i64;

            fn apply(&mut self, patch: i64) {
                self.0 = patch;
            }
        }

        let store = Store::new("scalar", Scalar(3));
        assert!(store.selectors().is_empty());
    }
}
