//! Update protocol for stores.

/// A value that can live inside a [`Store`](super::Store).
///
/// `Patch` is the partial form of the value. Applying a patch must be a
/// shallow merge: fields present in the patch overwrite, the rest stay.
pub trait State: Clone + Send + Sync + 'static {
    /// Partial form of the state.
    type Patch: Send + 'static;

    /// Merge a patch into the state. Must not fail.
    fn apply(&mut self, patch: Self::Patch);
}

type TransformFn<V> = Box<dyn FnOnce(&V) -> anyhow::Result<<V as State>::Patch> + Send>;

/// An update request for a store.
///
/// `Replace` carries a ready patch. `Transform` computes the patch from the
/// current value; if it fails the store is left untouched.
pub enum Update<V: State> {
    Replace(V::Patch),
    Transform(TransformFn<V>),
}

impl<V: State> Update<V> {
    pub fn replace(patch: V::Patch) -> Self {
        Update::Replace(patch)
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: FnOnce(&V) -> anyhow::Result<V::Patch> + Send + 'static,
    {
        Update::Transform(Box::new(f))
    }

    /// Resolve the update into a patch against `current`.
    pub(crate) fn into_patch(self, current: &V) -> anyhow::Result<V::Patch> {
        match self {
            Update::Replace(patch) => Ok(patch),
            Update::Transform(f) => f(current),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Update::Replace(_) => "replace",
            Update::Transform(_) => "transform",
        }
    }
}

impl<V: State> std::fmt::Debug for Update<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Update::{}", self.kind())
    }
}
