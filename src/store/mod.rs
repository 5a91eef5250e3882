//! State container primitives.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Setter ──→ Update ──→ Store ──→ Subscribers
//!                                    │
//!                                    └──→ Middleware (persist, devtools)
//! ```
//!
//! - **State**: the stored value and how a patch merges into it
//! - **Update**: either a ready patch or a fallible transform of the current value
//! - **Store**: the container; serialises updates and notifies in order
//! - **Bound**: a store together with the actions closed over its setter

mod bound;
mod container;
mod error;
mod middleware;
mod update;

pub use bound::{combine, create, Bound};
pub use container::{Setter, Store, StoreBuilder, Subscription, WeakStore, ANONYMOUS_ACTION};
pub use error::StoreError;
pub use middleware::Middleware;
pub use update::{State, Update};
