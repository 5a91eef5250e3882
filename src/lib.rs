//! Observable state containers for a single counter.
//!
//! The crate exposes the building blocks separately so each pattern can be
//! composed on its own:
//!
//! - [`store`]: the state container, its update protocol and middleware hook
//! - [`persist`]: write-through persistence with rehydration on construction
//! - [`devtools`]: `(action, prev, next)` instrumentation
//! - [`selector`]: per-field accessors derived from a record-shaped store
//! - [`remote`]: HTTP client for the `/count/{id}` API
//! - [`counter`]: the counter value and its local and remote-backed actions

pub mod config;
pub mod counter;
pub mod devtools;
pub mod logging;
pub mod persist;
pub mod remote;
pub mod selector;
pub mod storage;
pub mod store;
