//! The counter value and the stores built around it.
//!
//! Five flavours of the same counter:
//!
//! - [`basic_counter`]: initializer receives the setter and returns value + actions
//! - [`combined_counter`]: initial shape plus an action-producing function
//! - [`persisted_counter`]: write-through persistence and devtools
//! - selectors via [`Store::selectors`](crate::store::Store::selectors) on any of them
//! - [`api_counter`]: actions backed by the remote counter API

mod api;
mod local;
mod state;

pub use api::{api_counter, ApiCounterActions};
pub use local::{basic_counter, combined_counter, persisted_counter, CounterActions};
pub use state::{Counter, CounterPatch, API_STORE, COUNT_STORE};

use thiserror::Error;

use crate::remote::RemoteError;
use crate::store::StoreError;

/// Errors from remote-backed counter actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The remote call failed; the store was not touched.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
