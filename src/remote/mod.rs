//! Client for the remote counter API.
//!
//! The API exposes one resource per counter id:
//!
//! ```text
//! GET /count/{id}                      -> { "value": n }
//! PUT /count/{id}  { "value": n }      -> { "value": n }
//! ```

mod client;
mod error;

pub use client::{validate_id, CountClient};
pub use error::RemoteError;
