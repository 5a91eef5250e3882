//! TOML configuration.
//!
//! ```toml
//! [storage]
//! dir = "/home/me/.local/share/counterstate"
//!
//! [remote]
//! base_url = "https://counter.example.com"
//! counter_id = "1"
//! timeout_seconds = 10
//! ```

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, RemoteConfig, StorageConfig};
