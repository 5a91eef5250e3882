//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_counter;

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use counterstate::counter::{Counter, COUNT_STORE};
use counterstate::persist::Persistence;
use counterstate::storage::{MemoryStorage, Storage};
use tempfile::TempDir;

/// Find a port with nothing listening on it.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}

/// Base URL that refuses connections.
pub fn dead_base_url() -> String {
    format!("http://127.0.0.1:{}", free_port())
}

/// Write `content` as `config.toml` in a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}

/// Persistence for the local counter over a shared in-memory storage.
pub fn memory_persistence(storage: &MemoryStorage, key: &str) -> Arc<Persistence<Counter>> {
    Persistence::new(Arc::new(storage.clone()) as Arc<dyn Storage>, key)
}

pub fn count_persistence(storage: &MemoryStorage) -> Arc<Persistence<Counter>> {
    memory_persistence(storage, COUNT_STORE)
}
