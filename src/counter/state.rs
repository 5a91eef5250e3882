use serde::{Deserialize, Serialize};

use crate::store::State;

/// Store name and persistence key of the local counter.
pub const COUNT_STORE: &str = "countStore";

/// Store name and persistence key of the remote-backed counter.
pub const API_STORE: &str = "apiStore";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterPatch {
    pub count: Option<i64>,
}

impl CounterPatch {
    pub fn count(count: i64) -> Self {
        Self { count: Some(count) }
    }
}

impl State for Counter {
    type Patch = CounterPatch;

    fn apply(&mut self, patch: CounterPatch) {
        if let Some(count) = patch.count {
            self.count = count;
        }
    }
}
