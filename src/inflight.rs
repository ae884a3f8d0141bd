use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;

/// Per-key mutual exclusion. Callers with different keys never wait on each other.
#[derive(Debug, Default)]
pub struct InFlight {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    pub fn run<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        let result = {
            let _held = slot.lock();
            f()
        };
        let mut slots = self.slots.lock();
        // the map and this call are the only owners: nobody is waiting
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        result
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
