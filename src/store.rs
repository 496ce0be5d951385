use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::now_ms;

/// Entity handle. The outer store lock is only held while looking the entity
/// up; callers then serialize on this per-entity lock.
pub type Shared<T> = Arc<tokio::sync::Mutex<T>>;

pub trait EntityStore<T>: Send + Sync {
    fn get(&self, id: &str) -> Option<Shared<T>>;
    fn put(&self, id: String, value: T) -> Shared<T>;
    fn delete(&self, id: &str) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops entities untouched for longer than the store's retention window.
    /// Returns how many were removed.
    fn evict_idle(&self, now_ms: u64) -> usize;
}

struct Slot<T> {
    value: Shared<T>,
    touched_at_ms: u64,
}

/// In-process store with optional idle expiry.
pub struct MemoryStore<T> {
    ttl_ms: Option<u64>,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> MemoryStore<T> {
    pub fn new(ttl_ms: Option<u64>) -> Self {
        Self {
            ttl_ms,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send> EntityStore<T> for MemoryStore<T> {
    fn get(&self, id: &str) -> Option<Shared<T>> {
        let mut slots = self.slots();
        let slot = slots.get_mut(id)?;
        slot.touched_at_ms = now_ms();
        Some(Arc::clone(&slot.value))
    }

    fn put(&self, id: String, value: T) -> Shared<T> {
        let value = Arc::new(tokio::sync::Mutex::new(value));
        self.slots().insert(
            id,
            Slot {
                value: Arc::clone(&value),
                touched_at_ms: now_ms(),
            },
        );
        value
    }

    fn delete(&self, id: &str) -> bool {
        self.slots().remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.slots().len()
    }

    fn evict_idle(&self, now_ms: u64) -> usize {
        let Some(ttl_ms) = self.ttl_ms else {
            return 0;
        };
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, slot| now_ms.saturating_sub(slot.touched_at_ms) <= ttl_ms);
        before - slots.len()
    }
}
