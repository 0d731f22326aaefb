use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use deed_types::ChainKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::deadline::{Deadline, Expired};

/// Per-chain-key async mutexes.
///
/// Appends on the same key queue behind one mutex; different keys never
/// share a mutex. An entry lives only while someone holds or awaits it.
#[derive(Default)]
pub struct ChainLocks {
    slots: Mutex<HashMap<ChainKey, Arc<AsyncMutex<()>>>>,
}

/// Exclusive hold on one chain key. Released on drop.
pub struct ChainGuard<'a> {
    locks: &'a ChainLocks,
    key: ChainKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ChainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`, giving up at `deadline`.
    pub async fn acquire(&self, key: &ChainKey, deadline: Deadline) -> Result<ChainGuard<'_>, Expired> {
        let slot = {
            let mut slots = self.slots.lock().expect("chain lock table poisoned");
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        match deadline.bound("chain lock wait", slot.lock_owned()).await {
            Ok(guard) => Ok(ChainGuard {
                locks: self,
                key: key.clone(),
                guard: Some(guard),
            }),
            Err(expired) => {
                self.release(key);
                Err(expired)
            }
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots.lock().expect("chain lock table poisoned").len()
    }

    fn release(&self, key: &ChainKey) {
        let mut slots = self.slots.lock().expect("chain lock table poisoned");
        if let Some(slot) = slots.get(key) {
            if Arc::strong_count(slot) == 1 {
                slots.remove(key);
            }
        }
    }
}

impl ChainGuard<'_> {
    pub fn key(&self) -> &ChainKey {
        &self.key
    }
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}

impl std::fmt::Debug for ChainLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLocks")
            .field("active", &self.active())
            .finish()
    }
}

impl std::fmt::Debug for ChainGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainGuard")
            .field("key", &self.key)
            .finish()
    }
}
