//! Populate-once, read-only caches for resources that are expensive to load.
//!
//! The statistics table and the decoded model are immutable once loaded, so
//! they are shared as `Arc<T>` snapshots. Loading goes through a single async
//! barrier: concurrent callers that miss wait for the one in-flight load
//! instead of racing their own. `invalidate` drops the snapshot; readers
//! holding an `Arc` keep the old value until they let go of it.

use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
#[error("cache lock poisoned")]
pub struct CachePoisoned;

pub struct ResourceCache<T> {
    slot: RwLock<Slot<T>>,
    init: Mutex<()>,
}

struct Slot<T> {
    value: Option<Arc<T>>,
    /// Bumped by every `invalidate`; a load only publishes into the
    /// generation it started in.
    generation: u64,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(Slot {
                value: None,
                generation: 0,
            }),
            init: Mutex::new(()),
        }
    }
}

impl<T> ResourceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if one has been loaded.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().ok().and_then(|slot| slot.value.clone())
    }

    pub fn is_populated(&self) -> bool {
        self.get().is_some()
    }

    /// Return the snapshot, running `load` first if the cache is empty.
    ///
    /// A failed load leaves the cache empty so the next caller retries. A load
    /// that overlaps an `invalidate` is returned to its caller but not cached.
    pub async fn get_or_try_load<F, Fut, E>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CachePoisoned>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let _barrier = self.init.lock().await;
        let generation = {
            let slot = self.slot.read().map_err(|_| CachePoisoned)?;
            if let Some(value) = &slot.value {
                return Ok(Arc::clone(value));
            }
            slot.generation
        };

        let value = Arc::new(load().await?);
        let mut slot = self.slot.write().map_err(|_| CachePoisoned)?;
        if slot.generation == generation {
            slot.value = Some(Arc::clone(&value));
        }
        Ok(value)
    }

    /// Drop the snapshot so the next access reloads. A load already in flight
    /// will not publish its result.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.write() {
            slot.value = None;
            slot.generation += 1;
        }
    }
}
