//! Reference-counted handle table.
//!
//! # Locking
//!
//! The table sits behind a reader/writer lock. Lookups and refcount changes
//! take the shared lock; insertion and deletion take the exclusive lock.
//! Refcounts are atomics, so any number of claim/release calls on live
//! entries run concurrently without serializing on each other.
//!
//! Refcount changes happen while the shared lock is held. A deletion (which
//! needs the exclusive lock) therefore can never interleave with an
//! increment on the same entry, so no claim is ever taken on an entry that
//! has already left the table.
//!
//! # The zero window
//!
//! A release that takes the count to zero drops the shared lock and then
//! acquires the exclusive one. In between, another thread may claim the
//! entry again. Deletion re-reads the count under the exclusive lock and
//! backs off if it is no longer zero, or if the slot now holds a different
//! entry.

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::handle::{HandleId, HandleIdGenerator};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// A tracked object together with its outstanding claims.
pub struct RefEntry<T> {
    object: T,
    refs: AtomicU32,
}

impl<T> RefEntry<T> {
    fn new(object: T) -> Self {
        Self {
            object,
            refs: AtomicU32::new(1),
        }
    }

    /// The tracked object.
    pub fn object(&self) -> &T {
        &self.object
    }

    /// Outstanding claims at the time of the call.
    pub fn refcount(&self) -> u32 {
        self.refs.load(Ordering::Acquire)
    }
}

impl<T: fmt::Debug> fmt::Debug for RefEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefEntry")
            .field("object", &self.object)
            .field("refs", &self.refcount())
            .finish()
    }
}

/// Outcome of a successful [`HandleRegistry::decref`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Claims remain; the entry is still live.
    Retained(u32),
    /// That was the last claim. The entry was removed and the registry's
    /// ownership of the object dropped.
    Released,
    /// The count reached zero, but a concurrent claim got in before the
    /// entry could be deleted. Whoever holds that claim now owns the final
    /// release.
    DeletionAborted,
}

/// Result of the lock-free half of a release.
enum Decrement<T> {
    Retained(u32),
    ReachedZero(Arc<RefEntry<T>>),
}

/// Table of live objects keyed by opaque handle.
pub struct HandleRegistry<T> {
    entries: RwLock<HashMap<HandleId, Arc<RefEntry<T>>>>,
    ids: HandleIdGenerator,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self::with_config(&RegistryConfig::default())
    }

    pub fn with_config(config: &RegistryConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            ids: HandleIdGenerator::new(config.id_strategy),
        }
    }

    /// Register `object` with a single claim and return its handle.
    ///
    /// The handle is never zero and never aliases a live entry: candidates
    /// that collide are discarded and redrawn under the write lock.
    pub fn add(&self, object: T) -> HandleId {
        let entry = Arc::new(RefEntry::new(object));

        let mut entries = self.entries.write();
        let id = loop {
            let candidate = self.ids.generate();
            if candidate.is_valid() && !entries.contains_key(&candidate) {
                break candidate;
            }
            debug!(handle = %candidate, "handle id collision, redrawing");
        };
        entries.insert(id, entry);
        let live = entries.len();
        drop(entries);

        debug!(handle = %id, live, "registered handle");
        id
    }

    /// Take an additional claim on `id`. Returns the new claim count.
    pub fn incref(&self, id: HandleId) -> Result<u32> {
        let entries = self.entries.read();
        let entry = entries.get(&id).ok_or(RegistryError::UnknownHandle(id))?;
        let refs = entry.refs.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(handle = %id, refs, "incref");
        Ok(refs)
    }

    /// Give up one claim on `id`.
    ///
    /// The entry is removed when the last claim goes. The object itself is
    /// dropped outside the lock, once no [`get`](Self::get) borrower still
    /// holds the entry.
    pub fn decref(&self, id: HandleId) -> Result<Release> {
        match self.decrement(id)? {
            Decrement::Retained(refs) => Ok(Release::Retained(refs)),
            Decrement::ReachedZero(entry) => Ok(self.remove_if_unclaimed(id, entry)),
        }
    }

    /// Shared-lock half of [`decref`](Self::decref).
    fn decrement(&self, id: HandleId) -> Result<Decrement<T>> {
        let entries = self.entries.read();
        let entry = entries.get(&id).ok_or(RegistryError::UnknownHandle(id))?;

        let prev = entry
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map_err(|_| RegistryError::RefcountUnderflow(id))?;

        if prev > 1 {
            debug!(handle = %id, refs = prev - 1, "decref");
            return Ok(Decrement::Retained(prev - 1));
        }
        Ok(Decrement::ReachedZero(Arc::clone(entry)))
    }

    /// Exclusive-lock half of [`decref`](Self::decref).
    fn remove_if_unclaimed(&self, id: HandleId, entry: Arc<RefEntry<T>>) -> Release {
        let removed = {
            let mut entries = self.entries.write();
            let unclaimed = entries
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &entry))
                && entry.refcount() == 0;
            if unclaimed { entries.remove(&id) } else { None }
        };

        match removed {
            Some(removed) => {
                debug!(handle = %id, "released handle");
                // Both clones drop here, after the write lock is gone, so the
                // object's destructor may call back into the registry.
                drop(removed);
                drop(entry);
                Release::Released
            }
            None => {
                debug!(handle = %id, "entry reclaimed before deletion");
                Release::DeletionAborted
            }
        }
    }

    /// Look up `id` without touching its claims.
    pub fn get(&self, id: HandleId) -> Option<Arc<RefEntry<T>>> {
        self.entries.read().get(&id).cloned()
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: HandleId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Current claim count of `id`, if live.
    pub fn refcount(&self, id: HandleId) -> Option<u32> {
        self.entries.read().get(&id).map(|e| e.refcount())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry regardless of outstanding claims and return how
    /// many there were. Used at process shutdown.
    pub fn drain(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.write());
        let count = drained.len();
        drop(drained);
        count
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandleRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("ids", &self.ids)
            .field("live", &self.len())
            .finish()
    }
}
