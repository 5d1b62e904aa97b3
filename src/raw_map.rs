//! RawSqlMap: the table controller without internal synchronization.
//!
//! Orchestrates the interner, the chain index and the slot array. Mutating
//! methods take `&mut self`, so the borrow checker stands in for a lock;
//! `SqlMap` wraps this type in a mutex for shared use.

use crate::config::MapConfig;
use crate::error::{MapError, PutError, Result};
use crate::hash::hash_str;
use crate::index::{ChainIndex, Upsert};
use crate::interner::{InternedStr, Interner};
use crate::slots::SlotArray;

/// Point-in-time counters for a table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapStats {
    /// Live keys (`entryCount`).
    pub entries: usize,
    pub buckets: usize,
    /// Slots ever allocated (`dataCount`).
    pub slots: usize,
    /// Slots no live key points at any more.
    pub orphaned_slots: usize,
    pub rehashes: u64,
    pub load_factor: f64,
}

#[derive(Debug)]
pub struct RawSqlMap<V> {
    config: MapConfig,
    interner: Interner,
    index: ChainIndex,
    slots: SlotArray<V>,
    rehashes: u64,
}

impl<V> RawSqlMap<V> {
    /// Empty table with the default configuration and a private interner.
    pub fn new() -> Result<Self> {
        Self::with_config(MapConfig::default())
    }

    pub fn with_config(config: MapConfig) -> Result<Self> {
        Self::with_interner(config, Interner::new())
    }

    /// Empty table that interns its keys into `interner`, which may be
    /// shared with other tables.
    pub fn with_interner(config: MapConfig, interner: Interner) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index: ChainIndex::with_buckets(config.initial_bucket_count)?,
            slots: SlotArray::with_capacity(config.initial_slot_capacity)?,
            interner,
            config,
            rehashes: 0,
        })
    }

    /// Insert or overwrite the value for `key`.
    ///
    /// Overwriting appends a new slot and orphans the old one. Every
    /// allocation is reserved before the table changes, so an error leaves
    /// all keys bound as they were and hands `value` back.
    pub fn put(&mut self, key: &str, value: V) -> std::result::Result<(), PutError<V>> {
        let key = match self.reserve_put(key) {
            Ok(key) => key,
            Err(error) => return Err(PutError::new(error, value)),
        };
        let hash = hash_str(&key);

        let slot = self.slots.push(value);
        if let Upsert::Updated { previous } = self.index.upsert(key, hash, slot) {
            tracing::trace!(
                previous = previous.index(),
                slot = slot.index(),
                "update orphaned slot"
            );
        }
        Ok(())
    }

    /// Value most recently put for `key`, if the key is live.
    pub fn get(&self, key: &str) -> Result<Option<&V>> {
        let key = self.interner.intern(key)?;
        let hash = hash_str(&key);
        Ok(self.index.find_interned(hash, &key).and_then(|slot| {
            debug_assert!(slot.index() < self.slots.len());
            self.slots.get(slot)
        }))
    }

    /// Unbind `key`. The value stays in its (now orphaned) slot.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let key = self.interner.intern(key)?;
        let hash = hash_str(&key);
        Ok(self.index.remove(hash, &key).is_some())
    }

    /// Content lookup that never touches the interner.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.find(hash_str(key), key).is_some()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    /// Slots ever allocated, orphans included. Never decreases.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.index.load_factor()
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            entries: self.index.len(),
            buckets: self.index.bucket_count(),
            slots: self.slots.len(),
            // Each slot is referenced by at most one node.
            orphaned_slots: self.slots.len() - self.index.len(),
            rehashes: self.rehashes,
            load_factor: self.index.load_factor(),
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Tear the table down and hand every stored value back to the caller,
    /// orphaned slots included, in slot order.
    pub fn destroy(self) -> Vec<V> {
        let RawSqlMap {
            config,
            interner,
            index,
            slots,
            rehashes,
        } = self;
        let entries = index.len();
        drop(index);
        if config.clear_interner_on_destroy {
            interner.clear();
        }
        tracing::info!(
            entries,
            slots = slots.len(),
            rehashes,
            "map destroyed"
        );
        slots.into_values()
    }

    fn reserve_put(&mut self, key: &str) -> Result<InternedStr> {
        if self.index.load_factor() > self.config.max_load_factor {
            self.grow()?;
        }
        self.slots.reserve_one()?;
        self.interner.intern(key)
    }

    fn grow(&mut self) -> Result<()> {
        let old = self.index.bucket_count();
        let new = old
            .checked_mul(self.config.growth_factor)
            .ok_or(MapError::oom("bucket table"))?;
        self.index.rehash(new)?;
        self.rehashes += 1;
        tracing::debug!(
            old_buckets = old,
            new_buckets = new,
            entries = self.index.len(),
            "rehashed index"
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.index.assert_consistent(self.slots.len());
    }
}
