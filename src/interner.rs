//! String interner: canonical, shareable storage for map keys.
//!
//! Equal strings interned through the same `Interner` come back as the
//! same allocation, so `InternedStr::ptr_eq` is a valid equality test for
//! them. The pool has its own lock and is shared by cloning the handle,
//! which lets several tables (on several threads) use one pool.

use crate::error::{MapError, Result};
use crate::hash::{hash_str, spread};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use hashbrown::HashTable;
use parking_lot::RwLock;
use std::sync::Arc;

/// Immutable, reference-counted key text.
///
/// Equality and hashing are by content, with pointer identity as the fast
/// path. A handle stays valid after its interner is cleared or dropped.
#[derive(Clone)]
pub struct InternedStr(Arc<str>);

impl InternedStr {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both handles point at the same pooled allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for InternedStr {
    type Target = str;
    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for InternedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for InternedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq for InternedStr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        InternedStr::ptr_eq(self, other) || self.0 == other.0
    }
}

impl Eq for InternedStr {}

impl PartialEq<str> for InternedStr {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for InternedStr {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Hash for InternedStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct PoolEntry {
    hash: u64,
    text: InternedStr,
}

#[derive(Default)]
struct Pool {
    index: HashTable<usize>,
    entries: Vec<PoolEntry>,
}

impl Pool {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashTable::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
        }
    }

    fn lookup(&self, hash: u64, s: &str) -> Option<&InternedStr> {
        self.index
            .find(hash, |&i| self.entries[i].text.as_str() == s)
            .map(|&i| &self.entries[i].text)
    }

    /// Reserve first, then commit, so a failed reservation leaves the
    /// pool untouched.
    fn insert(&mut self, hash: u64, s: &str) -> Result<InternedStr> {
        let Pool { index, entries } = self;
        entries.try_reserve(1)?;
        index.try_reserve(1, |&i| entries[i].hash)?;

        let id = entries.len();
        let text = InternedStr(Arc::from(s));
        entries.push(PoolEntry {
            hash,
            text: text.clone(),
        });
        index.insert_unique(hash, id, |&i| entries[i].hash);
        Ok(text)
    }
}

/// Thread-safe string pool. Cloning yields another handle to the same pool.
#[derive(Clone, Default)]
pub struct Interner {
    pool: Arc<RwLock<Pool>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: Arc::new(RwLock::new(Pool::with_capacity(capacity))),
        }
    }

    /// Return the canonical handle for `s`, copying it into the pool on
    /// first sight.
    pub fn intern(&self, s: &str) -> Result<InternedStr> {
        let hash = spread(hash_str(s));

        // Fast path: already pooled, read lock only.
        if let Some(found) = self.pool.read().lookup(hash, s) {
            return Ok(found.clone());
        }

        let mut pool = self.pool.write();
        // Another thread may have won the race for the write lock.
        if let Some(found) = pool.lookup(hash, s) {
            return Ok(found.clone());
        }
        let text = pool.insert(hash, s).map_err(|e| match e {
            MapError::OutOfMemory { .. } => MapError::oom("interner pool"),
            other => other,
        })?;
        tracing::trace!(pooled = pool.entries.len(), "interned new key");
        Ok(text)
    }

    /// Canonical handle for `s` if it has been interned; never grows the pool.
    pub fn get(&self, s: &str) -> Option<InternedStr> {
        self.pool.read().lookup(spread(hash_str(s)), s).cloned()
    }

    pub fn len(&self) -> usize {
        self.pool.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.read().entries.is_empty()
    }

    /// Drop every pooled string. Outstanding `InternedStr` handles stay
    /// readable, but a later `intern` of the same text yields a fresh
    /// allocation that is not `ptr_eq` to them.
    pub fn clear(&self) {
        let mut pool = self.pool.write();
        let released = pool.entries.len();
        pool.index.clear();
        pool.entries.clear();
        tracing::debug!(released, "interner cleared");
    }

    /// True when both handles share one pool.
    pub fn same_pool(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.pool, &b.pool)
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}
