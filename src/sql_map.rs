//! SqlMap: the table controller behind one exclusive lock.
//!
//! Every operation, including a rehash triggered inside `put`, runs in a
//! single critical section. Reads and writes serialize against each other.
//! The interner's own lock is only ever taken while the table lock is held,
//! never the other way round.

use crate::config::MapConfig;
use crate::error::{MapError, PutError, Result};
use crate::interner::Interner;
use crate::raw_map::{MapStats, RawSqlMap};
use parking_lot::Mutex;

/// Thread-safe string-keyed map. Share it across threads with `Arc`.
pub struct SqlMap<V> {
    // `None` once destroyed.
    state: Mutex<Option<RawSqlMap<V>>>,
    interner: Interner,
}

impl<V> SqlMap<V> {
    /// Empty table with the default configuration and a private interner.
    pub fn new() -> Result<Self> {
        Self::with_config(MapConfig::default())
    }

    pub fn with_config(config: MapConfig) -> Result<Self> {
        Self::with_interner(config, Interner::new())
    }

    pub fn with_interner(config: MapConfig, interner: Interner) -> Result<Self> {
        Ok(Self::from(RawSqlMap::with_interner(config, interner)?))
    }

    fn with_live<R, F>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut RawSqlMap<V>) -> Result<R>,
    {
        let mut state = self.state.lock();
        match state.as_mut() {
            Some(map) => f(map),
            None => Err(destroyed(op)),
        }
    }

    /// Insert or overwrite the value for `key`. On failure the value comes
    /// back inside the error.
    pub fn put(&self, key: &str, value: V) -> std::result::Result<(), PutError<V>> {
        let mut state = self.state.lock();
        match state.as_mut() {
            Some(map) => map.put(key, value),
            None => Err(PutError::new(destroyed("put"), value)),
        }
    }

    /// Clone of the value most recently put for `key`.
    pub fn get(&self, key: &str) -> Result<Option<V>>
    where
        V: Clone,
    {
        self.with_live("get", |m| Ok(m.get(key)?.cloned()))
    }

    /// Run `f` on the value for `key` without cloning it. `f` runs under
    /// the table lock and must not call back into this map.
    pub fn with_value<R, F>(&self, key: &str, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&V) -> R,
    {
        self.with_live("with_value", |m| Ok(m.get(key)?.map(f)))
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        self.with_live("remove", |m| m.remove(key))
    }

    pub fn contains_key(&self, key: &str) -> Result<bool> {
        self.with_live("contains_key", |m| Ok(m.contains_key(key)))
    }

    pub fn len(&self) -> Result<usize> {
        self.with_live("len", |m| Ok(m.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_live("is_empty", |m| Ok(m.is_empty()))
    }

    pub fn stats(&self) -> Result<MapStats> {
        self.with_live("stats", |m| Ok(m.stats()))
    }

    /// Handle to the interner this table uses; stays usable after destroy.
    pub fn interner(&self) -> Interner {
        self.interner.clone()
    }

    /// Tear the table down and hand every stored value back. Any later
    /// call on this handle, from any thread, fails with `UseAfterFree`.
    pub fn destroy(&self) -> Result<Vec<V>> {
        let raw = self.state.lock().take().ok_or_else(|| destroyed("destroy"))?;
        Ok(raw.destroy())
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().is_none()
    }

    /// Unwrap into the unsynchronized table, or `None` if destroyed.
    pub fn into_inner(self) -> Option<RawSqlMap<V>> {
        self.state.into_inner()
    }
}

fn destroyed(op: &'static str) -> MapError {
    tracing::warn!(op, "operation on destroyed map");
    MapError::UseAfterFree
}

impl<V> From<RawSqlMap<V>> for SqlMap<V> {
    fn from(raw: RawSqlMap<V>) -> Self {
        let interner = raw.interner().clone();
        Self {
            state: Mutex::new(Some(raw)),
            interner,
        }
    }
}

impl<V> core::fmt::Debug for SqlMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let stats = self.state.lock().as_ref().map(|m| m.stats());
        f.debug_struct("SqlMap").field("stats", &stats).finish()
    }
}
