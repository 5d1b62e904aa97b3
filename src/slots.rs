//! SlotArray: the data layer. Append-only value storage addressed by `Slot`.
//!
//! Slots are never reclaimed. Overwriting or removing a key leaves its old
//! slot in place (orphaned), which keeps every issued `Slot` stable.

use crate::error::{MapError, Result};

/// Position of one stored value in a `SlotArray`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub(crate) struct Slot(usize);

impl Slot {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct SlotArray<V> {
    values: Vec<V>,
}

impl<V> SlotArray<V> {
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(capacity)
            .map_err(|_| MapError::oom("slot array"))?;
        Ok(Self { values })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Make room for one more value, doubling capacity when full.
    pub(crate) fn reserve_one(&mut self) -> Result<()> {
        let len = self.values.len();
        if len < self.values.capacity() {
            return Ok(());
        }
        let target = self.values.capacity().saturating_mul(2).max(1);
        self.values
            .try_reserve_exact(target - len)
            .map_err(|_| MapError::oom("slot array"))
    }

    /// Append `value`. Callers reserve first so this never reallocates.
    pub(crate) fn push(&mut self, value: V) -> Slot {
        debug_assert!(self.values.len() < self.values.capacity());
        let slot = Slot(self.values.len());
        self.values.push(value);
        slot
    }

    #[inline]
    pub(crate) fn get(&self, slot: Slot) -> Option<&V> {
        self.values.get(slot.0)
    }

    /// Hand every stored value back, orphaned slots included, in slot order.
    pub(crate) fn into_values(self) -> Vec<V> {
        self.values
    }
}
