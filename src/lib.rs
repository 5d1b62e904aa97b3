//! sql-map: a string-keyed map with an interned index layer over an
//! append-only slot array, meant as an embeddable building block (symbol
//! tables, row indexes) rather than a database.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep key lookup (index layer) and value storage (data layer)
//!   separate, so updates never move values and slot numbers stay stable.
//! - Layers:
//!   - Interner: deduplicates key text into one canonical `Arc<str>` per
//!     distinct string. Backed by its own hash table and lock; shareable
//!     between tables by cloning the handle.
//!   - ChainIndex: bucket array of singly linked chains. Chain nodes live
//!     in a generational arena and carry the interned key, its stored
//!     djb2 hash and the slot number inline.
//!   - SlotArray: append-only `Vec<V>`; slot numbers are plain indices.
//!   - RawSqlMap: the controller (put/get/remove/rehash) with no internal
//!     synchronization; `&mut self` enforces exclusive access.
//!   - SqlMap: RawSqlMap behind one `parking_lot::Mutex`; every
//!     operation, rehash included, is a single critical section.
//!
//! Constraints
//! - Keys are strings; values are opaque handles owned by the caller.
//!   `destroy` hands every stored value back instead of dropping it.
//! - Initial bucket count 1031; a put rehashes first whenever
//!   `entries / buckets` exceeds the max load factor (0.70), multiplying
//!   the bucket count by the growth factor (2).
//! - Overwriting a key appends a new slot and orphans the old one. Slots
//!   are never reclaimed or compacted; the index never shrinks.
//! - Absent is `None`. Storing `Option<T>` keeps "stored nothing"
//!   (`Some(None)`) distinct from "no such key" (`None`).
//!
//! Failure model
//! - Growth of the slot array, bucket table and interner pool goes through
//!   fallible reservation and reports `MapError::OutOfMemory` with the
//!   table unchanged. Chain-node and key-text allocation abort on OOM, as
//!   the standard collections do.
//! - A rejected `put` returns the value inside `PutError`, so the caller
//!   never loses a handle it meant to store.
//! - Using a destroyed `SqlMap` reports `MapError::UseAfterFree`.
//!   `RawSqlMap::destroy` consumes the table, so the same misuse does not
//!   compile there.
//!
//! Lock ordering
//! - SqlMap's table lock is always taken before the interner's lock.
//!   Nothing takes them in the opposite order.
//!
//! Notes and non-goals
//! - No iteration, persistence, range queries or non-string keys.
//! - `Interner::clear` (or `clear_interner_on_destroy`) empties a shared
//!   pool. Live keys keep working because chains compare by content when
//!   canonical pointers differ.

pub mod config;
pub mod error;
pub mod hash;
mod index;
pub mod interner;
mod raw_map;
mod raw_map_proptest;
mod slots;
mod sql_map;

// Public surface
pub use config::{MapConfig, MapConfigBuilder};
pub use error::{MapError, PutError, Result};
pub use interner::{InternedStr, Interner};
pub use raw_map::{MapStats, RawSqlMap};
pub use sql_map::SqlMap;
