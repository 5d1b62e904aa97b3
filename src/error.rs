//! Error types for sql-map
//!
//! Key-not-found is never an error: lookups return `Option` and removals
//! return `bool`. Everything here is a genuine failure of the call.

use core::fmt;
use thiserror::Error;

/// Result type alias using MapError
pub type Result<T> = std::result::Result<T, MapError>;

/// Unified error type for map and interner operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    /// A fallible reservation failed. The structure that reported it is
    /// left exactly as it was before the call.
    #[error("out of memory while growing {what}")]
    OutOfMemory { what: &'static str },

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("map used after it was destroyed")]
    UseAfterFree,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MapError {
    pub(crate) fn oom(what: &'static str) -> Self {
        MapError::OutOfMemory { what }
    }
}

/// A rejected `put`. Carries the value back so the caller keeps ownership.
#[derive(Clone, PartialEq, Eq)]
pub struct PutError<V> {
    pub error: MapError,
    pub value: V,
}

impl<V> PutError<V> {
    pub(crate) fn new(error: MapError, value: V) -> Self {
        Self { error, value }
    }

    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V> fmt::Debug for PutError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<V> fmt::Display for PutError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put rejected: {}", self.error)
    }
}

impl<V> std::error::Error for PutError<V> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<V> From<PutError<V>> for MapError {
    fn from(e: PutError<V>) -> Self {
        e.error
    }
}

impl From<std::collections::TryReserveError> for MapError {
    fn from(_: std::collections::TryReserveError) -> Self {
        MapError::oom("vector storage")
    }
}

impl From<hashbrown::TryReserveError> for MapError {
    fn from(_: hashbrown::TryReserveError) -> Self {
        MapError::oom("hash index")
    }
}
