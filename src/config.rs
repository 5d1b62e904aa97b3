//! Configuration for sql-map tables
//!
//! Centralized sizing and growth policy with sensible defaults.

use crate::error::{MapError, Result};

/// Prime initial bucket count; spreads djb2 hashes well before the first
/// rehash.
pub const DEFAULT_BUCKET_COUNT: usize = 1031;

/// Initial capacity of the slot array.
pub const DEFAULT_SLOT_CAPACITY: usize = 16;

/// Rehash threshold for `entries / buckets`.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.70;

/// Sizing and growth policy for a table
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    // -------------------------------------------------------------------------
    // Index Layer
    // -------------------------------------------------------------------------
    /// Number of chain heads allocated at creation
    pub initial_bucket_count: usize,

    /// A put rehashes first when `entries / buckets` exceeds this
    pub max_load_factor: f64,

    /// Bucket count multiplier applied on each rehash (at least 2)
    pub growth_factor: usize,

    // -------------------------------------------------------------------------
    // Data Layer
    // -------------------------------------------------------------------------
    /// Slots reserved up front; the array doubles when full
    pub initial_slot_capacity: usize,

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------
    /// Clear the (possibly shared) interner when the table is destroyed.
    /// Every table sharing the interner is affected.
    pub clear_interner_on_destroy: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_bucket_count: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: 2,
            initial_slot_capacity: DEFAULT_SLOT_CAPACITY,
            clear_interner_on_destroy: false,
        }
    }
}

impl MapConfig {
    /// Create a new config builder
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }

    /// Reject configurations the table cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.initial_bucket_count == 0 {
            return Err(MapError::Config(
                "initial_bucket_count must be at least 1".to_string(),
            ));
        }
        if !self.max_load_factor.is_finite() || self.max_load_factor <= 0.0 {
            return Err(MapError::Config(format!(
                "max_load_factor must be finite and positive, got {}",
                self.max_load_factor
            )));
        }
        if self.growth_factor < 2 {
            return Err(MapError::Config(format!(
                "growth_factor must be at least 2, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }
}

/// Builder for MapConfig
#[derive(Default)]
pub struct MapConfigBuilder {
    config: MapConfig,
}

impl MapConfigBuilder {
    /// Set the number of buckets allocated at creation
    pub fn initial_bucket_count(mut self, count: usize) -> Self {
        self.config.initial_bucket_count = count;
        self
    }

    /// Set the load factor that triggers a rehash
    pub fn max_load_factor(mut self, factor: f64) -> Self {
        self.config.max_load_factor = factor;
        self
    }

    /// Set the bucket count multiplier used by rehash
    pub fn growth_factor(mut self, factor: usize) -> Self {
        self.config.growth_factor = factor;
        self
    }

    /// Set the number of slots reserved at creation
    pub fn initial_slot_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_slot_capacity = capacity;
        self
    }

    /// Clear the interner when the table is destroyed
    pub fn clear_interner_on_destroy(mut self, clear: bool) -> Self {
        self.config.clear_interner_on_destroy = clear;
        self
    }

    /// Validate and return the config
    pub fn build(self) -> Result<MapConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
