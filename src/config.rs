//! Construction parameters for `ChainedHashMap`.

use thiserror::Error;

/// Bucket count used when the caller asks for zero buckets.
pub const DEFAULT_CAPACITY: usize = 128;

/// Load factor at which the bucket array doubles.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("load factor threshold must be finite and greater than zero, got {0}")]
    InvalidLoadFactor(f64),
}

/// Initial capacity and growth threshold of a table.
///
/// `initial_capacity == 0` selects [`DEFAULT_CAPACITY`]; any other value is
/// rounded up to the next power of two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }

    /// Bucket count the table actually starts with.
    pub fn bucket_count(&self) -> usize {
        match self.initial_capacity {
            0 => DEFAULT_CAPACITY,
            // Saturate at the largest power of two instead of overflowing.
            n => n
                .checked_next_power_of_two()
                .unwrap_or(1 << (usize::BITS - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TableConfig::default();
        assert_eq!(c.bucket_count(), DEFAULT_CAPACITY);
        assert_eq!(c.load_factor, DEFAULT_LOAD_FACTOR);
        assert!(c.validate().is_ok());
        assert!(DEFAULT_CAPACITY.is_power_of_two());
    }

    /// Invariant: the starting bucket count is always a power of two, >= 1.
    #[test]
    fn bucket_count_rounds_up() {
        let cases = [(0, DEFAULT_CAPACITY), (1, 1), (3, 4), (4, 4), (5, 8), (1000, 1024)];
        for (requested, expected) in cases {
            let c = TableConfig::new().with_initial_capacity(requested);
            assert_eq!(c.bucket_count(), expected, "requested {requested}");
        }
        let huge = TableConfig::new().with_initial_capacity(usize::MAX);
        assert!(huge.bucket_count().is_power_of_two());
    }

    #[test]
    fn rejects_bad_load_factors() {
        for lf in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let c = TableConfig::new().with_load_factor(lf);
            assert!(matches!(c.validate(), Err(ConfigError::InvalidLoadFactor(_))));
        }
        assert!(TableConfig::new().with_load_factor(3.0).validate().is_ok());
    }
}
