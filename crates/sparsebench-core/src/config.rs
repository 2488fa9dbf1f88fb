//! Benchmark configuration.

use crate::constants::{BASE_SIZE, MAX_LEVELS};
use crate::error::{Error, Result};

/// Parameters of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Edge length of mip level 0 in texels. Must be a power of two.
    pub base_size: u32,
    /// Number of mip levels walked by both passes.
    pub max_levels: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            base_size: BASE_SIZE,
            max_levels: MAX_LEVELS,
        }
    }
}

impl BenchConfig {
    /// Create a configuration with the compile-time defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level 0 edge length.
    #[must_use]
    pub const fn base_size(mut self, size: u32) -> Self {
        self.base_size = size;
        self
    }

    /// Set the number of walked mip levels.
    #[must_use]
    pub const fn max_levels(mut self, levels: u32) -> Self {
        self.max_levels = levels;
        self
    }

    /// Length of the full mip chain, `log2(base_size) + 1`.
    ///
    /// Storage is allocated for every level even though only `max_levels` are walked.
    #[must_use]
    pub const fn storage_levels(&self) -> u32 {
        u32::BITS - self.base_size.leading_zeros()
    }

    /// Reject sizes the tile walk cannot handle.
    pub fn validate(&self) -> Result<()> {
        if !self.base_size.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "base size {} is not a power of two",
                self.base_size
            )));
        }

        if self.max_levels == 0 || self.max_levels > self.storage_levels() {
            return Err(Error::InvalidConfig(format!(
                "level cap {} outside 1..={}",
                self.max_levels,
                self.storage_levels()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.base_size, 32768);
        assert_eq!(config.max_levels, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn storage_covers_full_chain() {
        assert_eq!(BenchConfig::new().storage_levels(), 16);
        assert_eq!(BenchConfig::new().base_size(1).storage_levels(), 1);
        assert_eq!(BenchConfig::new().base_size(256).storage_levels(), 9);
    }

    #[test]
    fn rejects_non_power_of_two() {
        let config = BenchConfig::new().base_size(3000);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(BenchConfig::new().base_size(0).validate().is_err());
    }

    #[test]
    fn rejects_level_cap_out_of_range() {
        assert!(BenchConfig::new().max_levels(0).validate().is_err());
        assert!(BenchConfig::new().max_levels(17).validate().is_err());
        assert!(BenchConfig::new().max_levels(16).validate().is_ok());
    }
}
