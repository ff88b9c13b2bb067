//! Engine configuration.

use crate::error::{EngineError, EngineResult};

/// Default cap on a single rotation file: 2 MiB.
pub const DEFAULT_MAX_ROTATION_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Default budget for the whole rotation directory: 10 MiB.
pub const DEFAULT_MAX_DIRECTORY_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for building a capture engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum size of a single rotation file before a new one is opened.
    pub max_rotation_file_size: u64,

    /// Total rotation-directory budget; once reached, the oldest rotation
    /// file is evicted. Eviction removes one file per incoming line, so the
    /// directory can transiently exceed this under a bursty source.
    pub max_directory_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_rotation_file_size: DEFAULT_MAX_ROTATION_FILE_SIZE,
            max_directory_size: DEFAULT_MAX_DIRECTORY_SIZE,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum rotation-file size.
    #[must_use]
    pub const fn max_rotation_file_size(mut self, size: u64) -> Self {
        self.max_rotation_file_size = size;
        self
    }

    /// Sets the rotation-directory budget.
    #[must_use]
    pub const fn max_directory_size(mut self, size: u64) -> Self {
        self.max_directory_size = size;
        self
    }

    /// Validates the configuration.
    ///
    /// The file cap must be strictly less than the directory budget; equal
    /// caps are rejected.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if
    /// `max_rotation_file_size >= max_directory_size`.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_rotation_file_size >= self.max_directory_size {
            return Err(EngineError::config(format!(
                "max_rotation_file_size ({}) must be less than max_directory_size ({})",
                self.max_rotation_file_size, self.max_directory_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_rotation_file_size, 2 * 1024 * 1024);
        assert_eq!(config.max_directory_size, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_rotation_file_size(100)
            .max_directory_size(250);

        assert_eq!(config.max_rotation_file_size, 100);
        assert_eq!(config.max_directory_size, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn equal_caps_are_invalid() {
        let config = Config::new()
            .max_rotation_file_size(1024)
            .max_directory_size(1024);

        assert!(matches!(
            config.validate(),
            Err(EngineError::Config { .. })
        ));
    }

    #[test]
    fn file_cap_above_directory_budget_is_invalid() {
        let config = Config::new()
            .max_rotation_file_size(2048)
            .max_directory_size(1024);

        assert!(config.validate().is_err());
    }
}
