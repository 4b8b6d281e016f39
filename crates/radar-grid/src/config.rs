//! Configuration for the resampler.

use serde::{Deserialize, Serialize};

/// Default output side length in pixels.
pub const DEFAULT_GRID_SIZE: usize = 512;

/// Largest accepted output side length.
pub const MAX_GRID_SIZE: usize = 8192;

/// Configuration for polar-to-Cartesian resampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleConfig {
    /// Output grid side length (the grid is square).
    pub grid_size: usize,

    /// Fill output rows on the rayon pool.
    pub parallel: bool,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            parallel: true,
        }
    }
}

impl ResampleConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RADAR_GRID_SIZE") {
            if let Ok(size) = val.parse() {
                config.grid_size = size;
            }
        }

        if let Ok(val) = std::env::var("RADAR_GRID_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_size < 2 {
            return Err("grid_size must be >= 2".to_string());
        }

        if self.grid_size > MAX_GRID_SIZE {
            return Err(format!("grid_size must be <= {}", MAX_GRID_SIZE));
        }

        Ok(())
    }

    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ResampleConfig::default();
        assert_eq!(config.grid_size, 512);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_size_bounds() {
        assert!(ResampleConfig::default().with_grid_size(1).validate().is_err());
        assert!(ResampleConfig::default().with_grid_size(2).validate().is_ok());
        assert!(ResampleConfig::default().with_grid_size(8192).validate().is_ok());
        assert!(ResampleConfig::default().with_grid_size(8193).validate().is_err());
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("RADAR_GRID_SIZE", "256");
        std::env::set_var("RADAR_GRID_PARALLEL", "0");

        let config = ResampleConfig::from_env();
        assert_eq!(config.grid_size, 256);
        assert!(!config.parallel);

        std::env::set_var("RADAR_GRID_SIZE", "huge");
        assert_eq!(ResampleConfig::from_env().grid_size, DEFAULT_GRID_SIZE);

        std::env::remove_var("RADAR_GRID_SIZE");
        std::env::remove_var("RADAR_GRID_PARALLEL");
    }
}
