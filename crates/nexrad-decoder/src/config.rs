//! Configuration for the Archive II decoder.

use serde::{Deserialize, Serialize};

/// Largest message the scanner accepts before treating a header as corrupt.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 20_000;

/// Largest gate count accepted in a moment block.
pub const DEFAULT_MAX_GATES: u16 = 2_000;

/// Configuration for the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Decompress and scan segments on the rayon pool.
    ///
    /// Output is identical to the sequential path; rays are merged back
    /// in file order.
    pub parallel_segments: bool,

    /// Upper bound on a framed message length in bytes.
    pub max_message_bytes: usize,

    /// Upper bound on gates per moment block.
    pub max_gates: u16,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            parallel_segments: false,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            max_gates: DEFAULT_MAX_GATES,
        }
    }
}

impl DecoderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NEXRAD_PARALLEL_SEGMENTS") {
            config.parallel_segments = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("NEXRAD_MAX_MESSAGE_BYTES") {
            if let Ok(size) = val.parse() {
                config.max_message_bytes = size;
            }
        }

        if let Ok(val) = std::env::var("NEXRAD_MAX_GATES") {
            if let Ok(gates) = val.parse() {
                config.max_gates = gates;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        // A message must at least hold its own 16-byte header.
        if self.max_message_bytes < 16 {
            return Err("max_message_bytes must be >= 16".to_string());
        }

        if self.max_message_bytes > u16::MAX as usize * 2 {
            return Err(format!(
                "max_message_bytes must be <= {}",
                u16::MAX as usize * 2
            ));
        }

        if self.max_gates == 0 {
            return Err("max_gates must be > 0".to_string());
        }

        Ok(())
    }
}
