//! Detector configuration
//!
//! Exactly one tunable: whether stores of a value identical to what is
//! already in memory are treated as benign. Read once at construction,
//! immutable afterwards.

/// Environment variable that disables the uniform-write filter when present
pub const UNIFORM_WRITES_ENV: &str = "OCLGRIND_UNIFORM_WRITES";

/// Immutable detector options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Treat a store whose value equals the current memory content as benign.
    /// Defaults to `true`; setting [`UNIFORM_WRITES_ENV`] turns it off.
    pub allow_uniform_writes: bool,
}

impl DetectorConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self {
            allow_uniform_writes: std::env::var_os(UNIFORM_WRITES_ENV).is_none(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            allow_uniform_writes: true,
        }
    }
}
