//! Simulator options.

use serde::{Deserialize, Serialize};

/// The default limit on passes per settle.
pub const DEFAULT_MAX_PASSES: usize = 100;

/// Options controlling how circuits are settled.
///
/// ```toml
/// max_passes = 100
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// The most passes a single settle may take before giving up.
    ///
    /// Values below 1 are treated as 1.
    pub max_passes: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl SimOptions {
    /// Parses options from TOML. Missing keys take their defaults.
    pub fn from_toml(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }
}
