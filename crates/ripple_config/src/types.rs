//! Configuration types deserialized from `ripple.toml`.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default number of recompilation rounds before falling back to a full rebuild.
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".ripple-cache";

/// The top-level configuration parsed from `ripple.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RippleConfig {
    /// Incremental compilation settings.
    #[serde(default)]
    pub incremental: IncrementalConfig,
    /// Persistent cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// How much of the incremental machinery is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementalMode {
    /// Every build is a full build; the cache-update step must not run.
    Disabled,
    /// Artifact caches are maintained, but dirty files are propagated per
    /// target instead of through the lookup index.
    Enabled,
    /// Artifact caches plus lookup tracking for per-symbol propagation.
    #[default]
    Experimental,
}

impl IncrementalMode {
    /// Returns `true` when artifact caches are maintained.
    pub fn is_enabled(self) -> bool {
        !matches!(self, IncrementalMode::Disabled)
    }

    /// Returns `true` when lookups are recorded and indexed.
    pub fn tracks_lookups(self) -> bool {
        matches!(self, IncrementalMode::Experimental)
    }
}

impl FromStr for IncrementalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "false" => Ok(IncrementalMode::Disabled),
            "enabled" | "on" | "true" => Ok(IncrementalMode::Enabled),
            "experimental" => Ok(IncrementalMode::Experimental),
            _ => Err(ConfigError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for IncrementalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IncrementalMode::Disabled => "disabled",
            IncrementalMode::Enabled => "enabled",
            IncrementalMode::Experimental => "experimental",
        };
        f.write_str(s)
    }
}

/// Settings of the incremental recompilation loop.
#[derive(Debug, Clone, Deserialize)]
pub struct IncrementalConfig {
    /// Active incremental mode.
    #[serde(default)]
    pub mode: IncrementalMode,
    /// Maximum number of incremental rounds before a full rebuild.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            mode: IncrementalMode::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

/// Location of the persistent caches.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache root directory, relative to the project root unless absolute.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl RippleConfig {
    /// Resolves the cache directory against the project root.
    pub fn cache_dir(&self, project_root: &std::path::Path) -> PathBuf {
        if self.cache.dir.is_absolute() {
            self.cache.dir.clone()
        } else {
            project_root.join(&self.cache.dir)
        }
    }
}
