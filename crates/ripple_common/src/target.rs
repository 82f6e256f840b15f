//! Compilation targets and their stable identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Whether a target holds production or test sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Production sources.
    Production,
    /// Test sources.
    Test,
}

/// A stable, serializable identity for a compilation target.
///
/// Caches are keyed by `TargetId` rather than by the build coordinator's
/// in-memory target objects, so persisted state survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId {
    /// Module name.
    pub name: String,
    /// Production or test variant.
    pub kind: TargetKind,
}

impl TargetId {
    /// Identity of a production target.
    pub fn production(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Production,
        }
    }

    /// Identity of a test target.
    pub fn test(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Test,
        }
    }

    /// Returns a name safe to use as a single directory component.
    pub fn dir_name(&self) -> String {
        let base: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        match self.kind {
            TargetKind::Production => base,
            TargetKind::Test => format!("{base}-test"),
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TargetKind::Production => write!(f, "{}", self.name),
            TargetKind::Test => write!(f, "{} (test)", self.name),
        }
    }
}

/// A compilation target as seen by the build coordinator.
///
/// The coordinator owns its target values; the incremental core only needs
/// equality, hashing, and a way to obtain the stable identity.
pub trait BuildTarget: Clone + Eq + Hash {
    /// Returns the stable identity of this target.
    fn target_id(&self) -> TargetId;
}

impl BuildTarget for TargetId {
    fn target_id(&self) -> TargetId {
        self.clone()
    }
}
