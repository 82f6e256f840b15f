//! Fully-qualified, dot-separated scope names (`com.example.Widget`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully-qualified name of a package or class.
///
/// The empty name is the root package. Segments are separated by `.`; the
/// name is stored as written and never normalized beyond that.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FqName(String);

impl FqName {
    /// The root package.
    pub const ROOT: FqName = FqName(String::new());

    /// Creates a name from its dotted string form.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the dotted string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the root package.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the enclosing name, or the root for a single-segment name.
    ///
    /// The root is its own parent.
    pub fn parent(&self) -> FqName {
        match self.0.rfind('.') {
            Some(idx) => FqName(self.0[..idx].to_string()),
            None => FqName::ROOT,
        }
    }

    /// Returns the last segment.
    pub fn short_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Appends a segment.
    pub fn child(&self, segment: &str) -> FqName {
        if self.is_root() {
            FqName(segment.to_string())
        } else {
            FqName(format!("{}.{segment}", self.0))
        }
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl fmt::Debug for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FqName({})", self.0)
    }
}

impl From<&str> for FqName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
