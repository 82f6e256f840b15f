//! The unit of "what was looked up".

use std::fmt;

use ripple_common::FqName;
use serde::{Deserialize, Serialize};

/// A simple name looked up in a containing scope.
///
/// For a member `f` of class `a.A` the scope is `a.A`; for a top-level
/// declaration it is the package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LookupSymbol {
    /// Simple name.
    pub name: String,
    /// Scope the name was resolved in.
    pub scope: FqName,
}

impl LookupSymbol {
    /// Creates a lookup symbol.
    pub fn new(name: impl Into<String>, scope: impl Into<FqName>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Display for LookupSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.name, self.scope)
    }
}
