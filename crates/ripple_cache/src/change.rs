//! What changed between two versions of a compiled class, and the
//! aggregation of those changes over a compilation pass.

use std::collections::{BTreeMap, BTreeSet};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use ripple_common::FqName;

/// Delta between two versions of one class's public surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeInfo {
    /// The surface is unchanged (body-only edits, or identical bytes).
    NoChanges,
    /// Members with these names were added, removed, or changed signature
    /// in `scope`.
    MembersChanged {
        /// Owner of the members: a class, or a package for facades.
        scope: FqName,
        /// Simple names of the affected members.
        names: BTreeSet<String>,
    },
    /// The class header (kind or supertypes) changed. Lookups by member name
    /// cannot bound the impact, so consumers rebuild at target granularity.
    ProtoChanged {
        /// Owner scope of the class's members.
        scope: FqName,
    },
}

impl ChangeInfo {
    /// Builds a `MembersChanged`, or `NoChanges` if `names` is empty.
    pub fn members_changed<I, S>(scope: FqName, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            ChangeInfo::NoChanges
        } else {
            ChangeInfo::MembersChanged { scope, names }
        }
    }

    /// Returns `true` for [`ChangeInfo::NoChanges`].
    pub fn is_no_changes(&self) -> bool {
        matches!(self, ChangeInfo::NoChanges)
    }
}

/// Accumulated changes of one compilation pass.
///
/// Member changes are merged per scope by set union and header changes are
/// a set of scopes, so `+` is commutative and associative with
/// [`CompilationResult::NO_CHANGES`] as identity: the order in which
/// artifacts are processed never affects the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    members: BTreeMap<FqName, BTreeSet<String>>,
    proto: BTreeSet<FqName>,
}

impl CompilationResult {
    /// The identity element.
    pub const NO_CHANGES: CompilationResult = CompilationResult {
        members: BTreeMap::new(),
        proto: BTreeSet::new(),
    };

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.proto.is_empty()
    }

    /// Returns `true` if any class header changed.
    pub fn proto_changed(&self) -> bool {
        !self.proto.is_empty()
    }

    /// Scopes whose class header changed.
    pub fn proto_changed_scopes(&self) -> impl Iterator<Item = &FqName> {
        self.proto.iter()
    }

    /// Changed member names per scope.
    pub fn changed_members(&self) -> impl Iterator<Item = (&FqName, &BTreeSet<String>)> {
        self.members.iter()
    }

    /// The individual changes, in scope order: member changes first, then
    /// header changes. Never yields `NoChanges`.
    pub fn changes(&self) -> impl Iterator<Item = ChangeInfo> + '_ {
        let members = self
            .members
            .iter()
            .map(|(scope, names)| ChangeInfo::MembersChanged {
                scope: scope.clone(),
                names: names.clone(),
            });
        let proto = self
            .proto
            .iter()
            .map(|scope| ChangeInfo::ProtoChanged {
                scope: scope.clone(),
            });
        members.chain(proto)
    }

    fn merge(&mut self, change: ChangeInfo) {
        match change {
            ChangeInfo::NoChanges => {}
            ChangeInfo::MembersChanged { scope, names } => {
                if !names.is_empty() {
                    self.members.entry(scope).or_default().extend(names);
                }
            }
            ChangeInfo::ProtoChanged { scope } => {
                self.proto.insert(scope);
            }
        }
    }
}

impl From<ChangeInfo> for CompilationResult {
    fn from(change: ChangeInfo) -> Self {
        let mut result = CompilationResult::NO_CHANGES;
        result.merge(change);
        result
    }
}

impl AddAssign<ChangeInfo> for CompilationResult {
    fn add_assign(&mut self, change: ChangeInfo) {
        self.merge(change);
    }
}

impl AddAssign for CompilationResult {
    fn add_assign(&mut self, other: CompilationResult) {
        for (scope, names) in other.members {
            self.members.entry(scope).or_default().extend(names);
        }
        self.proto.extend(other.proto);
    }
}

impl Add<ChangeInfo> for CompilationResult {
    type Output = CompilationResult;

    fn add(mut self, change: ChangeInfo) -> CompilationResult {
        self += change;
        self
    }
}

impl Add for CompilationResult {
    type Output = CompilationResult;

    fn add(mut self, other: CompilationResult) -> CompilationResult {
        self += other;
        self
    }
}

impl Add for ChangeInfo {
    type Output = CompilationResult;

    fn add(self, other: ChangeInfo) -> CompilationResult {
        CompilationResult::from(self) + other
    }
}

impl Sum<ChangeInfo> for CompilationResult {
    fn sum<I: Iterator<Item = ChangeInfo>>(iter: I) -> Self {
        iter.fold(CompilationResult::NO_CHANGES, |acc, next| acc + next)
    }
}

impl Sum for CompilationResult {
    fn sum<I: Iterator<Item = CompilationResult>>(iter: I) -> Self {
        iter.fold(CompilationResult::NO_CHANGES, |acc, next| acc + next)
    }
}
