//! Stored member surface of a compiled class and the diff between two of them.

use std::collections::{BTreeMap, BTreeSet};

use ripple_common::{ContentHash, FqName};
use serde::{Deserialize, Serialize};

use crate::artifact::{ClassArtifact, ClassKind};
use crate::change::ChangeInfo;

/// What the cache remembers about one class output between builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSnapshot {
    /// Fully-qualified class name.
    pub fq_name: FqName,
    /// Class kind at the time of the snapshot.
    pub kind: ClassKind,
    /// Fingerprint of kind and supertypes.
    pub header_hash: ContentHash,
    /// Hash of the complete artifact bytes.
    pub artifact_hash: ContentHash,
    /// Member name to the set of its signatures (one per overload).
    pub members: BTreeMap<String, BTreeSet<String>>,
}

impl ClassSnapshot {
    /// Captures the surface of a loaded artifact.
    pub fn from_artifact(artifact: &ClassArtifact) -> Self {
        let meta = &artifact.metadata;
        let mut members: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for member in &meta.members {
            members
                .entry(member.name.clone())
                .or_default()
                .insert(format!("{:?} {}", member.kind, member.descriptor));
        }
        Self {
            fq_name: meta.fq_name.clone(),
            kind: meta.kind,
            header_hash: meta.header_hash(),
            artifact_hash: artifact.content_hash,
            members,
        }
    }

    /// Scope owning the members (the package for facades).
    pub fn member_scope(&self) -> FqName {
        if self.kind.is_facade() {
            self.fq_name.parent()
        } else {
            self.fq_name.clone()
        }
    }

    /// Names of all members.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

/// Computes the change between the stored and the new snapshot of one output.
///
/// `None` on either side stands for "no class": a class appearing or
/// disappearing changes every one of its member names.
pub fn diff(old: Option<&ClassSnapshot>, new: Option<&ClassSnapshot>) -> ChangeInfo {
    match (old, new) {
        (None, None) => ChangeInfo::NoChanges,
        (None, Some(snapshot)) | (Some(snapshot), None) => {
            ChangeInfo::members_changed(snapshot.member_scope(), snapshot.member_names())
        }
        (Some(old), Some(new)) => {
            if old.artifact_hash == new.artifact_hash {
                return ChangeInfo::NoChanges;
            }
            if old.header_hash != new.header_hash || old.member_scope() != new.member_scope() {
                return ChangeInfo::ProtoChanged {
                    scope: new.member_scope(),
                };
            }
            let changed = old
                .members
                .keys()
                .chain(new.members.keys())
                .filter(|name| old.members.get(*name) != new.members.get(*name))
                .cloned();
            ChangeInfo::members_changed(new.member_scope(), changed)
        }
    }
}

/// Change of the class name itself when a class appears or disappears.
///
/// References to a class by name are recorded as lookups of its simple name
/// in the enclosing package, so they are reported there. Facades are not
/// referenced by name and yield [`ChangeInfo::NoChanges`], as does a class
/// present on both sides.
pub fn class_name_change(old: Option<&ClassSnapshot>, new: Option<&ClassSnapshot>) -> ChangeInfo {
    match (old, new) {
        (None, Some(snapshot)) | (Some(snapshot), None) if !snapshot.kind.is_facade() => {
            ChangeInfo::members_changed(snapshot.fq_name.parent(), [snapshot.fq_name.short_name()])
        }
        _ => ChangeInfo::NoChanges,
    }
}
