//! Compiled class artifacts and the metadata section they must carry.
//!
//! A class file is cache-eligible only when it starts with a framed metadata
//! section (see [`crate::frame`]) describing the class: its binary version,
//! kind, name, supertypes, and member signatures. Code bytes follow the
//! metadata inside the same frame and are opaque to the cache.

use std::fmt;
use std::path::{Path, PathBuf};

use ripple_common::{ContentHash, FqName};
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactLoadError, CacheError};
use crate::frame::{decode_frame, encode_frame, FrameError};

/// Magic bytes identifying a class metadata section.
const CLASS_MAGIC: [u8; 4] = *b"RPLC";

/// Current metadata section format. Increment on breaking layout changes.
const CLASS_FORMAT_VERSION: u32 = 1;

/// Version of the compiled-class binary interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BinaryVersion {
    /// Incompatible changes.
    pub major: u32,
    /// Backwards-compatible additions.
    pub minor: u32,
    /// Fixes.
    pub patch: u32,
}

impl BinaryVersion {
    /// The version this tool writes and reads.
    pub const CURRENT: BinaryVersion = BinaryVersion::new(1, 2, 0);

    /// Creates a version triple.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if artifacts of this version can be read by a tool at
    /// [`BinaryVersion::CURRENT`]: same major, minor not newer.
    pub fn is_compatible(&self) -> bool {
        self.major == Self::CURRENT.major && self.minor <= Self::CURRENT.minor
    }
}

impl fmt::Display for BinaryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What a compiled class represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    /// An ordinary class, interface, or object.
    Class,
    /// Top-level declarations of a single source file.
    FileFacade,
    /// Top-level declarations merged from several source files.
    MultifileFacade,
}

impl ClassKind {
    /// Returns `true` for facades, whose members live in the package scope.
    pub fn is_facade(self) -> bool {
        matches!(self, ClassKind::FileFacade | ClassKind::MultifileFacade)
    }

    fn as_str(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::FileFacade => "file-facade",
            ClassKind::MultifileFacade => "multifile-facade",
        }
    }
}

/// Kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// A function or method.
    Function,
    /// A property or field.
    Property,
    /// A constructor.
    Constructor,
    /// A nested classifier.
    Classifier,
}

/// One member of a class's public surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberSignature {
    /// Simple name; overloads share it.
    pub name: String,
    /// Member kind.
    pub kind: MemberKind,
    /// Type descriptor, e.g. `(I)Ljava/lang/String;`.
    pub descriptor: String,
}

impl MemberSignature {
    /// Creates a member signature.
    pub fn new(name: impl Into<String>, kind: MemberKind, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            descriptor: descriptor.into(),
        }
    }
}

/// Metadata section of a compiled class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Binary interface version of the producing compiler.
    pub binary_version: BinaryVersion,
    /// What the class represents.
    pub kind: ClassKind,
    /// Fully-qualified class name.
    pub fq_name: FqName,
    /// Direct supertypes, in declaration order.
    pub supertypes: Vec<FqName>,
    /// Public members.
    pub members: Vec<MemberSignature>,
}

impl ClassMetadata {
    /// Metadata for an ordinary class at the current binary version.
    pub fn class(fq_name: impl Into<FqName>) -> Self {
        Self {
            binary_version: BinaryVersion::CURRENT,
            kind: ClassKind::Class,
            fq_name: fq_name.into(),
            supertypes: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Metadata for a file facade at the current binary version.
    pub fn file_facade(fq_name: impl Into<FqName>) -> Self {
        Self {
            kind: ClassKind::FileFacade,
            ..Self::class(fq_name)
        }
    }

    /// Adds a member.
    pub fn with_member(mut self, member: MemberSignature) -> Self {
        self.members.push(member);
        self
    }

    /// Adds a supertype.
    pub fn with_supertype(mut self, supertype: impl Into<FqName>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Returns the scope that owns this class's members.
    ///
    /// Facade members are declared at top level, so they belong to the
    /// enclosing package; class members belong to the class itself.
    pub fn member_scope(&self) -> FqName {
        if self.kind.is_facade() {
            self.fq_name.parent()
        } else {
            self.fq_name.clone()
        }
    }

    /// Fingerprint of the class header (kind and supertypes).
    pub fn header_hash(&self) -> ContentHash {
        let mut parts: Vec<&[u8]> = vec![self.kind.as_str().as_bytes(), self.fq_name.as_str().as_bytes()];
        parts.extend(self.supertypes.iter().map(|s| s.as_str().as_bytes()));
        ContentHash::from_parts(parts)
    }
}

/// A class artifact whose metadata has been parsed.
#[derive(Debug, Clone)]
pub struct ClassArtifact {
    /// Parsed metadata section.
    pub metadata: ClassMetadata,
    /// Hash of the complete artifact bytes.
    pub content_hash: ContentHash,
}

impl ClassArtifact {
    /// Reads and parses the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        let raw = std::fs::read(path).map_err(|e| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &raw)
    }

    /// Parses artifact bytes; `path` is used for error reporting only.
    pub fn parse(path: &Path, raw: &[u8]) -> Result<Self, ArtifactLoadError> {
        let missing = |reason: String| ArtifactLoadError::MissingMetadata {
            path: path.to_path_buf(),
            reason,
        };
        let corrupt = |reason: String| ArtifactLoadError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let (_, payload) =
            decode_frame(raw, CLASS_MAGIC, CLASS_FORMAT_VERSION).map_err(|e| match e {
                FrameError::Truncated | FrameError::BadHeader(_) | FrameError::BadMagic(_) => {
                    missing(e.to_string())
                }
                FrameError::VersionMismatch { .. } => {
                    missing(format!("unrecognized metadata layout: {e}"))
                }
                FrameError::ChecksumMismatch { .. } => corrupt(e.to_string()),
            })?;

        let (metadata, _code_offset): (ClassMetadata, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| corrupt(e.to_string()))?;

        if !metadata.binary_version.is_compatible() {
            return Err(ArtifactLoadError::IncompatibleVersion {
                path: path.to_path_buf(),
                found: metadata.binary_version,
                expected: BinaryVersion::CURRENT,
            });
        }

        Ok(Self {
            metadata,
            content_hash: ContentHash::from_bytes(raw),
        })
    }

    /// Encodes a class artifact: framed metadata followed by `code`.
    ///
    /// This is the layout code generators must emit for their class files
    /// to participate in incremental compilation.
    pub fn encode(
        metadata: &ClassMetadata,
        code: &[u8],
        tool_version: &str,
    ) -> Result<Vec<u8>, CacheError> {
        let mut payload = bincode::serde::encode_to_vec(metadata, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        payload.extend_from_slice(code);
        encode_frame(CLASS_MAGIC, CLASS_FORMAT_VERSION, tool_version, &payload)
    }

    /// Encodes and writes a class artifact to `path`.
    pub fn write(
        path: &Path,
        metadata: &ClassMetadata,
        code: &[u8],
        tool_version: &str,
    ) -> Result<(), CacheError> {
        let bytes = Self::encode(metadata, code, tool_version)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        std::fs::write(path, bytes).map_err(|e| CacheError::io(PathBuf::from(path), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ClassMetadata {
        ClassMetadata::class("ui.Widget")
            .with_supertype("ui.View")
            .with_member(MemberSignature::new("draw", MemberKind::Function, "()V"))
            .with_member(MemberSignature::new("width", MemberKind::Property, "I"))
    }

    #[test]
    fn write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui").join("Widget.class");
        ClassArtifact::write(&path, &widget(), b"\xca\xfe\xba\xbe", "0.1.0").unwrap();

        let artifact = ClassArtifact::load(&path).unwrap();
        assert_eq!(artifact.metadata, widget());
    }

    #[test]
    fn code_bytes_change_content_hash_only() {
        let a = ClassArtifact::encode(&widget(), b"code v1", "0.1.0").unwrap();
        let b = ClassArtifact::encode(&widget(), b"code v2", "0.1.0").unwrap();
        let pa = ClassArtifact::parse(Path::new("A.class"), &a).unwrap();
        let pb = ClassArtifact::parse(Path::new("A.class"), &b).unwrap();
        assert_eq!(pa.metadata, pb.metadata);
        assert_ne!(pa.content_hash, pb.content_hash);
    }

    #[test]
    fn plain_class_file_has_no_metadata() {
        let err = ClassArtifact::parse(Path::new("Plain.class"), b"\xca\xfe\xba\xbe\0\0\0\x34")
            .unwrap_err();
        assert!(matches!(err, ArtifactLoadError::MissingMetadata { .. }));
    }

    #[test]
    fn newer_major_version_rejected() {
        let mut meta = widget();
        meta.binary_version = BinaryVersion::new(2, 0, 0);
        let bytes = ClassArtifact::encode(&meta, b"", "0.1.0").unwrap();
        let err = ClassArtifact::parse(Path::new("W.class"), &bytes).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::IncompatibleVersion { .. }));
    }

    #[test]
    fn older_minor_version_accepted() {
        let mut meta = widget();
        meta.binary_version = BinaryVersion::new(1, 0, 7);
        let bytes = ClassArtifact::encode(&meta, b"", "0.1.0").unwrap();
        assert!(ClassArtifact::parse(Path::new("W.class"), &bytes).is_ok());
    }

    #[test]
    fn newer_minor_version_rejected() {
        let meta = ClassMetadata {
            binary_version: BinaryVersion::new(1, BinaryVersion::CURRENT.minor + 1, 0),
            ..widget()
        };
        assert!(!meta.binary_version.is_compatible());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClassArtifact::load(Path::new("/nonexistent/A.class")).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Io { .. }));
    }

    #[test]
    fn facade_members_belong_to_package() {
        let facade = ClassMetadata::file_facade("util.StringsKt");
        assert_eq!(facade.member_scope(), FqName::new("util"));
        assert_eq!(widget().member_scope(), FqName::new("ui.Widget"));
    }

    #[test]
    fn header_hash_tracks_supertypes() {
        let a = widget();
        let b = widget().with_supertype("ui.Clickable");
        assert_ne!(a.header_hash(), b.header_hash());
        let c = ClassMetadata {
            members: Vec::new(),
            ..widget()
        };
        assert_eq!(a.header_hash(), c.header_hash());
    }

    #[test]
    fn version_display() {
        assert_eq!(BinaryVersion::new(1, 2, 3).to_string(), "1.2.3");
    }
}
