//! Build outputs of one compilation pass.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ripple_common::TargetId;

use crate::artifact::ClassArtifact;
use crate::error::ArtifactLoadError;

/// Directory holding module mapping files inside an output directory.
pub const MODULE_MAPPING_DIR: &str = "META-INF";

/// Extension of module mapping files.
pub const MODULE_MAPPING_EXTENSION: &str = "module_map";

/// Extension of compiled class files.
pub const CLASS_EXTENSION: &str = "class";

/// An output file with the target and sources that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    /// Target owning the output.
    pub target: TargetId,
    /// Sources that produced the output.
    pub source_files: BTreeSet<PathBuf>,
    /// The output file.
    pub output_file: PathBuf,
}

/// A compiled class output whose metadata is parsed on first access.
#[derive(Debug)]
pub struct GeneratedClass {
    output: GeneratedOutput,
    artifact: OnceCell<ClassArtifact>,
}

impl GeneratedClass {
    /// Wraps a class output. Nothing is read until [`GeneratedClass::artifact`].
    pub fn new(output: GeneratedOutput) -> Self {
        Self {
            output,
            artifact: OnceCell::new(),
        }
    }

    /// Target, sources, and path of the class file.
    pub fn output(&self) -> &GeneratedOutput {
        &self.output
    }

    /// Returns the parsed artifact, loading it on first call.
    ///
    /// A load failure is not memoized; a later call reads the file again.
    pub fn artifact(&self) -> Result<&ClassArtifact, ArtifactLoadError> {
        if let Some(artifact) = self.artifact.get() {
            return Ok(artifact);
        }
        let loaded = ClassArtifact::load(&self.output.output_file)?;
        Ok(self.artifact.get_or_init(|| loaded))
    }
}

/// One output of a compilation pass.
#[derive(Debug)]
pub enum GeneratedFile {
    /// A compiled class; participates in member-level diffing.
    Class(GeneratedClass),
    /// A cross-module mapping file; recorded in the file tables only.
    ModuleMapping(GeneratedOutput),
    /// Any other resource; not cached.
    Other(GeneratedOutput),
}

impl GeneratedFile {
    /// Classifies an output by its path.
    pub fn new(target: TargetId, source_files: BTreeSet<PathBuf>, output_file: PathBuf) -> Self {
        let output = GeneratedOutput {
            target,
            source_files,
            output_file,
        };
        if is_class_file(&output.output_file) {
            GeneratedFile::Class(GeneratedClass::new(output))
        } else if is_module_mapping_file(&output.output_file) {
            GeneratedFile::ModuleMapping(output)
        } else {
            GeneratedFile::Other(output)
        }
    }

    /// Target, sources, and path of the output.
    pub fn output(&self) -> &GeneratedOutput {
        match self {
            GeneratedFile::Class(class) => class.output(),
            GeneratedFile::ModuleMapping(output) | GeneratedFile::Other(output) => output,
        }
    }

    /// Target owning the output.
    pub fn target(&self) -> &TargetId {
        &self.output().target
    }
}

/// Returns `true` for `*.class` files.
pub fn is_class_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(CLASS_EXTENSION))
}

/// Returns `true` for `META-INF/*.module_map` files.
pub fn is_module_mapping_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(MODULE_MAPPING_EXTENSION))
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|dir| dir == MODULE_MAPPING_DIR)
}
