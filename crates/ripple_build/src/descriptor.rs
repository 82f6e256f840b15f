//! Module descriptors handed to the compiler.
//!
//! Each compiler invocation receives a JSON module file listing, per
//! target, the sources to compile, the Java source roots, the classpath,
//! and the friend directories. The file only lives for the invocation.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ripple_common::TargetKind;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::model::{BuildModel, ModuleTarget};

/// Compiler input for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Target name.
    pub name: String,
    /// Whether the target holds test sources.
    pub is_test: bool,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Sources to compile in this invocation.
    pub sources: Vec<PathBuf>,
    /// Roots of the target's Java sources.
    pub java_source_roots: Vec<PathBuf>,
    /// Classpath, including the outputs of dependency targets.
    pub classpath: Vec<PathBuf>,
    /// Directories whose internal declarations are visible.
    pub friend_dirs: Vec<PathBuf>,
    /// Entries the compiler must not put on the classpath.
    pub excluded_from_classpath: Vec<PathBuf>,
}

impl ModuleDescriptor {
    /// Describes `target` compiling `sources`.
    ///
    /// The target's own output directory is excluded from its classpath so
    /// stale classes of the sources being recompiled are never resolved.
    pub fn for_target(model: &BuildModel, target: &ModuleTarget, sources: Vec<PathBuf>) -> Self {
        let mut classpath = target.classpath.clone();
        for dependency in &target.dependencies {
            if let Some(dep) = model.get(dependency) {
                classpath.push(dep.output_dir.clone());
            }
        }
        Self {
            name: target.id.name.clone(),
            is_test: target.id.kind == TargetKind::Test,
            output_dir: target.output_dir.clone(),
            sources,
            java_source_roots: java_source_roots(&target.sources, &target.source_roots),
            classpath,
            friend_dirs: target.friend_dirs.clone(),
            excluded_from_classpath: vec![target.output_dir.clone()],
        }
    }
}

/// For every `.java` source, the first of `roots` containing it; each root
/// is listed once, in order of first use.
pub fn java_source_roots(sources: &[PathBuf], roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    for source in sources.iter().filter(|s| is_java_file(s)) {
        if let Some(root) = roots.iter().find(|root| source.starts_with(root)) {
            if !found.contains(root) {
                found.push(root.clone());
            }
        }
    }
    found
}

fn is_java_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("java"))
}

/// A module file on disk, deleted when dropped.
#[derive(Debug)]
pub struct ModuleFile {
    path: PathBuf,
    descriptors: Vec<ModuleDescriptor>,
}

impl ModuleFile {
    /// Writes `descriptors` to `<dir>/<name>.modules.json`.
    pub fn write(dir: &Path, name: &str, descriptors: Vec<ModuleDescriptor>) -> Result<Self, BuildError> {
        let file_name: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = dir.join(format!("{file_name}.modules.json"));
        let json = serde_json::to_string_pretty(&descriptors).map_err(|e| BuildError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, json))
            .map_err(|e| BuildError::ModuleFile {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self { path, descriptors })
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The descriptors written.
    pub fn descriptors(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }
}

impl Drop for ModuleFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
