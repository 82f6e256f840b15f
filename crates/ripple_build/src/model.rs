//! The build coordinator's description of the targets to compile.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use ripple_cache::TargetGraph;
use ripple_common::TargetId;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// One compilation target with its sources, output, and dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTarget {
    /// Stable identity.
    pub id: TargetId,
    /// Directory receiving the compiled outputs.
    pub output_dir: PathBuf,
    /// All sources of the target.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Source roots, searched in order for Java source roots.
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,
    /// External classpath entries.
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    /// Output directories whose internal declarations are visible.
    #[serde(default)]
    pub friend_dirs: Vec<PathBuf>,
    /// Targets this one depends on.
    #[serde(default)]
    pub dependencies: Vec<TargetId>,
}

impl ModuleTarget {
    /// Creates a target with no sources or dependencies.
    pub fn new(id: TargetId, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            output_dir: output_dir.into(),
            sources: Vec::new(),
            source_roots: Vec::new(),
            classpath: Vec::new(),
            friend_dirs: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Adds a source file.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Adds a source root.
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_roots.push(root.into());
        self
    }

    /// Adds a dependency.
    pub fn with_dependency(mut self, dependency: TargetId) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// The targets of a build, indexed by identity and by source file.
#[derive(Debug, Clone)]
pub struct BuildModel {
    targets: BTreeMap<TargetId, ModuleTarget>,
    owners: HashMap<PathBuf, TargetId>,
}

impl BuildModel {
    /// Indexes `targets`.
    ///
    /// Fails if two targets share an identity or a source file.
    pub fn new(targets: impl IntoIterator<Item = ModuleTarget>) -> Result<Self, BuildError> {
        let mut by_id = BTreeMap::new();
        let mut owners = HashMap::new();
        for target in targets {
            for source in &target.sources {
                if let Some(other) = owners.insert(source.clone(), target.id.clone()) {
                    return Err(BuildError::InvalidModel {
                        reason: format!(
                            "{} belongs to both {other} and {}",
                            source.display(),
                            target.id
                        ),
                    });
                }
            }
            let id = target.id.clone();
            if by_id.insert(id.clone(), target).is_some() {
                return Err(BuildError::InvalidModel {
                    reason: format!("target {id} is declared twice"),
                });
            }
        }
        Ok(Self {
            targets: by_id,
            owners,
        })
    }

    /// Target with identity `id`.
    pub fn get(&self, id: &TargetId) -> Option<&ModuleTarget> {
        self.targets.get(id)
    }

    /// All targets, in identity order.
    pub fn targets(&self) -> impl Iterator<Item = &ModuleTarget> {
        self.targets.values()
    }

    /// All target identities, in identity order.
    pub fn ids(&self) -> Vec<TargetId> {
        self.targets.keys().cloned().collect()
    }

    /// Declared dependencies of `id`.
    pub fn dependencies_of(&self, id: &TargetId) -> Vec<TargetId> {
        self.targets
            .get(id)
            .map(|t| t.dependencies.clone())
            .unwrap_or_default()
    }

    /// Target owning `source`.
    pub fn owner_of(&self, source: &Path) -> Option<&TargetId> {
        self.owners.get(source)
    }

    /// Dependency graph over all targets.
    pub fn graph(&self) -> TargetGraph<TargetId> {
        TargetGraph::build(self.ids(), |id| self.dependencies_of(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> ModuleTarget {
        ModuleTarget::new(TargetId::production("core"), "out/core").with_source("core/A.kt")
    }

    #[test]
    fn indexes_sources_by_owner() {
        let app = ModuleTarget::new(TargetId::production("app"), "out/app")
            .with_source("app/Main.kt")
            .with_dependency(TargetId::production("core"));
        let model = BuildModel::new([core(), app]).unwrap();

        assert_eq!(
            model.owner_of(Path::new("app/Main.kt")),
            Some(&TargetId::production("app"))
        );
        assert_eq!(
            model.dependencies_of(&TargetId::production("app")),
            vec![TargetId::production("core")]
        );
        assert!(model.owner_of(Path::new("elsewhere.kt")).is_none());
    }

    #[test]
    fn duplicate_target_rejected() {
        let again = ModuleTarget::new(TargetId::production("core"), "out/other");
        assert!(matches!(
            BuildModel::new([core(), again]),
            Err(BuildError::InvalidModel { .. })
        ));
    }

    #[test]
    fn shared_source_rejected() {
        let test = ModuleTarget::new(TargetId::test("core"), "out/core-test").with_source("core/A.kt");
        assert!(matches!(
            BuildModel::new([core(), test]),
            Err(BuildError::InvalidModel { .. })
        ));
    }

    #[test]
    fn graph_follows_declared_dependencies() {
        let app = ModuleTarget::new(TargetId::production("app"), "out/app")
            .with_dependency(TargetId::production("core"))
            .with_dependency(TargetId::production("external"));
        let model = BuildModel::new([core(), app]).unwrap();
        let graph = model.graph();
        assert_eq!(
            graph.dependents_of(&TargetId::production("core")),
            vec![&TargetId::production("app")]
        );
        assert!(!graph.contains(&TargetId::production("external")));
    }

    #[test]
    fn deserializes_with_defaults() {
        let target: ModuleTarget = serde_json::from_str(
            r#"{"id":{"name":"core","kind":"Production"},"output_dir":"out/core"}"#,
        )
        .unwrap();
        assert!(target.sources.is_empty());
        assert!(target.dependencies.is_empty());
    }
}
