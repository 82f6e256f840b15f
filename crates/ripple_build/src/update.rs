//! The cache-update step that follows every compiler invocation.

use ripple_cache::{CompilationResult, GeneratedFile, IncrementalCache, IncrementalCaches};
use ripple_common::{InternalError, TargetId};
use ripple_config::IncrementalMode;
use tracing::{debug, info};

use crate::error::BuildError;

/// Saves the outputs of a pass into the caches of `targets` and returns the
/// accumulated changes, including the names of classes that appeared or
/// disappeared.
///
/// Every cache is stamped with the current format before anything is
/// written. Classes are diffed against their stored snapshots, module
/// mappings are recorded in the file tables, and other outputs are skipped.
/// Stale outputs are only cleared when the pass had no compilation errors.
///
/// Calling this with incremental compilation disabled, or for a target
/// without a cache, is an internal error.
pub fn update_incremental_cache(
    mode: IncrementalMode,
    targets: &[TargetId],
    generated: &[GeneratedFile],
    caches: &mut IncrementalCaches,
    compilation_errors: bool,
) -> Result<CompilationResult, BuildError> {
    if !mode.is_enabled() {
        return Err(InternalError::new("cache update requested with incremental compilation disabled").into());
    }

    for target in targets {
        cache_of(caches, target)?.save_cache_format_version()?;
    }

    let mut changes = CompilationResult::NO_CHANGES;
    for file in generated {
        let cache = cache_of(caches, file.target())?;
        match file {
            GeneratedFile::Class(class) => {
                changes += cache.save_file_to_cache(class)?;
            }
            GeneratedFile::ModuleMapping(output) => {
                changes += cache.save_module_mapping_to_cache(&output.source_files, &output.output_file)?;
            }
            GeneratedFile::Other(output) => {
                debug!(output = %output.output_file.display(), "not cached");
            }
        }
    }

    for target in targets {
        let cache = cache_of(caches, target)?;
        changes += cache.clear_cache_for_removed_classes(compilation_errors)?;
        changes += cache.pass_changes().clone();
    }

    info!(
        targets = targets.len(),
        outputs = generated.len(),
        compilation_errors,
        changed = !changes.is_empty(),
        "updated incremental caches"
    );
    Ok(changes)
}

fn cache_of<'a>(caches: &'a mut IncrementalCaches, target: &TargetId) -> Result<&'a mut IncrementalCache, BuildError> {
    caches
        .get_mut(target)
        .ok_or_else(|| InternalError::new(format!("no incremental cache for {target}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_cache::{
        incremental_caches, ChangeInfo, ClassArtifact, ClassMetadata, MemberKind, MemberSignature,
    };
    use ripple_common::FqName;
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};

    fn open(root: &Path, ids: &[TargetId]) -> IncrementalCaches {
        incremental_caches(ids, ids, |_| Vec::<TargetId>::new(), |t| {
            IncrementalCache::open(&root.join("cache").join(t.dir_name()), t.clone(), "0.1.0")
        })
        .unwrap()
    }

    fn class_output(root: &Path, name: &str, members: &[&str]) -> (PathBuf, GeneratedFile) {
        let path = root.join("out").join(format!("{name}.class"));
        let mut metadata = ClassMetadata::class(FqName::new(format!("app.{name}")));
        for member in members {
            metadata = metadata.with_member(MemberSignature::new(*member, MemberKind::Function, "()V"));
        }
        ClassArtifact::write(&path, &metadata, b"code", "0.1.0").unwrap();
        let file = GeneratedFile::new(
            TargetId::production("app"),
            BTreeSet::from([root.join(format!("src/{name}.kt"))]),
            path.clone(),
        );
        (path, file)
    }

    #[test]
    fn disabled_mode_is_internal_error() {
        let mut caches = IncrementalCaches::default();
        let err = update_incremental_cache(IncrementalMode::Disabled, &[], &[], &mut caches, false).unwrap_err();
        assert!(matches!(err, BuildError::Internal(_)));
    }

    #[test]
    fn saves_classes_and_skips_other_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let app = TargetId::production("app");
        let mut caches = open(dir.path(), std::slice::from_ref(&app));
        let (class_path, class) = class_output(dir.path(), "Widget", &["draw"]);
        let resource = GeneratedFile::new(app.clone(), BTreeSet::new(), dir.path().join("out/logo.png"));
        let mapping = GeneratedFile::new(
            app.clone(),
            BTreeSet::new(),
            dir.path().join("out/META-INF/app.module_map"),
        );

        let changes = update_incremental_cache(
            IncrementalMode::Experimental,
            std::slice::from_ref(&app),
            &[class, resource, mapping],
            &mut caches,
            false,
        )
        .unwrap();

        assert_eq!(
            changes.changes().collect::<Vec<_>>(),
            vec![
                ChangeInfo::members_changed("app".into(), ["Widget"]),
                ChangeInfo::members_changed("app.Widget".into(), ["draw"]),
            ]
        );
        let cache = caches.get(&app).unwrap();
        assert!(cache.contains_output(&class_path));
        assert!(cache.contains_output(&dir.path().join("out/META-INF/app.module_map")));
        assert!(!cache.contains_output(&dir.path().join("out/logo.png")));
    }

    #[test]
    fn output_of_target_without_cache_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut caches = open(dir.path(), &[TargetId::production("lib")]);
        let (_, class) = class_output(dir.path(), "Widget", &["draw"]);
        let err = update_incremental_cache(
            IncrementalMode::Enabled,
            &[TargetId::production("lib")],
            &[class],
            &mut caches,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Internal(_)));
    }

    #[test]
    fn unreadable_class_fails_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let app = TargetId::production("app");
        let mut caches = open(dir.path(), std::slice::from_ref(&app));
        let path = dir.path().join("out/Broken.class");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"\xca\xfe\xba\xbe").unwrap();
        let broken = GeneratedFile::new(app.clone(), BTreeSet::new(), path);

        let err = update_incremental_cache(
            IncrementalMode::Experimental,
            std::slice::from_ref(&app),
            &[broken],
            &mut caches,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Cache(ripple_cache::CacheError::ArtifactLoad(_))));
    }

    #[test]
    fn errors_keep_outputs_of_dirty_sources() {
        let dir = tempfile::tempdir().unwrap();
        let app = TargetId::production("app");
        let mut caches = open(dir.path(), std::slice::from_ref(&app));
        let (path, class) = class_output(dir.path(), "Widget", &["draw"]);
        update_incremental_cache(IncrementalMode::Enabled, std::slice::from_ref(&app), &[class], &mut caches, false)
            .unwrap();
        caches.get_mut(&app).unwrap().take_pass_changes();

        caches
            .get_mut(&app)
            .unwrap()
            .mark_dirty([dir.path().join("src/Widget.kt")]);
        let changes =
            update_incremental_cache(IncrementalMode::Enabled, std::slice::from_ref(&app), &[], &mut caches, true)
                .unwrap();
        assert!(changes.is_empty());
        assert!(caches.get(&app).unwrap().contains_output(&path));

        let changes =
            update_incremental_cache(IncrementalMode::Enabled, std::slice::from_ref(&app), &[], &mut caches, false)
                .unwrap();
        assert_eq!(
            changes.changes().collect::<Vec<_>>(),
            vec![
                ChangeInfo::members_changed("app".into(), ["Widget"]),
                ChangeInfo::members_changed("app.Widget".into(), ["draw"]),
            ]
        );
        assert!(!caches.get(&app).unwrap().contains_output(&path));
    }
}
