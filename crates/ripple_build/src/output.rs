//! Assignment of compiler outputs to the targets that own them.

use std::collections::HashMap;
use std::path::PathBuf;

use ripple_cache::GeneratedFile;
use ripple_common::BuildTarget;
use tracing::debug;

use crate::compiler::OutputItemsCollector;

/// Turns the outputs of one invocation over `targets` into generated files.
///
/// An output belongs to the target owning its first source. Source ownership
/// is only consulted when several targets were compiled together; otherwise,
/// and for outputs without sources, the output goes to the single target
/// whose output directory contains it, falling back to `representative`.
pub fn generated_files<T, S, O>(
    targets: &[T],
    representative: &T,
    mut get_sources: S,
    mut get_output_dir: O,
    collector: &OutputItemsCollector,
) -> Vec<GeneratedFile>
where
    T: BuildTarget,
    S: FnMut(&T) -> Vec<PathBuf>,
    O: FnMut(&T) -> Option<PathBuf>,
{
    let mut source_to_target: HashMap<PathBuf, &T> = HashMap::new();
    if targets.len() > 1 {
        for target in targets {
            for source in get_sources(target) {
                source_to_target.insert(source, target);
            }
        }
    }
    let output_dirs: Vec<(&T, Option<PathBuf>)> =
        targets.iter().map(|t| (t, get_output_dir(t))).collect();

    collector
        .outputs()
        .iter()
        .map(|item| {
            let owner = item
                .source_files
                .iter()
                .next()
                .and_then(|first| source_to_target.get(first).copied())
                .or_else(|| {
                    let mut containing = output_dirs.iter().filter(|(_, dir)| {
                        dir.as_ref().is_some_and(|dir| item.output_file.starts_with(dir))
                    });
                    match (containing.next(), containing.next()) {
                        (Some((target, _)), None) => Some(*target),
                        _ => None,
                    }
                })
                .unwrap_or(representative);
            let file = GeneratedFile::new(
                owner.target_id(),
                item.source_files.clone(),
                item.output_file.clone(),
            );
            debug!(output = %item.output_file.display(), target_id = %file.target(), "assigned output");
            file
        })
        .collect()
}
