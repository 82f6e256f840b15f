//! Project root and configuration resolution shared by all commands.

use std::path::{Path, PathBuf};

use ripple_build::BuildOptions;
use ripple_config::CONFIG_FILE;
use tracing::debug;

use crate::{GlobalArgs, TOOL_VERSION};

/// Walks up from `start` looking for the nearest directory containing
/// `ripple.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolves the project root from the global flags.
///
/// `--config` names the file or its directory. Without it the nearest
/// ancestor holding `ripple.toml` is used, or the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        let cwd = std::env::current_dir()?;
        Ok(find_project_root(&cwd).unwrap_or(cwd))
    }
}

/// Loads the build options of the project the flags point at.
pub fn load_options(global: &GlobalArgs) -> Result<BuildOptions, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;
    let config = ripple_config::load_config_or_default(&root)?;
    let options = BuildOptions::from_config(&config, &root, TOOL_VERSION);
    debug!(root = %root.display(), mode = %options.mode, "resolved project");
    Ok(options)
}
