//! `ripple clean`: drops every persisted cache.

use crate::project::load_options;
use crate::GlobalArgs;

/// Runs the `ripple clean` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = load_options(global)?;
    let cleaned = ripple_build::clean(&options.cache_dir)?;
    if !global.quiet {
        println!(
            "cleaned {cleaned} target cache{} in {}",
            if cleaned == 1 { "" } else { "s" },
            options.cache_dir.display()
        );
    }
    Ok(0)
}
