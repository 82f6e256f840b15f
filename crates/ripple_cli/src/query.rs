//! `ripple lookup` and `ripple dirty`: read-only queries on the lookup index.

use std::collections::BTreeSet;
use std::path::PathBuf;

use ripple_cache::{ChangeInfo, CompilationResult};
use ripple_common::FqName;
use ripple_lookup::{LookupStorage, LookupSymbol};

use crate::project::load_options;
use crate::{GlobalArgs, TOOL_VERSION};

/// Runs `ripple lookup <scope> <name>`.
pub fn lookup(scope: &str, name: &str, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = load_options(global)?;
    let lookups_dir = options.lookups_dir();
    if !lookups_dir.is_dir() {
        if !global.quiet {
            eprintln!("no lookup index in {}", options.cache_dir.display());
        }
        return Ok(1);
    }
    let storage = LookupStorage::open(&lookups_dir, TOOL_VERSION)?;
    let symbol = LookupSymbol::new(name, scope);
    for file in storage.get(&symbol) {
        println!("{}", file.display());
    }
    Ok(0)
}

/// Runs `ripple dirty <scope>:<name>...`.
pub fn dirty(members: &[String], global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let result = changed_members(members)?;
    let options = load_options(global)?;
    let lookups_dir = options.lookups_dir();
    if !lookups_dir.is_dir() {
        if !global.quiet {
            eprintln!("no lookup index in {}", options.cache_dir.display());
        }
        return Ok(1);
    }
    let storage = LookupStorage::open(&lookups_dir, TOOL_VERSION)?;
    let files: BTreeSet<PathBuf> = ripple_build::dirty_files(&result, &storage);
    for file in &files {
        println!("{}", file.display());
    }
    Ok(0)
}

/// Parses `<scope>:<name>` arguments into one aggregated result.
fn changed_members(members: &[String]) -> Result<CompilationResult, String> {
    members
        .iter()
        .map(|member| {
            let (scope, name) = parse_member(member)?;
            Ok(ChangeInfo::members_changed(FqName::new(scope), [name]))
        })
        .sum()
}

fn parse_member(member: &str) -> Result<(&str, &str), String> {
    match member.rsplit_once(':') {
        Some((scope, name)) if !name.is_empty() => Ok((scope, name)),
        _ => Err(format!("invalid member `{member}`, expected <scope>:<name>")),
    }
}
