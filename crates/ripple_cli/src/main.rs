//! Ripple CLI, an inspection tool for incremental compilation caches.
//!
//! Provides `ripple status` to summarize the per-target caches and the lookup
//! index, `ripple lookup` and `ripple dirty` to query the index the way the
//! build driver does, and `ripple clean` to discard all persisted state.

#![warn(missing_docs)]

mod clean;
mod project;
mod query;
mod status;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Version recorded in every file the tool persists.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ripple incremental compilation cache tooling.
#[derive(Parser, Debug)]
#[command(name = "ripple", version, about = "Ripple incremental compilation caches")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `ripple.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize the persisted caches.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the files that looked up a name in a scope.
    Lookup {
        /// Fully-qualified scope (class or package).
        scope: String,
        /// Simple name of the member.
        name: String,
    },
    /// List the files a change to the given members would make dirty.
    Dirty {
        /// Changed members as `<scope>:<name>`.
        #[arg(required = true, num_args = 1..)]
        members: Vec<String>,
    },
    /// Delete all persisted caches and the lookup index.
    Clean,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to log debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Status { json } => status::run(json, &global),
        Command::Lookup { ref scope, ref name } => query::lookup(scope, name, &global),
        Command::Dirty { ref members } => query::dirty(members, &global),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` takes precedence over the flags.
fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}
