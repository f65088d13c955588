//! Entity sync CLI
//!
//! Reports, imports and exports the documents of a JSON entity store.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use sync_core::DependencyFlags;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{Location, Workspace};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let Some(command) = cli.command else {
        println!("{} Entity sync CLI", "esync".green().bold());
        println!();
        println!("Run {} for available commands.", "esync --help".cyan());
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "esync", &mut std::io::stdout());
        return Ok(());
    }

    let location = Location {
        root: cli.root,
        store: cli.store,
        config: cli.config,
    };
    let workspace = Workspace::open(&location, cli.handler)?;
    execute_command(&workspace, command, cli.json)
}

/// Logs go to stderr so JSON output stays parseable. `RUST_LOG` applies
/// unless `--verbose` is given.
fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {}", e)))?;
    tracing::debug!("Verbose mode enabled");
    Ok(())
}

fn execute_command(workspace: &Workspace, cmd: Commands, json: bool) -> Result<()> {
    match cmd {
        Commands::Report => commands::run_report(workspace, json),
        Commands::Import { force } => commands::run_import(workspace, force, json),
        Commands::Export => commands::run_export(workspace, json),
        Commands::ExportItem { key } => commands::run_export_item(workspace, key, json),
        Commands::Deps {
            key,
            ancestors,
            children,
            no_deps,
        } => {
            let flags = DependencyFlags {
                no_dependencies: no_deps,
                include_ancestors: ancestors,
                include_children: children,
            };
            commands::run_deps(workspace, key, flags, json)
        }
        Commands::CleanMarker { parent } => commands::run_clean_marker(workspace, parent, json),
        Commands::Handlers => commands::run_handlers(workspace, json),
        Commands::Completions { .. } => Ok(()),
    }
}
