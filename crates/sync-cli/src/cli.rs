//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Entity sync - Keep a store of entities and a tree of document files in step
#[derive(Parser, Debug)]
#[command(name = "esync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Entity store file (defaults to <root>/store.json)
    #[arg(long, global = true, env = "ESYNC_STORE")]
    pub store: Option<PathBuf>,

    /// Directory holding the sync folder
    #[arg(long, global = true, env = "ESYNC_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Settings and handler definitions (defaults to <root>/sync.toml)
    #[arg(long, global = true, env = "ESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Restrict the run to one handler, by alias or entity type
    #[arg(long, global = true)]
    pub handler: Option<String>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show what an import would change, without changing anything
    Report,

    /// Import documents into the store
    ///
    /// Examples:
    ///   esync import                 # Only changed documents
    ///   esync import --force         # Every document
    ///   esync import --handler media # One handler
    Import {
        /// Import documents even when they match the store
        #[arg(long)]
        force: bool,
    },

    /// Export every stored entity to documents
    Export,

    /// Export a single entity
    ExportItem {
        /// Key of the entity
        key: Uuid,
    },

    /// List what an entity depends on, in import order
    Deps {
        /// Key of the entity
        key: Uuid,

        /// Include parent items
        #[arg(long)]
        ancestors: bool,

        /// Include child items
        #[arg(long)]
        children: bool,

        /// Only the entity itself
        #[arg(long, conflicts_with_all = ["ancestors", "children"])]
        no_deps: bool,
    },

    /// Write a clean marker below an entity
    ///
    /// On the next import, children of the entity without a document in
    /// the marker's folder are deleted.
    CleanMarker {
        /// Key of the parent entity
        parent: Uuid,
    },

    /// List configured handlers
    Handlers,

    /// Generate shell completions
    ///
    /// Outputs completion script for your shell.
    ///
    /// Examples:
    ///   esync completions bash > ~/.local/share/bash-completion/completions/esync
    ///   esync completions zsh > ~/.zfunc/_esync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_global_options_after_command() {
        let cli = Cli::parse_from(["esync", "report", "--root", "site", "--json", "--handler", "pages"]);
        assert_eq!(cli.command, Some(Commands::Report));
        assert_eq!(cli.root, PathBuf::from("site"));
        assert_eq!(cli.handler.as_deref(), Some("pages"));
        assert!(cli.json);
        assert!(cli.store.is_none());
    }

    #[test]
    fn parse_import_force() {
        let cli = Cli::parse_from(["esync", "import", "--force"]);
        assert_eq!(cli.command, Some(Commands::Import { force: true }));
    }

    #[test]
    fn parse_deps_flags() {
        let key = "00000000-0000-0000-0000-000000001001";
        let cli = Cli::parse_from(["esync", "deps", key, "--ancestors"]);
        assert_eq!(
            cli.command,
            Some(Commands::Deps {
                key: Uuid::from_u128(0x1001),
                ancestors: true,
                children: false,
                no_deps: false,
            })
        );
    }

    #[test]
    fn no_deps_conflicts_with_ancestors() {
        let key = "00000000-0000-0000-0000-000000001001";
        let result = Cli::try_parse_from(["esync", "deps", key, "--no-deps", "--ancestors"]);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_key_is_rejected() {
        let result = Cli::try_parse_from(["esync", "export-item", "not-a-key"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_completions_command() {
        let cli = Cli::parse_from(["esync", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }
}
