//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Render adjacency-list and nested-set hierarchies as tree-view JSON
#[derive(Parser, Debug)]
#[command(name = "rstree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: ./.rstree.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory with <model>.json tables (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::DirPath, env = "RSTREE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Request options shared by the render commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Raw query string, e.g. "selected=3,7&selected_id=3"
    #[arg(short, long)]
    pub query: Option<String>,

    /// Comma-separated selected ids
    #[arg(short, long)]
    pub selected: Option<String>,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,

    /// Print a tree preview instead of JSON
    #[arg(long, conflicts_with = "pretty")]
    pub tree: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a nested-set table as nested JSON
    Nested {
        /// Model (table) name
        model: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Render an adjacency-list table as flat JSON
    Adjacency {
        /// Model (table) name
        model: String,

        #[command(flatten)]
        request: RequestArgs,

        /// Id to select and open
        #[arg(long)]
        selected_id: Option<String>,
    },

    /// Check nested-set bounds for well-formedness
    Validate {
        /// Model (table) name
        model: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}
