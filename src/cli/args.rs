//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Forest of labeled nodes with cycle-free re-parenting
#[derive(Parser, Debug)]
#[command(name = "rsforest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (layered over the global config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Store document file (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath, conflicts_with = "memory")]
    pub store: Option<PathBuf>,

    /// Use an ephemeral in-memory store
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a node (becomes the new root when no parent is given)
    Create {
        /// Node label
        description: String,
        /// Parent node id
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Delete a non-root node; its children move to its parent
    Delete {
        /// Node id
        id: String,
    },

    /// Move a node under a new parent, or promote it to root
    Move {
        /// Node id
        id: String,
        /// New parent id (omit to promote to root)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Show a node and its children
    Get {
        /// Node id
        id: String,
    },

    /// List all nodes
    List,

    /// Show the forest as trees
    Tree,

    /// Verify structural invariants
    Check,

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
    /// Show effective settings
    Show,
    /// Show global config file path
    Path,
}
