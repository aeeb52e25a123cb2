//! CLI argument parsing for lifecycle-ctl.
//!
//! Global flags override every other configuration source.

use clap::{Parser, Subcommand};
use lifecycle_types::LifecycleStatus;
use serde_json::Value;

/// Index lifecycle admin tool
///
/// Registers datasets and embedding configs, creates index generations and
/// moves them through DRAFT -> INDEXING -> STAGING -> PRODUCTION.
#[derive(Parser, Debug)]
#[command(name = "lifecycle-ctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/index-lifecycle/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override metadata database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dataset commands
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// Embedding config commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Index generation commands
    Generation {
        #[command(subcommand)]
        command: GenerationCommands,
    },

    /// Move a generation to a new status
    Promote {
        /// Generation ID
        generation_id: String,

        /// Target status (draft, indexing, staging, production, deprecated, archived)
        status: LifecycleStatus,
    },

    /// Restore a deprecated generation to production
    Rollback {
        /// Generation ID
        generation_id: String,
    },

    /// Show the production index for a dataset
    Resolve {
        /// Dataset name
        dataset_name: String,

        /// Only consider generations built with this model
        #[arg(long, conflicts_with = "config_id")]
        model: Option<String>,

        /// Only consider generations built with this embedding config
        #[arg(long)]
        config_id: Option<String>,
    },
}

/// Dataset subcommands.
#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Register a dataset version
    Create {
        /// Dataset name
        name: String,

        /// Source content version tag
        version: String,
    },

    /// List datasets
    List {
        /// Only datasets with this name
        #[arg(long)]
        name: Option<String>,
    },
}

/// Embedding config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Register an embedding config
    Register {
        /// Embedding model name
        model_name: String,

        /// Chunk size in tokens
        #[arg(long, default_value_t = 512)]
        chunk_size: u32,

        /// Overlap between chunks
        #[arg(long, default_value_t = 50)]
        chunk_overlap: u32,

        /// Vectorizer parameter as key=value (repeatable; value parsed as JSON)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },

    /// Show an embedding config
    Show {
        /// Config ID
        config_id: String,
    },
}

/// Index generation subcommands.
#[derive(Subcommand, Debug)]
pub enum GenerationCommands {
    /// Create a generation in DRAFT
    Create {
        /// Dataset ID
        dataset_id: String,

        /// Embedding config ID
        config_id: String,
    },

    /// Show one generation
    Show {
        /// Generation ID
        generation_id: String,
    },

    /// List generations of a dataset, oldest first
    List {
        /// Dataset ID
        dataset_id: String,
    },
}

/// Parse `key=value`. The value is read as JSON when possible, otherwise
/// kept as a string.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
