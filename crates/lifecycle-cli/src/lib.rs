//! lifecycle-ctl library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations over the RocksDB metadata store

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, ConfigCommands, DatasetCommands, GenerationCommands};
pub use commands::{execute, init_logging, load_settings, open_manager, run};
