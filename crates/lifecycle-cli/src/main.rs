//! Index lifecycle admin CLI
//!
//! # Usage
//!
//! ```bash
//! lifecycle-ctl dataset create Wiki v1.0
//! lifecycle-ctl config register e5 --chunk-size 512 --chunk-overlap 50 --param dims=384
//! lifecycle-ctl generation create <dataset-id> <config-id>
//! lifecycle-ctl promote <generation-id> indexing
//! lifecycle-ctl resolve Wiki --model e5
//! lifecycle-ctl rollback <generation-id>
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/index-lifecycle/config.toml)
//! 3. Environment variables (LIFECYCLE_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use lifecycle_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
