//! Command implementations.
//!
//! Every command produces a JSON value; `run` prints it to stdout. Logs go
//! to stderr so the output stays machine-readable.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lifecycle_engine::{ConfigSelector, LifecycleManager, StorePolicy};
use lifecycle_storage::RocksMetadataStore;
use lifecycle_types::{Settings, VectorizerParameters};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cli::{Cli, Commands, ConfigCommands, DatasetCommands, GenerationCommands};

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    db_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over settings.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Open the RocksDB metadata store and wrap it in a manager.
pub fn open_manager(settings: &Settings) -> Result<LifecycleManager> {
    let db_path = settings.expanded_db_path();
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("Failed to create database directory {:?}", db_path))?;

    let store = open_store(&db_path)?;
    Ok(LifecycleManager::new(
        Arc::new(store),
        StorePolicy::from(&settings.store),
    ))
}

fn open_store(path: &Path) -> Result<RocksMetadataStore> {
    RocksMetadataStore::open(path)
        .with_context(|| format!("Failed to open metadata store at {:?}", path))
}

/// Entry point used by `main`.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(
        cli.config.as_deref(),
        cli.db_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;
    debug!(db_path = %settings.db_path, "Loaded settings");

    let manager = open_manager(&settings)?;
    let output = execute(&manager, cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run one command against a manager and return its JSON output.
pub async fn execute(manager: &LifecycleManager, command: Commands) -> Result<Value> {
    let output = match command {
        Commands::Dataset { command } => handle_dataset(manager, command).await?,
        Commands::Config { command } => handle_config(manager, command).await?,
        Commands::Generation { command } => handle_generation(manager, command).await?,
        Commands::Promote {
            generation_id,
            status,
        } => {
            let generation = manager
                .promote(&generation_id, status)
                .await
                .with_context(|| format!("Failed to promote {} to {}", generation_id, status))?;
            serde_json::to_value(generation)?
        }
        Commands::Rollback { generation_id } => {
            let generation = manager
                .rollback(&generation_id)
                .await
                .with_context(|| format!("Failed to roll back to {}", generation_id))?;
            info!(generation_id = %generation.id, "Rollback complete");
            serde_json::to_value(generation)?
        }
        Commands::Resolve {
            dataset_name,
            model,
            config_id,
        } => {
            let selector = match (model, config_id) {
                (Some(model), _) => Some(ConfigSelector::ModelName(model)),
                (None, Some(config_id)) => Some(ConfigSelector::ConfigId(config_id)),
                (None, None) => None,
            };
            let generation = manager
                .resolver()
                .resolve_production_generation(&dataset_name, selector.as_ref())
                .await?;
            json!({
                "dataset_name": dataset_name,
                "generation_id": generation.id,
                "config_id": generation.config_id,
                "physical_index_handle": generation.physical_index_handle,
            })
        }
    };
    Ok(output)
}

async fn handle_dataset(manager: &LifecycleManager, command: DatasetCommands) -> Result<Value> {
    match command {
        DatasetCommands::Create { name, version } => {
            let dataset = manager.create_dataset(&name, &version).await?;
            Ok(serde_json::to_value(dataset)?)
        }
        DatasetCommands::List { name } => {
            let datasets = match name {
                Some(name) => manager.find_datasets(&name).await?,
                None => manager.list_datasets().await?,
            };
            Ok(serde_json::to_value(datasets)?)
        }
    }
}

async fn handle_config(manager: &LifecycleManager, command: ConfigCommands) -> Result<Value> {
    match command {
        ConfigCommands::Register {
            model_name,
            chunk_size,
            chunk_overlap,
            params,
        } => {
            let parameters: VectorizerParameters = params.into_iter().collect();
            let config = manager
                .register_embedding_config(&model_name, chunk_size, chunk_overlap, parameters)
                .await?;
            Ok(serde_json::to_value(config)?)
        }
        ConfigCommands::Show { config_id } => {
            let config = manager.get_embedding_config(&config_id).await?;
            Ok(serde_json::to_value(config)?)
        }
    }
}

async fn handle_generation(
    manager: &LifecycleManager,
    command: GenerationCommands,
) -> Result<Value> {
    match command {
        GenerationCommands::Create {
            dataset_id,
            config_id,
        } => {
            let generation = manager
                .create_index_generation(&dataset_id, &config_id)
                .await?;
            Ok(serde_json::to_value(generation)?)
        }
        GenerationCommands::Show { generation_id } => {
            let generation = manager.get_index_generation(&generation_id).await?;
            Ok(serde_json::to_value(generation)?)
        }
        GenerationCommands::List { dataset_id } => {
            let generations = manager.list_generations(&dataset_id).await?;
            Ok(serde_json::to_value(generations)?)
        }
    }
}
