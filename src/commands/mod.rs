//! CLI command definitions and dispatch.

pub mod folder;
pub mod item;
pub mod usage;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use vault_core::config::AppConfig;
use vault_core::error::AppError;
use vault_core::types::{FolderId, ItemId};
use vault_service::Library;

/// ModelVault: organize 3D model collections
#[derive(Debug, Parser)]
#[command(name = "modelvault", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/modelvault.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Folder management
    Folder(folder::FolderArgs),
    /// Model management and bulk operations
    Item(item::ItemArgs),
    /// Show storage usage
    Usage,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let ctx = Context {
            library: open_library(&config).await?,
            config,
            format: self.format,
            yes: self.yes,
        };
        match &self.command {
            Commands::Folder(args) => folder::execute(args, &ctx).await,
            Commands::Item(args) => item::execute(args, &ctx).await,
            Commands::Usage => usage::execute(&ctx).await,
        }
    }
}

/// Everything a command needs.
pub struct Context {
    /// Loaded library.
    pub library: Library,
    /// Effective configuration.
    pub config: AppConfig,
    /// Output format.
    pub format: OutputFormat,
    /// Whether prompts are pre-answered.
    pub yes: bool,
}

impl Context {
    /// Ask for confirmation unless `--yes` was given.
    pub fn confirm(&self, prompt: &str) -> Result<bool, AppError> {
        if self.yes {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
        .map_err(|e| AppError::configuration(format!("Failed to load config: {}", e)))
}

/// Helper: connect the configured store and load the library
pub async fn open_library(config: &AppConfig) -> Result<Library, AppError> {
    tracing::debug!(provider = %config.remote.provider, "Opening library");
    let store = vault_remote::connect(&config.remote)?;
    let library = Library::new(store, config);
    library.load().await?;
    Ok(library)
}

/// Helper: parse a folder id argument
pub fn parse_folder_id(raw: &str) -> Result<FolderId, AppError> {
    FolderId::parse(raw).map_err(|e| AppError::validation(format!("Invalid folder id: {}", e)))
}

/// Helper: parse a model id argument
pub fn parse_item_id(raw: &str) -> Result<ItemId, AppError> {
    ItemId::parse(raw).map_err(|e| AppError::validation(format!("Invalid model id: {}", e)))
}

/// Helper: parse model id arguments
pub fn parse_item_ids(raw: &[String]) -> Result<Vec<ItemId>, AppError> {
    raw.iter().map(|id| parse_item_id(id)).collect()
}

/// Helper: make `ids` the library selection
pub fn select(library: &Library, ids: &[ItemId]) -> Result<(), AppError> {
    library.clear_selection();
    for id in ids {
        if library.item(id).is_none() {
            return Err(AppError::not_found(format!("Model '{}' not found", id)));
        }
        if !library.selection().contains(id) {
            library.toggle_selection(id);
        }
    }
    Ok(())
}
