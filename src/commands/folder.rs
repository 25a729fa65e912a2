//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use vault_core::error::AppError;
use vault_core::types::FolderFilter;
use vault_entity::folder::{Folder, FolderNode};

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List every folder
    List,
    /// Show the folder tree with item counts
    Tree,
    /// Show a folder: its path, subfolders and models
    Show {
        /// Folder ID
        id: String,
    },
    /// Create a new folder
    Create {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Parent folder ID (omit for root)
        #[arg(short, long)]
        parent_id: Option<String>,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        id: String,
        /// New name
        #[arg(short, long)]
        name: String,
    },
    /// Delete an empty folder
    Delete {
        /// Folder ID
        id: String,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder ID
    id: String,
    /// Name
    name: String,
    /// Parent folder ID
    parent: String,
    /// Direct subfolders
    folders: usize,
    /// Direct models
    models: usize,
}

/// Execute folder commands
pub async fn execute(args: &FolderArgs, ctx: &Context) -> Result<(), AppError> {
    let library = &ctx.library;

    match &args.command {
        FolderCommand::List => {
            let rows: Vec<FolderRow> = library
                .folders()
                .into_iter()
                .map(|folder| folder_row(ctx, folder))
                .collect();
            output::print_list(&rows, ctx.format);
        }
        FolderCommand::Tree => {
            let nodes = library.folder_tree();
            match ctx.format {
                OutputFormat::Json => output::print_item(&nodes, ctx.format),
                OutputFormat::Table => {
                    if nodes.is_empty() {
                        println!("No folders.");
                    }
                    for node in &nodes {
                        print_tree_node(node);
                    }
                }
            }
        }
        FolderCommand::Show { id } => {
            let folder_id = super::parse_folder_id(id)?;
            library.navigate(FolderFilter::Folder(folder_id))?;

            let path = library
                .breadcrumbs()
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            output::print_kv("Path", &path);

            let subfolders: Vec<FolderRow> = library
                .visible_subfolders()
                .into_iter()
                .map(|folder| folder_row(ctx, folder))
                .collect();
            let items = library.visible_items();
            output::print_kv("Subfolders", &subfolders.len().to_string());
            output::print_kv("Models", &items.len().to_string());
            output::print_list(&subfolders, ctx.format);
            output::print_list(&super::item::item_rows(&items), ctx.format);
        }
        FolderCommand::Create { name, parent_id } => {
            let parent = parent_id.as_deref().map(super::parse_folder_id).transpose()?;
            let outcome = library.create_folder(name, parent).await?;
            if let Some(folder) = outcome.folder() {
                output::print_success(&format!("Folder '{}' created ({})", folder.name, folder.id));
            } else {
                output::print_outcome(&outcome, "Folder created");
            }
        }
        FolderCommand::Rename { id, name } => {
            let folder_id = super::parse_folder_id(id)?;
            let outcome = library.rename_folder(&folder_id, name).await?;
            output::print_outcome(&outcome, &format!("Folder renamed to '{}'", name.trim()));
        }
        FolderCommand::Delete { id } => {
            let folder_id = super::parse_folder_id(id)?;
            library.request_folder_delete(&folder_id)?;
            let name = library
                .folder(&folder_id)
                .map(|f| f.name)
                .unwrap_or_else(|| folder_id.to_string());

            if !ctx.confirm(&format!("Delete folder '{}'?", name))? {
                library.cancel_delete();
                println!("Aborted.");
                return Ok(());
            }
            let outcome = library.confirm_delete().await?;
            output::print_outcome(&outcome, &format!("Folder '{}' deleted", name));
        }
    }

    Ok(())
}

fn folder_row(ctx: &Context, folder: Folder) -> FolderRow {
    let (folders, models) = ctx
        .library
        .with_state(|state| state.folder_occupancy(&folder.id));
    FolderRow {
        id: folder.id.to_string(),
        name: folder.name,
        parent: folder
            .parent_id
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string()),
        folders,
        models,
    }
}

fn print_tree_node(node: &FolderNode) {
    println!(
        "{}{} ({} models)",
        "  ".repeat(node.depth),
        node.name,
        node.item_count
    );
    for child in &node.children {
        print_tree_node(child);
    }
}
