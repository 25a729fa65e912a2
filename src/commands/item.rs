//! Model management and bulk operation CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use vault_core::error::AppError;
use vault_core::types::FolderFilter;
use vault_entity::item::{FileBlob, Item, ItemPatch};
use vault_service::{ItemQuery, ItemSort, UploadOutcome, UploadReport, parse_tag_list};

use super::Context;
use crate::output;

/// Arguments for model commands
#[derive(Debug, Args)]
pub struct ItemArgs {
    /// Model subcommand
    #[command(subcommand)]
    pub command: ItemCommand,
}

/// Model subcommands
#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// List models
    List {
        /// Only models directly inside this folder
        #[arg(long)]
        folder: Option<String>,
        /// Case-insensitive match against names and tags
        #[arg(short, long)]
        search: Option<String>,
        /// Listing order
        #[arg(long, value_enum, default_value = "date-desc")]
        sort: SortArg,
    },
    /// Show one model
    Show {
        /// Model ID
        id: String,
    },
    /// Upload model files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Destination folder (prompted when omitted)
        #[arg(long)]
        folder: Option<String>,
        /// Comma-separated tags applied to every file
        #[arg(long)]
        tags: Option<String>,
    },
    /// Import a model from a public URL
    Import {
        /// Source URL
        url: String,
        /// Destination folder
        #[arg(long)]
        folder: String,
    },
    /// Edit a model's name, description or tags
    Edit {
        /// Model ID
        id: String,
        /// New file name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Replacement tags, comma-separated
        #[arg(long)]
        tags: Option<String>,
    },
    /// Replace a model's file with a new version of the same type
    Replace {
        /// Model ID
        id: String,
        /// New file
        path: PathBuf,
    },
    /// Move models into a folder
    Move {
        /// Model IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Destination folder
        #[arg(long)]
        folder: String,
    },
    /// Add tags to models
    Tag {
        /// Model IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: String,
    },
    /// Delete models
    Delete {
        /// Model IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Download models as one zip archive
    Download {
        /// Model IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output directory (defaults to `download.output_dir`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Newest first
    DateDesc,
    /// Oldest first
    DateAsc,
    /// Name A-Z
    NameAsc,
    /// Name Z-A
    NameDesc,
    /// Largest first
    SizeDesc,
    /// Smallest first
    SizeAsc,
}

impl From<SortArg> for ItemSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::DateDesc => Self::DateDesc,
            SortArg::DateAsc => Self::DateAsc,
            SortArg::NameAsc => Self::NameAsc,
            SortArg::NameDesc => Self::NameDesc,
            SortArg::SizeDesc => Self::SizeDesc,
            SortArg::SizeAsc => Self::SizeAsc,
        }
    }
}

/// Model display row
#[derive(Debug, Serialize, Tabled)]
pub struct ItemRow {
    /// Model ID
    id: String,
    /// File name
    name: String,
    /// Folder ID
    folder: String,
    /// Size
    size: String,
    /// Tags
    tags: String,
    /// Added at
    added: String,
}

/// Build display rows for models.
pub fn item_rows(items: &[Item]) -> Vec<ItemRow> {
    items
        .iter()
        .map(|item| ItemRow {
            id: item.id.to_string(),
            name: item.name.clone(),
            folder: item.folder_id.to_string(),
            size: output::human_bytes(item.size),
            tags: item.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            added: item
                .added_at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// Execute model commands
pub async fn execute(args: &ItemArgs, ctx: &Context) -> Result<(), AppError> {
    let library = &ctx.library;

    match &args.command {
        ItemCommand::List {
            folder,
            search,
            sort,
        } => {
            let filter = match folder {
                Some(raw) => FolderFilter::Folder(super::parse_folder_id(raw)?),
                None => FolderFilter::All,
            };
            library.navigate(filter)?;
            let query = ItemQuery {
                search: search.clone().unwrap_or_default(),
                sort: (*sort).into(),
            };
            output::print_list(&item_rows(&library.visible_items_with(&query)), ctx.format);
        }
        ItemCommand::Show { id } => {
            let id = super::parse_item_id(id)?;
            let item = library.open_item(&id)?;
            output::print_item(&item, ctx.format);
        }
        ItemCommand::Upload {
            paths,
            folder,
            tags,
        } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                files.push(read_blob(path).await?);
            }
            let destination = folder.as_deref().map(super::parse_folder_id).transpose()?;

            // The library opens at the root, so files are staged first.
            let report = match library.upload_files(files, None).await? {
                UploadOutcome::Uploaded(report) => report,
                UploadOutcome::AwaitingDestination(pending) => {
                    if let Some(tags) = tags {
                        library.set_pending_upload_tags(tags)?;
                    }
                    let target = match destination.or_else(|| pending.suggested_folder.clone()) {
                        Some(target) => target,
                        None => {
                            library.cancel_upload();
                            return Err(AppError::validation(
                                "Create a folder first, then upload into it with --folder",
                            ));
                        }
                    };
                    if folder.is_none() {
                        let name = library
                            .folder(&target)
                            .map(|f| f.name)
                            .unwrap_or_else(|| target.to_string());
                        let prompt = format!(
                            "Upload {} file(s) ({}) into '{}'?",
                            pending.files.len(),
                            output::human_bytes(pending.total_size()),
                            name
                        );
                        if !ctx.confirm(&prompt)? {
                            library.cancel_upload();
                            println!("Aborted.");
                            return Ok(());
                        }
                    }
                    library.confirm_upload(&target).await?
                }
            };
            print_upload_report(&report, ctx);
        }
        ItemCommand::Import { url, folder } => {
            let folder_id = super::parse_folder_id(folder)?;
            let outcome = library.import_from_url(url, &folder_id).await?;
            match outcome.item() {
                Some(item) => output::print_success(&format!("Imported '{}' ({})", item.name, item.id)),
                None => {
                    output::print_outcome(&outcome, "Imported");
                }
            }
        }
        ItemCommand::Edit {
            id,
            name,
            description,
            tags,
        } => {
            let id = super::parse_item_id(id)?;
            let patch = ItemPatch {
                name: name.clone(),
                description: description.clone(),
                tags: tags
                    .as_deref()
                    .map(|input| parse_tag_list(input).into_iter().collect()),
                ..ItemPatch::default()
            };
            let outcome = library.update_item(&id, patch).await?;
            output::print_outcome(&outcome, "Model updated");
        }
        ItemCommand::Replace { id, path } => {
            let id = super::parse_item_id(id)?;
            let file = read_blob(path).await?;
            let outcome = library.replace_item_content(&id, file).await?;
            output::print_outcome(&outcome, "Model file replaced");
        }
        ItemCommand::Move { ids, folder } => {
            let ids = super::parse_item_ids(ids)?;
            let folder_id = super::parse_folder_id(folder)?;
            super::select(library, &ids)?;
            let outcome = library.move_selection(&folder_id).await?;
            output::print_outcome(&outcome, &format!("Moved {} model(s)", ids.len()));
        }
        ItemCommand::Tag { ids, tags } => {
            let ids = super::parse_item_ids(ids)?;
            super::select(library, &ids)?;
            let outcome = library.tag_selection(tags).await?;
            output::print_outcome(&outcome, &format!("Tagged {} model(s)", ids.len()));
        }
        ItemCommand::Delete { ids } => {
            let ids = super::parse_item_ids(ids)?;
            let count = if let [id] = ids.as_slice() {
                library.request_item_delete(id)?;
                1
            } else {
                super::select(library, &ids)?;
                library.request_selection_delete()?;
                library.selection().len()
            };
            if !ctx.confirm(&format!("Delete {} model(s)? This cannot be undone.", count))? {
                library.cancel_delete();
                println!("Aborted.");
                return Ok(());
            }
            let outcome = library.confirm_delete().await?;
            output::print_outcome(&outcome, &format!("Deleted {} model(s)", count));
        }
        ItemCommand::Download { ids, out } => {
            let ids = super::parse_item_ids(ids)?;
            super::select(library, &ids)?;
            let mut notices = library.subscribe();
            let archive = library.download_selection().await?;
            let dir = out
                .clone()
                .unwrap_or_else(|| PathBuf::from(&ctx.config.download.output_dir));
            let path = archive.save_to(&dir).await?;

            while let Ok(notice) = notices.try_recv() {
                output::print_notice(&notice);
            }
            for failure in &archive.failures {
                output::print_warning(&format!("{}: {}", failure.name, failure.reason));
            }
            output::print_success(&format!(
                "Saved {} model(s) to {}",
                archive.entries.len(),
                path.display()
            ));
        }
    }

    Ok(())
}

async fn read_blob(path: &Path) -> Result<FileBlob, AppError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::validation(format!("Invalid file path: {}", path.display())))?;
    let data = tokio::fs::read(path).await?;
    Ok(FileBlob::new(name, data))
}

fn print_upload_report(report: &UploadReport, ctx: &Context) {
    for name in &report.failed {
        output::print_error(&format!("Failed to upload {}", name));
    }
    if !report.uploaded.is_empty() {
        output::print_list(&item_rows(&report.uploaded), ctx.format);
        output::print_success(&format!("Uploaded {} model(s)", report.uploaded.len()));
    }
}
