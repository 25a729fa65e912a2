//! Bulk mutation coordinator.
//!
//! Turns "these items + this operation" into one batched remote call (via
//! the sync layer) plus the matching local reconciliation. Deletes are
//! two-phase: a request records what would be deleted, and nothing leaves
//! the client until it is confirmed.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use vault_core::config::download::DownloadConfig;
use vault_core::error::AppError;
use vault_core::notice::{Notice, NoticeLevel};
use vault_core::result::AppResult;
use vault_core::types::{FolderId, ItemId};

use crate::archive::{DownloadArchive, DownloadFailure};
use crate::state::{PendingDelete, SharedState};
use crate::sync::{Mutation, SyncLayer, SyncOutcome};
use crate::upload::normalize_tags;

/// Which items a bulk operation acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTarget {
    /// The current selection; consumed when the operation succeeds.
    Selection,
    /// An explicit list; the selection is left alone.
    Explicit(Vec<ItemId>),
}

/// Coordinates move, tag, delete and download across many items.
#[derive(Debug, Clone)]
pub struct BulkCoordinator {
    /// Sync layer every mutation goes through.
    sync: SyncLayer,
    /// Local caches.
    state: SharedState,
    /// Archive settings.
    download: DownloadConfig,
}

impl BulkCoordinator {
    /// Creates a new bulk coordinator.
    pub fn new(sync: SyncLayer, state: SharedState, download: DownloadConfig) -> Self {
        Self {
            sync,
            state,
            download,
        }
    }

    /// Resolve a target to ids. An empty target is a validation error.
    fn resolve(&self, target: BulkTarget) -> AppResult<(Vec<ItemId>, bool)> {
        let (ids, from_selection) = match target {
            BulkTarget::Selection => (self.state.read().selection.ids(), true),
            BulkTarget::Explicit(ids) => (ids, false),
        };
        if ids.is_empty() {
            return Err(AppError::validation("No models selected"));
        }
        Ok((ids, from_selection))
    }

    fn consume_selection(&self, outcome: &SyncOutcome, from_selection: bool) {
        if from_selection && outcome.is_confirmed() {
            self.state.write().selection.clear();
        }
    }

    /// Move items into `folder_id` with one remote call.
    ///
    /// Items already in the destination are included and unaffected. Ids
    /// unknown locally are still forwarded to the store.
    pub async fn move_items(&self, target: BulkTarget, folder_id: FolderId) -> AppResult<SyncOutcome> {
        if !self.state.read().is_valid_destination(&folder_id) {
            return Err(AppError::validation(format!(
                "Unknown destination folder '{folder_id}'"
            )));
        }
        let (ids, from_selection) = self.resolve(target)?;
        let count = ids.len();

        let outcome = self
            .sync
            .apply(Mutation::BulkMove {
                ids,
                folder_id: folder_id.clone(),
            })
            .await;
        self.consume_selection(&outcome, from_selection);

        info!(
            count,
            folder_id = %folder_id,
            confirmed = outcome.is_confirmed(),
            "Bulk move finished"
        );
        Ok(outcome)
    }

    /// Union `tags` into every target item with one remote call.
    pub async fn tag_items(&self, target: BulkTarget, tags: &[String]) -> AppResult<SyncOutcome> {
        let tags = normalize_tags(tags);
        if tags.is_empty() {
            return Err(AppError::validation("No tags given"));
        }
        let (ids, from_selection) = self.resolve(target)?;
        let count = ids.len();

        let outcome = self.sync.apply(Mutation::BulkTag { ids, tags }).await;
        self.consume_selection(&outcome, from_selection);

        info!(count, confirmed = outcome.is_confirmed(), "Bulk tag finished");
        Ok(outcome)
    }

    /// Ask for confirmation before deleting many items.
    pub fn request_delete(&self, target: BulkTarget) -> AppResult<PendingDelete> {
        let (ids, from_selection) = self.resolve(target)?;
        let pending = PendingDelete::Items {
            ids,
            from_selection,
        };
        self.state.write().pending_delete = Some(pending.clone());
        Ok(pending)
    }

    /// Ask for confirmation before deleting one item.
    pub fn request_item_delete(&self, id: ItemId) -> AppResult<PendingDelete> {
        let mut state = self.state.write();
        if state.items.get(&id).is_none() {
            return Err(AppError::not_found(format!("Model '{id}' not found")));
        }
        let pending = PendingDelete::Item(id);
        state.pending_delete = Some(pending.clone());
        Ok(pending)
    }

    /// Ask for confirmation before deleting a folder.
    ///
    /// Refused with a validation error, before any remote call, when the
    /// folder still has child folders or items.
    pub fn request_folder_delete(&self, id: FolderId) -> AppResult<PendingDelete> {
        let mut state = self.state.write();
        if state.tree.get(&id).is_none() {
            return Err(AppError::not_found(format!("Folder '{id}' not found")));
        }
        ensure_empty(state.folder_occupancy(&id))?;
        let pending = PendingDelete::Folder(id);
        state.pending_delete = Some(pending.clone());
        Ok(pending)
    }

    /// The delete awaiting confirmation, if any.
    pub fn pending_delete(&self) -> Option<PendingDelete> {
        self.state.read().pending_delete.clone()
    }

    /// Drop the pending delete without touching anything.
    pub fn cancel_delete(&self) -> Option<PendingDelete> {
        self.state.write().pending_delete.take()
    }

    /// Execute the pending delete.
    pub async fn confirm_delete(&self) -> AppResult<SyncOutcome> {
        let pending = self
            .state
            .write()
            .pending_delete
            .take()
            .ok_or_else(|| AppError::validation("Nothing is awaiting confirmation"))?;

        let outcome = match pending {
            PendingDelete::Items {
                ids,
                from_selection,
            } => {
                let count = ids.len();
                let outcome = self.sync.apply(Mutation::BulkDelete { ids }).await;
                self.consume_selection(&outcome, from_selection);
                info!(count, confirmed = outcome.is_confirmed(), "Bulk delete finished");
                outcome
            }
            PendingDelete::Item(id) => {
                info!(item_id = %id, "Deleting model");
                self.sync.apply(Mutation::DeleteItem { id }).await
            }
            PendingDelete::Folder(id) => {
                // Items may have arrived since the request.
                ensure_empty(self.state.read().folder_occupancy(&id))?;
                info!(folder_id = %id, "Deleting folder");
                self.sync.apply(Mutation::DeleteFolder { id }).await
            }
        };
        Ok(outcome)
    }

    /// Fetch every target item and package the successes into one archive.
    ///
    /// Fetches run concurrently, bounded by `max_concurrent_fetches`.
    /// Failures are logged, listed in the archive, and reported as a
    /// warning notice; they never abort the batch.
    pub async fn download(&self, target: BulkTarget) -> AppResult<DownloadArchive> {
        let (ids, from_selection) = self.resolve(target)?;
        let named: Vec<(ItemId, String)> = {
            let state = self.state.read();
            ids.into_iter()
                .map(|id| {
                    let name = state
                        .items
                        .get(&id)
                        .map_or_else(|| id.to_string(), |item| item.name.clone());
                    (id, name)
                })
                .collect()
        };
        let total = named.len();

        let semaphore = Arc::new(Semaphore::new(self.download.max_concurrent_fetches.max(1)));
        let tasks = named.into_iter().map(|(id, name)| {
            let sem = semaphore.clone();
            let store = self.sync.store().clone();
            async move {
                let result: AppResult<Bytes> = match sem.acquire().await {
                    Ok(_permit) => store.download_item(&id).await,
                    Err(_) => Err(AppError::internal("Download limiter closed")),
                };
                (id, name, result)
            }
        });

        let mut files = Vec::new();
        let mut failures = Vec::new();
        for (id, name, result) in join_all(tasks).await {
            match result {
                Ok(data) => files.push((name, data)),
                Err(err) => {
                    warn!(item_id = %id, error = %err, "Skipping model in batch download");
                    failures.push(DownloadFailure {
                        item_id: id,
                        name,
                        reason: err.message,
                    });
                }
            }
        }

        let archive = DownloadArchive::build(&self.download.archive_prefix, files, failures)?;
        if archive.is_partial() {
            self.sync.notify(Notice::new(
                NoticeLevel::Warning,
                "bulk_download",
                format!("Skipped {} of {total} models", archive.failures.len()),
            ));
        }
        if from_selection {
            self.state.write().selection.clear();
        }

        info!(
            archive = %archive.file_name,
            entries = archive.entries.len(),
            skipped = archive.failures.len(),
            "Batch download packaged"
        );
        Ok(archive)
    }
}

fn ensure_empty((children, items): (usize, usize)) -> AppResult<()> {
    if children > 0 || items > 0 {
        return Err(AppError::validation(
            "Folder must be empty to delete. Delete or move all models and subfolders first.",
        ));
    }
    Ok(())
}
