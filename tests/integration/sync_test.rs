//! Integration tests for optimistic sync against the remote store.

mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use helpers::{TestLibrary, fid, ids_in, iid};
use vault_core::error::AppError;
use vault_core::result::AppResult;
use vault_core::types::{FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::{Dimensions, FileBlob, Item, ItemPatch, UploadItem};
use vault_entity::storage::StorageUsage;
use vault_remote::RemoteStore;
use vault_remote::providers::MemoryStore;
use vault_service::{
    BulkTarget, Library, MetadataGenerator, MetadataSuggestion, ThumbnailRenderer, UploadOutcome,
};

async fn library() -> TestLibrary {
    TestLibrary::builder()
        .folder("a", "Inbox", None)
        .folder("b", "Archive", None)
        .tagged_item("m1", "tiger.stl", "a", &["cat"])
        .item("m2", "lion.stl", "a")
        .item("m3", "bridge.3mf", "b")
        .build()
        .await
}

#[derive(Debug)]
struct FixedRenderer;

#[async_trait]
impl ThumbnailRenderer for FixedRenderer {
    async fn render(&self, file: &FileBlob) -> AppResult<Option<String>> {
        Ok(Some(format!("data:image/png;base64,{}", file.name)))
    }
}

#[derive(Debug)]
struct FixedMetadata;

#[async_trait]
impl MetadataGenerator for FixedMetadata {
    async fn suggest(&self, name: &str, _description: &str) -> AppResult<MetadataSuggestion> {
        Ok(MetadataSuggestion {
            tags: vec!["cat".to_string(), " predator ".to_string()],
            description: format!("A detailed {name}"),
        })
    }
}

/// Memory store whose bulk tag call waits for a release and then fails.
#[derive(Debug)]
struct StalledTagStore {
    inner: Arc<MemoryStore>,
    entered: Notify,
    release: Notify,
}

impl StalledTagStore {
    fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl RemoteStore for StalledTagStore {
    fn provider_type(&self) -> &str {
        "stalled"
    }

    async fn list_folders(&self) -> AppResult<Vec<Folder>> {
        self.inner.list_folders().await
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&FolderId>) -> AppResult<Folder> {
        self.inner.create_folder(name, parent_id).await
    }

    async fn rename_folder(&self, id: &FolderId, name: &str) -> AppResult<Folder> {
        self.inner.rename_folder(id, name).await
    }

    async fn delete_folder(&self, id: &FolderId) -> AppResult<()> {
        self.inner.delete_folder(id).await
    }

    async fn list_items(&self, folder_id: Option<&FolderId>) -> AppResult<Vec<Item>> {
        self.inner.list_items(folder_id).await
    }

    async fn upload_item(&self, upload: UploadItem) -> AppResult<Item> {
        self.inner.upload_item(upload).await
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemPatch) -> AppResult<Item> {
        self.inner.update_item(id, patch).await
    }

    async fn delete_item(&self, id: &ItemId) -> AppResult<()> {
        self.inner.delete_item(id).await
    }

    async fn replace_item_content(
        &self,
        id: &ItemId,
        file: FileBlob,
        thumbnail: Option<String>,
    ) -> AppResult<Item> {
        self.inner.replace_item_content(id, file, thumbnail).await
    }

    async fn download_item(&self, id: &ItemId) -> AppResult<Bytes> {
        self.inner.download_item(id).await
    }

    async fn bulk_delete_items(&self, ids: &[ItemId]) -> AppResult<()> {
        self.inner.bulk_delete_items(ids).await
    }

    async fn bulk_move_items(&self, ids: &[ItemId], folder_id: &FolderId) -> AppResult<()> {
        self.inner.bulk_move_items(ids, folder_id).await
    }

    async fn bulk_tag_items(&self, _ids: &[ItemId], _tags: &[String]) -> AppResult<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(AppError::external("bulk_tag_items failed: store unavailable"))
    }

    async fn import_from_url(&self, url: &str, folder_id: &FolderId) -> AppResult<Item> {
        self.inner.import_from_url(url, folder_id).await
    }

    async fn storage_usage(&self) -> AppResult<StorageUsage> {
        self.inner.storage_usage().await
    }
}

#[tokio::test]
async fn test_failed_move_rolls_back_and_notifies() {
    let t = library().await;
    let mut notices = t.library.subscribe();
    t.store.fail_operation("bulk_move_items");
    t.library.toggle_selection(&iid("m1"));
    t.library.toggle_selection(&iid("m2"));

    let outcome = t.library.move_selection(&fid("b")).await.expect("move");
    assert!(!outcome.is_confirmed());
    let notice = outcome.notice().expect("failure notice");
    assert_eq!(notice.message, "Failed to move 2 models");
    assert!(notice.rolled_back);

    assert_eq!(ids_in(&t.library, "a"), ["m1", "m2"]);
    assert_eq!(t.library.selection(), vec![iid("m1"), iid("m2")]);

    let broadcast = notices.try_recv().expect("broadcast notice");
    assert!(broadcast.is_error());
    assert_eq!(broadcast.operation, "bulk_move");
}

#[tokio::test]
async fn test_failure_without_rollback_keeps_local_change() {
    let t = TestLibrary::builder()
        .folder("a", "Inbox", None)
        .folder("b", "Archive", None)
        .item("m1", "tiger.stl", "a")
        .without_rollback()
        .build()
        .await;
    t.store.fail_operation("bulk_move_items");
    t.library.toggle_selection(&iid("m1"));

    let outcome = t.library.move_selection(&fid("b")).await.expect("move");
    let notice = outcome.notice().expect("failure notice");
    assert!(!notice.rolled_back);
    assert_eq!(ids_in(&t.library, "b"), ["m1"]);

    let reopened = t.reopen().await;
    assert_eq!(ids_in(&reopened, "a"), ["m1"]);
}

#[tokio::test]
async fn test_failed_create_drops_placeholder() {
    let t = TestLibrary::builder().without_rollback().build().await;
    t.store.fail_operation("create_folder");

    let outcome = t.library.create_folder("Vehicles", None).await.expect("create");
    assert!(!outcome.is_confirmed());
    assert!(t.library.folders().is_empty());
}

#[tokio::test]
async fn test_failed_delete_restores_items() {
    let t = library().await;
    t.store.fail_operation("bulk_delete_items");
    t.library.toggle_selection(&iid("m2"));
    t.library.toggle_selection(&iid("m3"));

    t.library.request_selection_delete().expect("request");
    let outcome = t.library.confirm_delete().await.expect("confirm");
    assert!(!outcome.is_confirmed());
    assert_eq!(t.library.items().len(), 3);
    assert!(t.library.item(&iid("m3")).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations() {
    let t = library().await;

    let moving = {
        let library = t.library.clone();
        tokio::spawn(async move {
            library
                .bulk()
                .move_items(vault_service::BulkTarget::Explicit(vec![iid("m1")]), fid("b"))
                .await
        })
    };
    let tagging = {
        let library = t.library.clone();
        tokio::spawn(async move {
            library
                .bulk()
                .tag_items(
                    vault_service::BulkTarget::Explicit(vec![iid("m2"), iid("m3")]),
                    &["shared".to_string()],
                )
                .await
        })
    };
    let creating = {
        let library = t.library.clone();
        tokio::spawn(async move { library.create_folder("Fresh", Some(fid("a"))).await })
    };

    assert!(moving.await.expect("join").expect("move").is_confirmed());
    assert!(tagging.await.expect("join").expect("tag").is_confirmed());
    assert!(creating.await.expect("join").expect("create").is_confirmed());

    assert_eq!(ids_in(&t.library, "b"), ["m1", "m3"]);
    assert!(t.library.item(&iid("m2")).expect("m2").has_tag("shared"));
    assert!(t.library.folders().iter().all(|f| !f.is_pending()));
    assert_eq!(t.library.folders().len(), 3);

    let reopened = t.reopen().await;
    assert_eq!(reopened.folders().len(), 3);
    assert_eq!(ids_in(&reopened, "b"), ["m1", "m3"]);
}

#[tokio::test]
async fn test_upload_renders_thumbnails_for_supported_types() {
    let t = library().await;
    let lib = t.library.clone().with_renderer(Arc::new(FixedRenderer));

    let files = vec![
        FileBlob::new("wolf.stl", b"solid wolf".to_vec()),
        FileBlob::new("notes.obj", b"v 0 0 0".to_vec()),
    ];
    let outcome = lib.upload_files(files, Some(fid("b"))).await.expect("upload");
    let UploadOutcome::Uploaded(report) = outcome else {
        panic!("expected a direct upload");
    };
    assert_eq!(report.uploaded.len(), 2);
    let wolf = report.uploaded.iter().find(|i| i.name == "wolf.stl").expect("wolf");
    let notes = report.uploaded.iter().find(|i| i.name == "notes.obj").expect("notes");
    assert_eq!(wolf.thumbnail.as_deref(), Some("data:image/png;base64,wolf.stl"));
    assert!(notes.thumbnail.is_none());
    assert!(lib.items().iter().all(|item| !item.is_pending()));
    assert_eq!(lib.usage().used, lib.items().iter().map(|i| i.size).sum::<u64>());
}

#[tokio::test]
async fn test_failed_upload_is_reported_per_file() {
    let t = library().await;
    t.store.fail_operation("upload_item");

    let outcome = t
        .library
        .upload_files(vec![FileBlob::new("wolf.stl", b"solid".to_vec())], Some(fid("a")))
        .await
        .expect("upload");
    let UploadOutcome::Uploaded(report) = outcome else {
        panic!("expected a direct upload");
    };
    assert!(!report.is_complete());
    assert_eq!(report.failed, ["wolf.stl"]);
    assert_eq!(t.library.items().len(), 3);
    assert_eq!(t.library.uploads_in_flight(), 0);
}

#[tokio::test]
async fn test_replace_requires_same_extension() {
    let t = library().await;

    let err = t
        .library
        .replace_item_content(&iid("m1"), FileBlob::new("tiger.3mf", b"pk".to_vec()))
        .await
        .expect_err("extension mismatch");
    assert!(err.is_validation());
    assert_eq!(t.store.mutation_count(), 0);

    let outcome = t
        .library
        .replace_item_content(&iid("m1"), FileBlob::new("tiger-v2.STL", b"solid bigger tiger".to_vec()))
        .await
        .expect("replace");
    assert!(outcome.is_confirmed());
    assert_eq!(t.library.item(&iid("m1")).expect("m1").size, 18);
}

#[tokio::test]
async fn test_update_and_dimensions() {
    let t = library().await;
    let patch = ItemPatch {
        name: Some("Bengal Tiger.stl".to_string()),
        description: Some("Striped".to_string()),
        ..ItemPatch::default()
    };
    assert!(t.library.update_item(&iid("m1"), patch).await.expect("update").is_confirmed());
    let item = t.library.item(&iid("m1")).expect("m1");
    assert_eq!(item.name, "Bengal Tiger.stl");
    assert_eq!(item.description, "Striped");

    let dims = Dimensions {
        x: 10.0,
        y: 20.0,
        z: 5.5,
    };
    assert!(t.library.record_dimensions(&iid("m1"), dims).await.expect("dims").is_some());
    assert!(t.library.record_dimensions(&iid("m1"), dims).await.expect("dims").is_none());
    assert_eq!(t.calls("update_item"), 2);

    let err = t
        .library
        .update_item(&iid("m1"), ItemPatch::default())
        .await
        .expect_err("empty patch");
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_suggested_metadata_unions_tags() {
    let t = library().await;
    let lib = t.library.clone().with_metadata_generator(Arc::new(FixedMetadata));

    let outcome = lib.suggest_metadata(&iid("m1")).await.expect("suggest");
    assert!(outcome.is_confirmed());
    let item = lib.item(&iid("m1")).expect("m1");
    let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
    assert_eq!(tags, ["cat", "predator"]);
    assert_eq!(item.description, "A detailed tiger.stl");

    let err = t.library.suggest_metadata(&iid("m1")).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_import_from_url() {
    let t = library().await;

    let err = t
        .library
        .import_from_url("ftp://example.com/model", &fid("a"))
        .await
        .expect_err("bad scheme");
    assert!(err.is_validation());

    let outcome = t
        .library
        .import_from_url("https://example.com/model/42-steam-engine", &fid("a"))
        .await
        .expect("import");
    let item = outcome.item().expect("imported item");
    assert_eq!(item.name, "Steam Engine.stl");
    assert!(item.has_tag("imported"));
    assert_eq!(ids_in(&t.library, "a").len(), 3);
}

#[tokio::test]
async fn test_pending_upload_with_invalid_destination_is_kept() {
    let t = library().await;

    let outcome = t
        .library
        .upload_files(vec![FileBlob::new("wolf.stl", b"solid".to_vec())], None)
        .await
        .expect("stage");
    assert!(matches!(outcome, UploadOutcome::AwaitingDestination(_)));

    let err = t.library.confirm_upload(&fid("ghost")).await.expect_err("unknown");
    assert!(err.is_validation());
    assert!(t.library.pending_upload().is_some());

    assert!(t.library.cancel_upload().is_some());
    assert_eq!(t.calls("upload_item"), 0);
}

#[tokio::test]
async fn test_failed_tag_keeps_move_confirmed_meanwhile() {
    let t = library().await;
    let stalled = Arc::new(StalledTagStore::new(t.store.clone()));
    let remote: Arc<dyn RemoteStore> = stalled.clone();
    let lib = Library::new(remote, &t.config);
    lib.load().await.expect("load");

    let tagging = {
        let library = lib.clone();
        tokio::spawn(async move {
            library
                .bulk()
                .tag_items(BulkTarget::Explicit(vec![iid("m1")]), &["rare".to_string()])
                .await
        })
    };
    stalled.entered.notified().await;
    assert!(lib.item(&iid("m1")).expect("m1").has_tag("rare"));

    let moved = lib
        .bulk()
        .move_items(BulkTarget::Explicit(vec![iid("m1")]), fid("b"))
        .await
        .expect("move");
    assert!(moved.is_confirmed());

    stalled.release.notify_one();
    let tagged = tagging.await.expect("join").expect("tag");
    assert!(tagged.notice().expect("failure notice").rolled_back);

    let item = lib.item(&iid("m1")).expect("m1");
    assert_eq!(item.folder_id, fid("b"));
    assert!(item.has_tag("cat"));
    assert!(!item.has_tag("rare"));

    let remote = t
        .store
        .items()
        .await
        .into_iter()
        .find(|i| i.id == iid("m1"))
        .expect("remote m1");
    assert_eq!(remote.folder_id, item.folder_id);
    assert_eq!(remote.tags, item.tags);
}

#[tokio::test]
async fn test_failed_update_restores_only_patched_fields() {
    let t = library().await;
    t.store.fail_operation("update_item");
    let patch = ItemPatch {
        name: Some("Bengal Tiger.stl".to_string()),
        ..ItemPatch::default()
    };

    let outcome = t.library.update_item(&iid("m1"), patch).await.expect("update");
    assert!(!outcome.is_confirmed());
    let item = t.library.item(&iid("m1")).expect("m1");
    assert_eq!(item.name, "tiger.stl");
    assert!(item.has_tag("cat"));
}

#[tokio::test]
async fn test_upload_beyond_capacity_is_refused_before_the_store() {
    let t = TestLibrary::builder()
        .folder("a", "Inbox", None)
        .item("m1", "tiger.stl", "a")
        .capacity(16)
        .build()
        .await;
    let big = FileBlob::new("whale.stl", vec![b's'; 12]);

    let err = t
        .library
        .upload_files(vec![big.clone()], Some(fid("a")))
        .await
        .expect_err("over capacity");
    assert!(err.is_validation());
    assert_eq!(t.library.uploads_in_flight(), 0);

    t.library.upload_files(vec![big], None).await.expect("stage");
    let err = t.library.confirm_upload(&fid("a")).await.expect_err("over capacity");
    assert!(err.is_validation());
    assert!(t.library.pending_upload().is_some());
    assert_eq!(t.calls("upload_item"), 0);
}
