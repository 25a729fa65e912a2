//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use vault_core::config::AppConfig;
use vault_core::types::{FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::Item;
use vault_remote::RemoteStore;
use vault_remote::providers::MemoryStore;
use vault_service::Library;

/// Capacity reported by the test store.
pub const CAPACITY: u64 = 10 * 1024 * 1024;

/// Test library context
pub struct TestLibrary {
    /// The in-memory store behind the library, for asserting round trips
    pub store: Arc<MemoryStore>,
    /// The library under test
    pub library: Library,
    /// Application config
    pub config: AppConfig,
}

impl TestLibrary {
    /// Start a fixture with default configuration
    pub fn builder() -> TestLibraryBuilder {
        TestLibraryBuilder::default()
    }

    /// Reload a second library from the same store, as a fresh session would
    pub async fn reopen(&self) -> Library {
        let store: Arc<dyn RemoteStore> = self.store.clone();
        let library = Library::new(store, &self.config);
        library.load().await.expect("Failed to reload library");
        library
    }

    /// Number of remote calls of one operation
    pub fn calls(&self, operation: &str) -> usize {
        self.store.calls_for(operation).len()
    }
}

/// Builds a seeded store and a loaded library
#[derive(Default)]
pub struct TestLibraryBuilder {
    folders: Vec<Folder>,
    items: Vec<(Item, Vec<u8>)>,
    rollback: Option<bool>,
    capacity: Option<u64>,
}

impl TestLibraryBuilder {
    /// Add a folder (`parent` of `None` for root level)
    pub fn folder(mut self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.folders
            .push(Folder::new(fid(id), name, parent.map(fid)));
        self
    }

    /// Add an item with a small body; later items are newer
    pub fn item(self, id: &str, name: &str, folder: &str) -> Self {
        self.tagged_item(id, name, folder, &[])
    }

    /// Add an item carrying tags
    pub fn tagged_item(mut self, id: &str, name: &str, folder: &str, tags: &[&str]) -> Self {
        let content = format!("solid {id}").into_bytes();
        let item = Item {
            id: iid(id),
            name: name.to_string(),
            folder_id: fid(folder),
            size: content.len() as u64,
            date_added: 1_700_000_000_000 + self.items.len() as i64,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: String::new(),
            thumbnail: None,
            dimensions: None,
            url: None,
        };
        self.items.push((item, content));
        self
    }

    /// Keep local state diverged on remote failure
    pub fn without_rollback(mut self) -> Self {
        self.rollback = Some(false);
        self
    }

    /// Report a different store capacity in bytes
    pub fn capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Seed the store and load a library over it
    pub async fn build(self) -> TestLibrary {
        let mut config = AppConfig::default();
        config.remote.provider = "memory".to_string();
        if let Some(rollback) = self.rollback {
            config.sync.rollback_on_failure = rollback;
        }

        let store = Arc::new(MemoryStore::with_folders(self.capacity.unwrap_or(CAPACITY), self.folders));
        for (item, content) in self.items {
            store.seed_item(item, content).await;
        }

        let remote: Arc<dyn RemoteStore> = store.clone();
        let library = Library::new(remote, &config);
        library.load().await.expect("Failed to load library");

        TestLibrary {
            store,
            library,
            config,
        }
    }
}

/// Parse a folder id
pub fn fid(raw: &str) -> FolderId {
    FolderId::parse(raw).expect("valid folder id")
}

/// Parse an item id
pub fn iid(raw: &str) -> ItemId {
    ItemId::parse(raw).expect("valid item id")
}

/// Sorted ids of the library's items inside a folder
pub fn ids_in(library: &Library, folder: &str) -> Vec<String> {
    let folder = fid(folder);
    let mut ids: Vec<String> = library
        .items()
        .into_iter()
        .filter(|item| item.folder_id == folder)
        .map(|item| item.id.to_string())
        .collect();
    ids.sort();
    ids
}
