//! HTTP remote store provider (REST binding over reqwest).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use vault_core::config::remote::RemoteConfig;
use vault_core::error::{AppError, ErrorKind};
use vault_core::result::AppResult;
use vault_core::types::{FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::{FileBlob, Item, ItemPatch, UploadItem};
use vault_entity::storage::StorageUsage;

use crate::store::RemoteStore;

/// Remote store reached over the ModelVault REST API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    api_base: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FolderBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a FolderId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkBody<'a> {
    ids: &'a [ItemId],
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<&'a FolderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportBody<'a> {
    url: &'a str,
    folder_id: &'a FolderId,
}

impl HttpStore {
    /// Create a new HTTP store from configuration.
    pub fn new(config: &RemoteConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            api_base: format!("{}/api", config.base_url.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Map a transport error into the application error space.
    fn transport(operation: &str, err: reqwest::Error) -> AppError {
        AppError::with_source(
            ErrorKind::ExternalService,
            format!("{operation}: request failed"),
            err,
        )
    }

    /// Turn a non-success status into an error, keeping the body as detail.
    async fn check(operation: &str, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        debug!(operation, %status, detail = %detail, "Remote store rejected request");
        let kind = match status {
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ErrorKind::Conflict,
            _ => ErrorKind::ExternalService,
        };
        Err(AppError::new(kind, format!("{operation} failed ({status}): {detail}")))
    }

    async fn json<T: DeserializeOwned>(operation: &str, response: Response) -> AppResult<T> {
        let response = Self::check(operation, response).await?;
        response.json::<T>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("{operation}: invalid response body"),
                e,
            )
        })
    }

    fn file_part(file: FileBlob) -> Part {
        Part::bytes(file.data.to_vec()).file_name(file.name)
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    fn provider_type(&self) -> &str {
        "http"
    }

    async fn list_folders(&self) -> AppResult<Vec<Folder>> {
        let response = self
            .client
            .get(self.url("/folders"))
            .send()
            .await
            .map_err(|e| Self::transport("list_folders", e))?;
        Self::json("list_folders", response).await
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&FolderId>) -> AppResult<Folder> {
        let response = self
            .client
            .post(self.url("/folders"))
            .json(&FolderBody { name, parent_id })
            .send()
            .await
            .map_err(|e| Self::transport("create_folder", e))?;
        Self::json("create_folder", response).await
    }

    async fn rename_folder(&self, id: &FolderId, name: &str) -> AppResult<Folder> {
        let response = self
            .client
            .patch(self.url(&format!("/folders/{id}")))
            .json(&FolderBody {
                name,
                parent_id: None,
            })
            .send()
            .await
            .map_err(|e| Self::transport("rename_folder", e))?;
        Self::json("rename_folder", response).await
    }

    async fn delete_folder(&self, id: &FolderId) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/folders/{id}")))
            .send()
            .await
            .map_err(|e| Self::transport("delete_folder", e))?;
        Self::check("delete_folder", response).await.map(|_| ())
    }

    async fn list_items(&self, folder_id: Option<&FolderId>) -> AppResult<Vec<Item>> {
        let mut request = self.client.get(self.url("/models"));
        if let Some(folder) = folder_id {
            request = request.query(&[("folderId", folder.as_str())]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Self::transport("list_items", e))?;
        Self::json("list_items", response).await
    }

    async fn upload_item(&self, upload: UploadItem) -> AppResult<Item> {
        let mut form = Form::new()
            .part("file", Self::file_part(upload.file))
            .text("folderId", upload.folder_id.to_string());
        if let Some(thumbnail) = upload.thumbnail {
            form = form.text("thumbnail", thumbnail);
        }
        if !upload.tags.is_empty() {
            form = form.text("tags", serde_json::to_string(&upload.tags)?);
        }
        let response = self
            .client
            .post(self.url("/models/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport("upload_item", e))?;
        Self::json("upload_item", response).await
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemPatch) -> AppResult<Item> {
        let response = self
            .client
            .patch(self.url(&format!("/models/{id}")))
            .json(patch)
            .send()
            .await
            .map_err(|e| Self::transport("update_item", e))?;
        Self::json("update_item", response).await
    }

    async fn delete_item(&self, id: &ItemId) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/models/{id}")))
            .send()
            .await
            .map_err(|e| Self::transport("delete_item", e))?;
        Self::check("delete_item", response).await.map(|_| ())
    }

    async fn replace_item_content(
        &self,
        id: &ItemId,
        file: FileBlob,
        thumbnail: Option<String>,
    ) -> AppResult<Item> {
        let mut form = Form::new().part("file", Self::file_part(file));
        if let Some(thumbnail) = thumbnail {
            form = form.text("thumbnail", thumbnail);
        }
        let response = self
            .client
            .put(self.url(&format!("/models/{id}/file")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport("replace_item_content", e))?;
        Self::json("replace_item_content", response).await
    }

    async fn download_item(&self, id: &ItemId) -> AppResult<Bytes> {
        let response = self
            .client
            .get(self.url(&format!("/models/{id}/download")))
            .send()
            .await
            .map_err(|e| Self::transport("download_item", e))?;
        Self::check("download_item", response)
            .await?
            .bytes()
            .await
            .map_err(|e| Self::transport("download_item", e))
    }

    async fn bulk_delete_items(&self, ids: &[ItemId]) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("/models/bulk-delete"))
            .json(&BulkBody {
                ids,
                folder_id: None,
                tags: None,
            })
            .send()
            .await
            .map_err(|e| Self::transport("bulk_delete_items", e))?;
        Self::check("bulk_delete_items", response).await.map(|_| ())
    }

    async fn bulk_move_items(&self, ids: &[ItemId], folder_id: &FolderId) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("/models/bulk-move"))
            .json(&BulkBody {
                ids,
                folder_id: Some(folder_id),
                tags: None,
            })
            .send()
            .await
            .map_err(|e| Self::transport("bulk_move_items", e))?;
        Self::check("bulk_move_items", response).await.map(|_| ())
    }

    async fn bulk_tag_items(&self, ids: &[ItemId], tags: &[String]) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("/models/bulk-tag"))
            .json(&BulkBody {
                ids,
                folder_id: None,
                tags: Some(tags),
            })
            .send()
            .await
            .map_err(|e| Self::transport("bulk_tag_items", e))?;
        Self::check("bulk_tag_items", response).await.map(|_| ())
    }

    async fn import_from_url(&self, url: &str, folder_id: &FolderId) -> AppResult<Item> {
        let response = self
            .client
            .post(self.url("/models/import"))
            .json(&ImportBody { url, folder_id })
            .send()
            .await
            .map_err(|e| Self::transport("import_from_url", e))?;
        Self::json("import_from_url", response).await
    }

    async fn storage_usage(&self) -> AppResult<StorageUsage> {
        let response = self
            .client
            .get(self.url("/storage-stats"))
            .send()
            .await
            .map_err(|e| Self::transport("storage_usage", e))?;
        Self::json("storage_usage", response).await
    }
}
