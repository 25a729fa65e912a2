//! Zip packaging for batch downloads.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use tracing::info;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use vault_core::error::{AppError, ErrorKind};
use vault_core::result::AppResult;
use vault_core::types::ItemId;

/// An item that could not be fetched for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    /// The item that failed.
    pub item_id: ItemId,
    /// Its display name.
    pub name: String,
    /// Why it failed.
    pub reason: String,
}

/// A finished batch download.
#[derive(Debug, Clone)]
pub struct DownloadArchive {
    /// Suggested file name (`<prefix>-<ms>.zip`).
    pub file_name: String,
    /// Zip bytes.
    pub data: Bytes,
    /// Entry names, in archive order.
    pub entries: Vec<String>,
    /// Items that were skipped.
    pub failures: Vec<DownloadFailure>,
}

impl DownloadArchive {
    /// Package fetched files into a zip archive.
    ///
    /// Entry names that collide are disambiguated with a ` (n)` suffix
    /// before the extension.
    pub fn build(
        prefix: &str,
        files: Vec<(String, Bytes)>,
        failures: Vec<DownloadFailure>,
    ) -> AppResult<Self> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut used = HashSet::new();
        let mut entries = Vec::with_capacity(files.len());

        for (name, data) in files {
            let entry = unique_entry_name(&name, &mut used);
            writer.start_file(entry.as_str(), options).map_err(zip_error)?;
            writer.write_all(&data)?;
            entries.push(entry);
        }

        let cursor = writer.finish().map_err(zip_error)?;
        Ok(Self {
            file_name: format!("{prefix}-{}.zip", Utc::now().timestamp_millis()),
            data: Bytes::from(cursor.into_inner()),
            entries,
            failures,
        })
    }

    /// Whether some items were skipped.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Write the archive into `dir`, returning the full path.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> AppResult<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.data).await?;
        info!(path = %path.display(), entries = self.entries.len(), "Saved download archive");
        Ok(path)
    }
}

fn zip_error(err: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Internal, format!("Failed to build archive: {err}"), err)
}

/// Pick an entry name not yet in `used`, and record it.
fn unique_entry_name(name: &str, used: &mut HashSet<String>) -> String {
    let name = if name.trim().is_empty() { "model" } else { name };
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
        _ => (name, String::new()),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
