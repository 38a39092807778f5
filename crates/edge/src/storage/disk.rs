//! Buckets as directories on disk.
//!
//! Layout: `<root>/<bucket>/<sha256(key)>.json` holds the status, headers,
//! original key and the name of the body file. Every put writes a fresh
//! `<sha256(key)>.<generation>.body` and swaps the metadata file in by rename,
//! so readers see either the old entry or the new one, never a mix. Body
//! files are never rewritten; the replaced one is removed after the swap.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use super::CacheStorage;
use crate::error::CacheError;
use crate::exchange::EdgeResponse;

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    /// File name of the body, next to this file.
    body: String,
    stored_at: DateTime<Utc>,
}

/// Buckets persisted under a root directory.
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    /// Use `root` as the cache directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, CacheError> {
        let valid = !bucket.is_empty()
            && bucket
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !bucket.starts_with('.');
        if valid {
            Ok(self.root.join(bucket))
        } else {
            Err(CacheError::InvalidBucket(bucket.to_string()))
        }
    }
}

fn entry_stem(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn meta_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.json"))
}

/// A body file name is only trusted if it belongs to this entry.
fn owns_body(stem: &str, body: &str) -> bool {
    body.strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".body"))
        .is_some_and(|generation| {
            !generation.is_empty() && generation.chars().all(|c| c.is_ascii_hexdigit())
        })
}

async fn read_meta(path: &Path) -> Result<Option<EntryMeta>, CacheError> {
    match read_optional(path).await? {
        Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
        None => Ok(None),
    }
}

/// Read a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn headers_to_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn pairs_to_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<EdgeResponse>, CacheError> {
        let dir = self.bucket_dir(bucket)?;
        let stem = entry_stem(key);

        let Some(meta) = read_meta(&meta_path(&dir, &stem)).await? else {
            return Ok(None);
        };
        if meta.key != key || !owns_body(&stem, &meta.body) {
            return Ok(None);
        }
        // Replaced by a concurrent put since the metadata was read
        let Some(body) = read_optional(&dir.join(&meta.body)).await? else {
            return Ok(None);
        };
        let Ok(status) = StatusCode::from_u16(meta.status) else {
            return Ok(None);
        };

        Ok(Some(EdgeResponse {
            status,
            headers: pairs_to_headers(&meta.headers),
            body: Bytes::from(body),
        }))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        response: &EdgeResponse,
    ) -> Result<(), CacheError> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await?;
        let stem = entry_stem(key);
        let generation = Uuid::new_v4().simple().to_string();
        let target = meta_path(&dir, &stem);

        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status.as_u16(),
            headers: headers_to_pairs(&response.headers),
            body: format!("{stem}.{generation}.body"),
            stored_at: Utc::now(),
        };

        let previous = read_meta(&target).await.ok().flatten().map(|m| m.body);

        fs::write(dir.join(&meta.body), &response.body).await?;
        let staging = dir.join(format!("{stem}.{generation}.json.tmp"));
        fs::write(&staging, serde_json::to_vec(&meta)?).await?;
        fs::rename(&staging, &target).await?;

        if let Some(old) = previous.filter(|old| *old != meta.body && owns_body(&stem, old)) {
            match fs::remove_file(dir.join(old)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn bucket_names(&self) -> Result<Vec<String>, CacheError> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        let dir = self.bucket_dir(bucket)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
