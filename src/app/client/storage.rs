//! Media bucket operations
//!
//! Upload, list, remove and public URL resolution for the public media
//! bucket used by the editorial tools for cover and inline images.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::config::ServiceEndpoint;
use super::http::HttpHandler;
use super::rest::{ensure_success, read_json};
use crate::app::models::MediaObject;
use crate::constants::service;
use crate::errors::{FetchError, StorageError, StorageResult};

/// Listing page size
const LIST_LIMIT: usize = 100;

/// Length of the random part of generated object names
const RANDOM_SUFFIX_LEN: usize = 10;

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    #[serde(default)]
    created_at: Option<String>,
}

/// Client for one storage bucket
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: Arc<HttpHandler>,
    endpoint: ServiceEndpoint,
    bucket: String,
}

impl StorageClient {
    pub fn new(http: Arc<HttpHandler>, endpoint: ServiceEndpoint, bucket: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn storage_url(&self, path: &str) -> StorageResult<Url> {
        let full = format!("{}/{}", service::STORAGE_PREFIX, path);
        self.endpoint.base_url.join(&full).map_err(|e| {
            StorageError::Fetch(FetchError::InvalidUrl {
                url: full,
                error: e.to_string(),
            })
        })
    }

    /// Public URL of an object. Does not check that the object exists.
    pub fn public_url(&self, path: &str) -> StorageResult<Url> {
        validate_name(path)?;
        self.storage_url(&format!("object/public/{}/{}", self.bucket, path))
    }

    /// Upload `bytes` as `name`, returning the stored object path
    ///
    /// Sent once: a retried upload of an existing name is rejected by the bucket.
    pub async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<String> {
        validate_name(name)?;
        let url = self.storage_url(&format!("object/{}/{}", self.bucket, name))?;

        let response = self
            .http
            .execute_once(|client| {
                client
                    .post(url.clone())
                    .header(CONTENT_TYPE, content_type)
                    .body(bytes.clone())
            })
            .await?;
        ensure_success(response).await?;

        tracing::info!("Uploaded {} to bucket {}", name, self.bucket);
        Ok(name.to_string())
    }

    /// Upload a local file under a generated unique name
    pub async fn upload_file(&self, path: &Path) -> StorageResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let original = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let name = unique_object_name(original);
        self.upload(&name, bytes, content_type_for(original)).await
    }

    /// List objects, newest first, without folder placeholders
    pub async fn list(&self) -> StorageResult<Vec<MediaObject>> {
        let url = self.storage_url(&format!("object/list/{}", self.bucket))?;
        let body = json!({
            "prefix": "",
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": {"column": "created_at", "order": "desc"},
        });

        let response = self
            .http
            .execute(|client| client.post(url.clone()).json(&body))
            .await?;
        let value = read_json(ensure_success(response).await?).await?;
        let listed: Vec<ListedObject> = serde_json::from_value(value).map_err(FetchError::from)?;

        listed
            .into_iter()
            .filter(|object| object.name != service::EMPTY_FOLDER_PLACEHOLDER)
            .map(|object| {
                let url = self.public_url(&object.name)?;
                Ok(MediaObject {
                    name: object.name,
                    url: url.to_string(),
                    created_at: object.created_at,
                })
            })
            .collect()
    }

    /// Remove objects by name
    pub async fn remove(&self, names: &[String]) -> StorageResult<()> {
        for name in names {
            validate_name(name)?;
        }
        let url = self.storage_url(&format!("object/{}", self.bucket))?;
        let body = json!({ "prefixes": names });

        let response = self
            .http
            .execute(|client| client.delete(url.clone()).json(&body))
            .await?;
        ensure_success(response).await?;

        tracing::info!("Removed {} object(s) from bucket {}", names.len(), self.bucket);
        Ok(())
    }
}

fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StorageError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// `{millis}-{random}.{ext}`, keeping the original extension
pub fn unique_object_name(original: &str) -> String {
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| fastrand::alphanumeric().to_ascii_lowercase())
        .collect();
    let millis = Utc::now().timestamp_millis();

    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => {
            format!("{}-{}.{}", millis, suffix, ext.to_ascii_lowercase())
        }
        _ => format!("{}-{}", millis, suffix),
    }
}

/// Content type from a file extension, images only
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_object_name_keeps_extension() {
        let name = unique_object_name("Cover Photo.JPG");
        assert!(name.ends_with(".jpg"));
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), RANDOM_SUFFIX_LEN + ".jpg".len());

        assert_ne!(unique_object_name("a.png"), unique_object_name("a.png"));
        assert!(!unique_object_name("README").contains('.'));
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("1700000000-abc.png").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../secret").is_err());
        assert!(validate_name("nested/name.png").is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("x.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("x.webp"), "image/webp");
        assert_eq!(content_type_for("x"), "application/octet-stream");
    }
}
