//! Upload persistence and public media URLs.
//!
//! Uploaded photos are written under `<data_dir>/uploads` with fresh UUID
//! file names; rendered documents go to `<data_dir>/output`. Media links
//! handed to the QR stage are built from the configured public base URL.

use std::path::{Path, PathBuf};

use base64::Engine;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A photo as received from the upload intake.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A persisted upload.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Original upload file name
    pub file_name: String,
    pub content_type: String,
    /// Location on disk
    pub path: PathBuf,
    /// Public URL for the media link / QR payload
    pub public_url: String,
}

/// Whether an upload is usable as pipeline input.
pub fn is_supported_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Disk-backed store for uploads and rendered documents.
pub struct FileStore {
    uploads_dir: PathBuf,
    output_dir: PathBuf,
    public_base_url: String,
}

impl FileStore {
    /// Create the store, bootstrapping its directories.
    pub async fn new(data_dir: &Path, public_base_url: &str) -> Result<Self, FileStoreError> {
        let uploads_dir = data_dir.join("uploads");
        let output_dir = data_dir.join("output");
        for dir in [&uploads_dir, &output_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| FileStoreError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(Self {
            uploads_dir,
            output_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Directory rendered documents are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist every supported image upload; unsupported content types are
    /// skipped. The caller decides whether an empty result is an error.
    pub async fn save_images(
        &self,
        photos: &[UploadedPhoto],
    ) -> Result<Vec<StoredImage>, FileStoreError> {
        let mut stored = Vec::new();
        for photo in photos {
            if !is_supported_image(&photo.content_type) {
                tracing::debug!(
                    file_name = %photo.file_name,
                    content_type = %photo.content_type,
                    "Skipping non-image upload"
                );
                continue;
            }
            let file_name = format!("{}{}", Uuid::new_v4(), extension_for(&photo.content_type));
            let path = self.uploads_dir.join(&file_name);
            tokio::fs::write(&path, &photo.bytes)
                .await
                .map_err(|e| FileStoreError::Io {
                    path: path.clone(),
                    source: e,
                })?;
            stored.push(StoredImage {
                file_name: photo.file_name.clone(),
                content_type: photo.content_type.clone(),
                public_url: format!("{}/media/{}", self.public_base_url, file_name),
                path,
            });
        }
        Ok(stored)
    }

    /// Read a stored image back as a `data:` URI for the vision API.
    pub async fn read_data_uri(&self, image: &StoredImage) -> Result<String, FileStoreError> {
        let bytes = tokio::fs::read(&image.path)
            .await
            .map_err(|e| FileStoreError::Io {
                path: image.path.clone(),
                source: e,
            })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:{};base64,{}", image.content_type, encoded))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/heic" => ".heic",
        _ => ".img",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(name: &str, content_type: &str) -> UploadedPhoto {
        UploadedPhoto {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_saves_only_supported_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "http://example.com/").await.unwrap();

        let stored = store
            .save_images(&[
                photo("a.jpg", "image/jpeg"),
                photo("notes.txt", "text/plain"),
                photo("b.png", "image/png"),
            ])
            .await
            .unwrap();

        assert_eq!(stored.len(), 2);
        assert!(stored[0].path.exists());
        assert!(stored[0].public_url.starts_with("http://example.com/media/"));
        assert!(stored[0].public_url.ends_with(".jpg"));
        assert!(stored[1].public_url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_data_uri_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "http://example.com").await.unwrap();
        let stored = store
            .save_images(&[photo("a.jpg", "image/jpeg")])
            .await
            .unwrap();

        let uri = store.read_data_uri(&stored[0]).await.unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(uri.ends_with(&base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3])));
    }

    #[test]
    fn test_supported_image_filter() {
        assert!(is_supported_image("image/jpeg"));
        assert!(is_supported_image("image/png"));
        assert!(!is_supported_image("video/mp4"));
        assert!(!is_supported_image("application/pdf"));
    }
}
