//! Filesystem storage for post images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Directory, relative to the media root, that post images are written to.
pub const POST_IMAGE_DIR: &str = "posts";

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Path relative to the media root, e.g. `posts/cat-1a2b3c4d.gif`.
    pub stored_path: String,
    pub checksum: String,
    pub size_bytes: u64,
}

/// Filesystem-backed media storage.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Open the media root, creating it when absent.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(root.join(POST_IMAGE_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a post image. `extension` replaces whatever the client named the file.
    pub async fn store_post_image(
        &self,
        original_name: &str,
        extension: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored_path = build_stored_path(original_name, extension);
        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        let checksum = hex::encode(Sha256::digest(&data));

        Ok(StoredUpload {
            stored_path,
            checksum,
            size_bytes: data.len() as u64,
        })
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Delete an image. Already gone is fine.
    pub async fn delete(&self, stored_path: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

fn build_stored_path(original_name: &str, extension: &str) -> String {
    let stem = sanitize_stem(original_name);
    let identifier = Uuid::new_v4().simple().to_string();
    format!("{POST_IMAGE_DIR}/{stem}-{}.{extension}", &identifier[..8])
}

fn sanitize_stem(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("image");
    let base = slugify(stem);
    if base.is_empty() {
        "image".to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_path_lives_under_posts_directory() {
        let path = build_stored_path("Small 1.GIF", "gif");
        assert!(path.starts_with("posts/small-1-"), "{path}");
        assert!(path.ends_with(".gif"));
    }

    #[test]
    fn unusable_names_fall_back_to_image() {
        assert_eq!(sanitize_stem("../../"), "image");
        assert_eq!(sanitize_stem("Котик.png"), "kotik");
    }

    #[tokio::test]
    async fn store_read_and_delete_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let stored = storage
            .store_post_image("cat.gif", "gif", Bytes::from_static(b"GIF89a"))
            .await
            .expect("stored");
        assert_eq!(stored.size_bytes, 6);
        assert_eq!(stored.checksum.len(), 64);

        let read = storage.read(&stored.stored_path).await.expect("read");
        assert_eq!(&read[..], b"GIF89a");

        storage.delete(&stored.stored_path).await.expect("delete");
        storage.delete(&stored.stored_path).await.expect("idempotent");
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        assert!(matches!(
            storage.read("../secret").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read("/etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }
}
