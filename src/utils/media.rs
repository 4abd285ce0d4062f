//! Local media storage under `<public_root>/uploads`.
//!
//! Stored files are addressed by public URLs of the form
//! `/uploads/<folder>/<file>`. Deletion is best-effort: failures are logged
//! and never bubble up to the request that triggered them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

pub const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

/// Folders accepted by the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    Products,
    Categories,
    Reviews,
}

impl UploadFolder {
    pub const ALL: [UploadFolder; 3] = [
        UploadFolder::Products,
        UploadFolder::Categories,
        UploadFolder::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::Products => "products",
            UploadFolder::Categories => "categories",
            UploadFolder::Reviews => "reviews",
        }
    }

    /// Customers may upload review photos without admin credentials.
    pub fn is_public(&self) -> bool {
        matches!(self, UploadFolder::Reviews)
    }
}

impl std::str::FromStr for UploadFolder {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "products" => Ok(UploadFolder::Products),
            "categories" => Ok(UploadFolder::Categories),
            "reviews" => Ok(UploadFolder::Reviews),
            _ => Err(()),
        }
    }
}

/// Image formats accepted for upload, keyed by MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/webp" => Some(ImageKind::Webp),
            "image/gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
            ImageKind::Gif => "gif",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    public_root: PathBuf,
}

impl MediaStore {
    pub fn new(public_root: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
        }
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.public_root.join("uploads")
    }

    /// Whether the URL points at a file this store manages.
    pub fn is_local_upload(url: &str) -> bool {
        url.starts_with(UPLOADS_PREFIX)
    }

    /// Map a root-relative public URL to a path inside the public root.
    ///
    /// Returns `None` for relative URLs and anything that tries to climb out
    /// of the public root.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        if !url.starts_with('/') {
            return None;
        }

        let normalized = url.replace('\\', "/");
        let mut path = self.public_root.clone();
        for component in normalized.split('/') {
            match component {
                "" | "." => continue,
                ".." => return None,
                part if part.contains(':') => return None,
                part => path.push(part),
            }
        }

        (path != self.public_root).then_some(path)
    }

    /// Create every upload folder.
    pub async fn ensure_folders(&self) -> Result<(), MediaError> {
        for folder in UploadFolder::ALL {
            tokio::fs::create_dir_all(self.uploads_dir().join(folder.as_str())).await?;
        }
        Ok(())
    }

    /// Write an image and return its public URL.
    pub async fn save(
        &self,
        folder: UploadFolder,
        kind: ImageKind,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let file_name = format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            kind.extension()
        );
        self.write(folder, &file_name, bytes).await
    }

    /// Write an image under a caller-chosen file name and return its public URL.
    ///
    /// The name must be a single path segment.
    pub async fn save_as(
        &self,
        folder: UploadFolder,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(MediaError::InvalidFileName(file_name.to_string()));
        }
        self.write(folder, file_name, bytes).await
    }

    /// Public URL a file named `file_name` in `folder` is served from.
    pub fn url_for(folder: UploadFolder, file_name: &str) -> String {
        format!("{UPLOADS_PREFIX}{}/{file_name}", folder.as_str())
    }

    async fn write(
        &self,
        folder: UploadFolder,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let dir = self.uploads_dir().join(folder.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), bytes).await?;

        Ok(Self::url_for(folder, file_name))
    }

    /// Remove the file behind a local upload URL. Returns whether a file was removed.
    pub async fn delete(&self, url: &str) -> bool {
        if !Self::is_local_upload(url) {
            return false;
        }
        let Some(path) = self.resolve(url) else {
            tracing::warn!(url, "refusing to delete upload outside the public root");
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(url, "deleted local upload");
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                tracing::warn!(url, error = %err, "failed deleting local upload");
                false
            }
        }
    }

    /// Best-effort removal of several uploads. Returns how many files were removed.
    pub async fn delete_many<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for url in urls {
            if self.delete(url.as_ref()).await {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_traversal_and_relative_urls() {
        let store = MediaStore::new("/srv/public");
        assert_eq!(
            store.resolve("/uploads/products/a.jpg"),
            Some(PathBuf::from("/srv/public/uploads/products/a.jpg"))
        );
        assert_eq!(
            store.resolve("\\uploads\\reviews\\b.png"),
            None,
            "backslash urls are not root-relative"
        );
        assert_eq!(
            store.resolve("/uploads\\reviews\\b.png"),
            Some(PathBuf::from("/srv/public/uploads/reviews/b.png"))
        );
        assert_eq!(store.resolve("/uploads/../../etc/passwd"), None);
        assert_eq!(store.resolve("uploads/products/a.jpg"), None);
        assert_eq!(store.resolve("/"), None);
    }

    #[test]
    fn parses_folders_and_image_kinds() {
        assert_eq!("reviews".parse::<UploadFolder>(), Ok(UploadFolder::Reviews));
        assert!("avatars".parse::<UploadFolder>().is_err());
        assert!(UploadFolder::Reviews.is_public());
        assert!(!UploadFolder::Products.is_public());

        assert_eq!(ImageKind::from_mime("image/jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_mime("IMAGE/PNG").map(|k| k.extension()), Some("png"));
        assert_eq!(ImageKind::from_mime("image/svg+xml"), None);
    }

    #[tokio::test]
    async fn save_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let url = store
            .save(UploadFolder::Products, ImageKind::Webp, b"webp")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/products/"));
        assert!(url.ends_with(".webp"));

        let path = store.resolve(&url).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"webp");

        assert!(store.delete(&url).await);
        assert!(!path.exists());
        // Second delete is a silent no-op.
        assert!(!store.delete(&url).await);
    }

    #[tokio::test]
    async fn save_as_keeps_name_inside_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let url = store
            .save_as(UploadFolder::Categories, "1-abc-silk.avif", b"avif")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/categories/1-abc-silk.avif");
        assert!(store.resolve(&url).unwrap().exists());

        for name in ["", "../escape.jpg", "a/b.jpg", ".hidden"] {
            assert!(matches!(
                store.save_as(UploadFolder::Categories, name, b"x").await,
                Err(MediaError::InvalidFileName(_))
            ));
        }
    }

    #[tokio::test]
    async fn delete_many_skips_remote_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let local = store
            .save(UploadFolder::Categories, ImageKind::Png, b"png")
            .await
            .unwrap();

        let removed = store
            .delete_many([
                local.as_str(),
                "https://res.cloudinary.com/demo/image/upload/sample.jpg",
                "/uploads/categories/missing.png",
            ])
            .await;
        assert_eq!(removed, 1);
    }
}
