//! Copies images still served by the legacy CDN into local uploads and points
//! products and categories at the copies.
//!
//! Dry runs plan the local URLs without downloading or writing anything.
//! With `apply`, each distinct URL is downloaded once per folder, stored
//! through [`MediaStore::save_as`], and the catalog rows are updated in a
//! single transaction after all downloads finished. A failed download is
//! reported and its URL left untouched.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use prerna_db::{decode_json, encode_json, RepositoryError};

use super::rewrite::{is_hosted_image_url, normalize_local_url};
use crate::utils::media::{MediaError, MediaStore, UploadFolder};

/// Per-download deadline.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_STEM: &str = "asset";
const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not store image: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for FetchError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Where image bytes come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn download(&self, url: &str) -> Result<DownloadedImage, FetchError>;
}

/// Downloads over HTTPS with [`DOWNLOAD_TIMEOUT`].
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn download(&self, url: &str) -> Result<DownloadedImage, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!(url, size = bytes.len(), "downloaded image");
        Ok(DownloadedImage {
            bytes,
            content_type,
        })
    }
}

/// Lowercase the value and collapse every run of other characters into `-`.
pub fn sanitize_stem(value: &str) -> String {
    let mut stem = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            stem.push(c);
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    stem.trim_matches('-').to_string()
}

/// File stem and extension taken from the last path segment of a URL.
fn name_and_extension(url: &str) -> (String, Option<String>) {
    let Some(path) = normalize_local_url(url) else {
        return (DEFAULT_STEM.to_string(), None);
    };
    let base = path.rsplit('/').next().unwrap_or_default();
    let base = urlencoding::decode(base).map_or_else(|_| base.to_string(), |d| d.into_owned());

    let (name, extension) = match base.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() => (name, Some(ext)),
        _ => (base.as_str(), None),
    };

    let stem = sanitize_stem(name);
    let stem = if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem
    };
    let extension = extension
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty());
    (stem, extension)
}

/// File extension for an image `Content-Type`.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let normalized = content_type.to_ascii_lowercase();
    [
        ("image/jpeg", "jpg"),
        ("image/jpg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
        ("image/gif", "gif"),
        ("image/avif", "avif"),
        ("image/svg+xml", "svg"),
    ]
    .into_iter()
    .find_map(|(mime, ext)| normalized.contains(mime).then_some(ext))
}

fn local_file_name(stem: &str, extension: &str) -> String {
    format!(
        "{}-{}-{stem}.{extension}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4()
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDownload {
    pub table: &'static str,
    pub id: String,
    pub field: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct FetchReport {
    pub applied: bool,
    pub hosted_urls_seen: usize,
    pub urls_updated: usize,
    pub files_downloaded: usize,
    pub products_updated: usize,
    pub categories_updated: usize,
    pub unresolved: Vec<FailedDownload>,
}

pub struct ImageFetcher<S> {
    source: S,
    media: MediaStore,
}

impl<S: ImageSource> ImageFetcher<S> {
    pub fn new(source: S, media: MediaStore) -> Self {
        Self { source, media }
    }

    /// Local URL for `url`, downloading it when applying.
    async fn localize(
        &self,
        url: &str,
        folder: UploadFolder,
        apply: bool,
        cache: &mut HashMap<(&'static str, String), String>,
        report: &mut FetchReport,
    ) -> Result<String, FetchError> {
        let key = (folder.as_str(), url.to_string());
        if let Some(local) = cache.get(&key) {
            return Ok(local.clone());
        }

        let (stem, extension) = name_and_extension(url);
        let local = if apply {
            let image = self.source.download(url).await?;
            let extension = extension
                .or_else(|| {
                    image
                        .content_type
                        .as_deref()
                        .and_then(extension_for_content_type)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
            let file_name = local_file_name(&stem, &extension);
            let local = self.media.save_as(folder, &file_name, &image.bytes).await?;
            report.files_downloaded += 1;
            local
        } else {
            let extension = extension.as_deref().unwrap_or(DEFAULT_EXTENSION);
            MediaStore::url_for(folder, &local_file_name(&stem, extension))
        };

        cache.insert(key, local.clone());
        Ok(local)
    }

    /// Copy hosted product and category images, updating rows when `apply` is set.
    pub async fn run(&self, pool: &SqlitePool, apply: bool) -> Result<FetchReport, FetchError> {
        let mut report = FetchReport {
            applied: apply,
            ..Default::default()
        };
        let mut cache = HashMap::new();

        let mut product_updates = Vec::new();
        let products: Vec<(String, String)> = sqlx::query_as("SELECT id, images FROM product")
            .fetch_all(pool)
            .await?;
        for (id, raw) in products {
            let mut images: Vec<String> = decode_json("product.images", &raw)?;
            let mut changed = false;
            for (i, image) in images.iter_mut().enumerate() {
                if !is_hosted_image_url(image) {
                    continue;
                }
                report.hosted_urls_seen += 1;

                match self
                    .localize(image, UploadFolder::Products, apply, &mut cache, &mut report)
                    .await
                {
                    Ok(local) if local != *image => {
                        *image = local;
                        changed = true;
                        report.urls_updated += 1;
                    }
                    Ok(_) => {}
                    Err(err) => report.unresolved.push(FailedDownload {
                        table: "product",
                        id: id.clone(),
                        field: format!("images[{i}]"),
                        url: image.clone(),
                        reason: err.to_string(),
                    }),
                }
            }
            if changed {
                report.products_updated += 1;
                product_updates.push((id, images));
            }
        }

        let mut category_updates = Vec::new();
        let categories: Vec<(String, String)> = sqlx::query_as("SELECT id, image FROM category")
            .fetch_all(pool)
            .await?;
        for (id, image) in categories {
            if !is_hosted_image_url(&image) {
                continue;
            }
            report.hosted_urls_seen += 1;

            match self
                .localize(&image, UploadFolder::Categories, apply, &mut cache, &mut report)
                .await
            {
                Ok(local) if local != image => {
                    report.urls_updated += 1;
                    report.categories_updated += 1;
                    category_updates.push((id, local));
                }
                Ok(_) => {}
                Err(err) => report.unresolved.push(FailedDownload {
                    table: "category",
                    id,
                    field: "image".to_string(),
                    url: image,
                    reason: err.to_string(),
                }),
            }
        }

        if apply {
            let now = Utc::now();
            let mut tx = pool.begin().await?;
            for (id, images) in &product_updates {
                sqlx::query("UPDATE product SET images = ?, updated_at = ? WHERE id = ?")
                    .bind(encode_json(images)?)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            for (id, image) in &category_updates {
                sqlx::query("UPDATE category SET image = ?, updated_at = ? WHERE id = ?")
                    .bind(image)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
        }

        tracing::info!(
            applied = apply,
            seen = report.hosted_urls_seen,
            updated = report.urls_updated,
            downloaded = report.files_downloaded,
            unresolved = report.unresolved.len(),
            "hosted image fetch finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;

    use crate::modules::categories::repository::CategoryRepository;
    use crate::modules::products::models::{ProductDraft, ProductSpecs};
    use crate::modules::products::repository::ProductRepository;
    use crate::test_support::migrated_pool;

    const SILK: &str = "https://res.cloudinary.com/prerna/image/upload/v1712/Red%20Silk.JPG";
    const BANNER: &str = "https://res.cloudinary.com/prerna/image/upload/v1712/banner";
    const GONE: &str = "https://res.cloudinary.com/prerna/image/upload/v1712/gone.png";

    #[derive(Default)]
    struct StubSource {
        images: HashMap<&'static str, DownloadedImage>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn with(mut self, url: &'static str, bytes: &[u8], content_type: Option<&str>) -> Self {
            self.images.insert(
                url,
                DownloadedImage {
                    bytes: bytes.to_vec(),
                    content_type: content_type.map(str::to_string),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ImageSource for StubSource {
        async fn download(&self, url: &str) -> Result<DownloadedImage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.images.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    async fn seed(pool: &SqlitePool) -> (Uuid, Uuid) {
        let category = CategoryRepository::new(pool)
            .create(Uuid::now_v7(), "Silk", "silk", BANNER)
            .await
            .unwrap();
        let product = ProductRepository::new(pool)
            .create(
                Uuid::now_v7(),
                &ProductDraft {
                    name: "Red Silk".to_string(),
                    description: "Handwoven".to_string(),
                    price: Decimal::from(1200),
                    category_id: category.id,
                    images: vec![
                        SILK.to_string(),
                        "/uploads/products/local.jpg".to_string(),
                        SILK.to_string(),
                        GONE.to_string(),
                    ],
                    specs: ProductSpecs::default(),
                },
            )
            .await
            .unwrap();
        (category.id, product.id)
    }

    #[test]
    fn stems_are_lowercase_dashed() {
        assert_eq!(sanitize_stem("Red Silk_Saree (2)"), "red-silk-saree-2");
        assert_eq!(sanitize_stem("--Émerald--"), "merald");
        assert_eq!(sanitize_stem("___"), "");
    }

    #[test]
    fn names_come_from_the_url_path() {
        assert_eq!(
            name_and_extension(SILK),
            ("red-silk".to_string(), Some("jpg".to_string()))
        );
        assert_eq!(name_and_extension(BANNER), ("banner".to_string(), None));
        assert_eq!(
            name_and_extension("https://res.cloudinary.com/p/image/upload/%2B%2B.webp"),
            ("asset".to_string(), Some("webp".to_string()))
        );
        assert_eq!(name_and_extension(""), ("asset".to_string(), None));
    }

    #[test]
    fn extensions_follow_content_type() {
        assert_eq!(extension_for_content_type("image/jpeg; charset=binary"), Some("jpg"));
        assert_eq!(extension_for_content_type("IMAGE/PNG"), Some("png"));
        assert_eq!(extension_for_content_type("image/svg+xml"), Some("svg"));
        assert_eq!(extension_for_content_type("image/avif"), Some("avif"));
        assert_eq!(extension_for_content_type("text/html"), None);
    }

    #[tokio::test]
    async fn dry_run_plans_urls_without_downloading() {
        let pool = migrated_pool().await;
        let (_, product_id) = seed(&pool).await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(StubSource::default(), MediaStore::new(dir.path()));

        let report = fetcher.run(&pool, false).await.unwrap();
        assert!(!report.applied);
        assert_eq!(report.hosted_urls_seen, 4);
        assert_eq!(report.urls_updated, 4);
        assert_eq!(report.products_updated, 1);
        assert_eq!(report.categories_updated, 1);
        assert_eq!(report.files_downloaded, 0);
        assert!(report.unresolved.is_empty());
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("uploads").exists());

        let product = ProductRepository::new(&pool)
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.images[0], SILK);
    }

    #[tokio::test]
    async fn apply_downloads_once_and_rewrites_rows() {
        let pool = migrated_pool().await;
        let (category_id, product_id) = seed(&pool).await;
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        let source = StubSource::default()
            .with(SILK, b"silk", Some("image/jpeg"))
            .with(BANNER, b"banner", Some("image/png"));
        let fetcher = ImageFetcher::new(source, media.clone());

        let report = fetcher.run(&pool, true).await.unwrap();
        assert!(report.applied);
        assert_eq!(report.hosted_urls_seen, 4);
        assert_eq!(report.urls_updated, 3);
        assert_eq!(report.files_downloaded, 2);
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 3);

        assert_eq!(report.unresolved.len(), 1);
        let failed = &report.unresolved[0];
        assert_eq!(failed.table, "product");
        assert_eq!(failed.field, "images[3]");
        assert_eq!(failed.reason, "HTTP 404");

        let product = ProductRepository::new(&pool)
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap();
        assert!(product.images[0].starts_with("/uploads/products/"));
        assert!(product.images[0].ends_with("-red-silk.jpg"));
        assert_eq!(product.images[0], product.images[2]);
        assert_eq!(product.images[1], "/uploads/products/local.jpg");
        assert_eq!(product.images[3], GONE);
        assert_eq!(std::fs::read(media.resolve(&product.images[0]).unwrap()).unwrap(), b"silk");

        let category = CategoryRepository::new(&pool)
            .get_by_id(category_id)
            .await
            .unwrap()
            .unwrap();
        assert!(category.image.starts_with("/uploads/categories/"));
        assert!(category.image.ends_with("-banner.png"));
        assert!(category.updated_at > category.created_at);
    }
}
