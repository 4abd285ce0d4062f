//! Rewrites hosted image URLs stored in the catalog to local `/uploads/...`
//! paths.
//!
//! A URL is replaced when an explicit mapping points at a file that exists
//! under the public root, or (outside strict mode) when exactly one local
//! file shares its file name. Everything else is reported as unresolved and
//! left untouched. Nothing is written unless `apply` is set.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use thiserror::Error;

use prerna_db::{decode_json, encode_json, RepositoryError};

use crate::modules::content::models::DispatchVideo;

static HOSTED_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cloudinary\.com.*/image/upload/").expect("valid hosted image regex")
});

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("mapping file {path} could not be read: {source}")]
    MappingIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("mapping file is not valid json: {0}")]
    MappingJson(#[from] serde_json::Error),

    #[error("failed scanning {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for RewriteError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Whether the URL is an image hosted on the legacy CDN.
pub fn is_hosted_image_url(url: &str) -> bool {
    HOSTED_IMAGE_RE.is_match(url)
}

/// Normalize a mapping target to a root-relative URL path.
///
/// Absolute URLs keep only their path, `public/` prefixes are dropped and
/// backslashes become slashes.
pub fn normalize_local_url(value: &str) -> Option<String> {
    let input = value.trim();
    if input.is_empty() {
        return None;
    }

    let lower = input.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let after_scheme = &input[input.find("://")? + 3..];
        let path = after_scheme
            .find('/')
            .map_or("/", |start| &after_scheme[start..]);
        let path = path.split(['?', '#']).next().unwrap_or(path);
        return Some(path.replace('\\', "/"));
    }

    if input.starts_with('/') {
        return Some(input.replace('\\', "/"));
    }

    let relative = if lower.starts_with("public/") || lower.starts_with("public\\") {
        &input["public/".len()..]
    } else {
        input
    };
    Some(format!("/{}", relative.replace('\\', "/")))
}

/// Lowercased, percent-decoded file name of a hosted URL.
fn hosted_file_name(url: &str) -> Option<String> {
    let path = normalize_local_url(url)?;
    let name = path.rsplit('/').next().filter(|name| !name.is_empty())?;
    let decoded = urlencoding::decode(name).ok()?;
    Some(decoded.to_lowercase())
}

/// Explicit `old URL -> local URL` pairs.
#[derive(Debug, Default, Clone)]
pub struct UrlMapping {
    entries: HashMap<String, String>,
}

impl UrlMapping {
    /// Parse either `{"old": "new"}` or `[{"from"|"oldUrl": .., "to"|"newUrl": ..}]`.
    pub fn from_json(raw: &str) -> Result<Self, RewriteError> {
        let value: Value = serde_json::from_str(raw)?;
        let mut entries = HashMap::new();

        match value {
            Value::Array(items) => {
                for item in items {
                    let from = item.get("from").or_else(|| item.get("oldUrl"));
                    let to = item.get("to").or_else(|| item.get("newUrl"));
                    if let (Some(Value::String(from)), Some(Value::String(to))) = (from, to) {
                        if let Some(to) = normalize_local_url(to) {
                            entries.insert(from.clone(), to);
                        }
                    }
                }
            }
            Value::Object(map) => {
                for (from, to) in map {
                    if let Some(to) = to.as_str().and_then(normalize_local_url) {
                        entries.insert(from, to);
                    }
                }
            }
            _ => {}
        }

        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, RewriteError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RewriteError::MappingIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }
}

/// Files present under the public root, addressed by URL.
#[derive(Debug, Default)]
pub struct LocalFileIndex {
    urls: HashSet<String>,
    by_file_name: HashMap<String, Vec<String>>,
}

impl LocalFileIndex {
    /// Walk `public_root`. A missing root yields an empty index.
    pub fn scan(public_root: &Path) -> Result<Self, RewriteError> {
        let mut index = Self::default();
        if !public_root.exists() {
            return Ok(index);
        }

        let mut pending = vec![public_root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|source| RewriteError::Scan {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let path = entry
                    .map_err(|source| RewriteError::Scan {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(public_root) else {
                    continue;
                };
                let url = format!("/{}", relative.to_string_lossy().replace('\\', "/"));
                index.insert(url);
            }
        }

        Ok(index)
    }

    fn insert(&mut self, url: String) {
        if let Some(name) = url.rsplit('/').next() {
            self.by_file_name
                .entry(name.to_lowercase())
                .or_default()
                .push(url.clone());
        }
        self.urls.insert(url);
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    MappingMissingFile,
    StrictNoMapping,
    InvalidUrl,
    AmbiguousMatches,
    NoLocalMatch,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            UnresolvedReason::MappingMissingFile => "mapping_missing_file",
            UnresolvedReason::StrictNoMapping => "strict_no_mapping",
            UnresolvedReason::InvalidUrl => "invalid_url",
            UnresolvedReason::AmbiguousMatches => "ambiguous_matches",
            UnresolvedReason::NoLocalMatch => "no_local_match",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedUrl {
    pub table: &'static str,
    pub id: String,
    pub field: String,
    pub url: String,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Default, Serialize)]
pub struct RewriteReport {
    pub applied: bool,
    pub hosted_urls_seen: usize,
    pub urls_replaced: usize,
    pub products_updated: usize,
    pub categories_updated: usize,
    pub reviews_updated: usize,
    pub site_content_updated: usize,
    pub unresolved: Vec<UnresolvedUrl>,
}

pub struct ImageRewriter {
    mapping: UrlMapping,
    index: LocalFileIndex,
    strict: bool,
}

impl ImageRewriter {
    pub fn new(mapping: UrlMapping, index: LocalFileIndex, strict: bool) -> Self {
        Self {
            mapping,
            index,
            strict,
        }
    }

    /// Local replacement for a hosted URL.
    pub fn resolve(&self, url: &str, preferred_folders: &[&str]) -> Result<String, UnresolvedReason> {
        if let Some(mapped) = self.mapping.get(url) {
            return if self.index.urls.contains(mapped) {
                Ok(mapped.to_string())
            } else {
                Err(UnresolvedReason::MappingMissingFile)
            };
        }
        if self.strict {
            return Err(UnresolvedReason::StrictNoMapping);
        }

        let name = hosted_file_name(url).ok_or(UnresolvedReason::InvalidUrl)?;
        let candidates = self
            .index
            .by_file_name
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or_default();

        match candidates {
            [] => Err(UnresolvedReason::NoLocalMatch),
            [only] => Ok(only.clone()),
            _ => preferred_folders
                .iter()
                .find_map(|folder| {
                    let prefix = format!("/uploads/{folder}/");
                    match candidates
                        .iter()
                        .filter(|url| url.starts_with(&prefix))
                        .collect::<Vec<_>>()
                        .as_slice()
                    {
                        [only] => Some((*only).clone()),
                        _ => None,
                    }
                })
                .ok_or(UnresolvedReason::AmbiguousMatches),
        }
    }

    fn convert_one(
        &self,
        url: &str,
        at: (&'static str, &str, String),
        preferred_folders: &[&str],
        report: &mut RewriteReport,
    ) -> Option<String> {
        if !is_hosted_image_url(url) {
            return None;
        }
        report.hosted_urls_seen += 1;

        match self.resolve(url, preferred_folders) {
            Ok(next) if next != url => {
                report.urls_replaced += 1;
                Some(next)
            }
            Ok(_) => None,
            Err(reason) => {
                let (table, id, field) = at;
                report.unresolved.push(UnresolvedUrl {
                    table,
                    id: id.to_string(),
                    field,
                    url: url.to_string(),
                    reason,
                });
                None
            }
        }
    }

    fn convert_list(
        &self,
        urls: &[String],
        at: (&'static str, &str, &str),
        preferred_folders: &[&str],
        report: &mut RewriteReport,
    ) -> Option<Vec<String>> {
        let (table, id, field) = at;
        let mut changed = false;
        let next = urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                match self.convert_one(url, (table, id, format!("{field}[{i}]")), preferred_folders, report) {
                    Some(next) => {
                        changed = true;
                        next
                    }
                    None => url.clone(),
                }
            })
            .collect();
        changed.then_some(next)
    }

    /// Scan every image reference in the catalog, writing replacements when `apply` is set.
    ///
    /// Reads and writes share one transaction, committed only when applying,
    /// so a failure midway leaves the catalog unchanged.
    pub async fn run(&self, pool: &SqlitePool, apply: bool) -> Result<RewriteReport, RewriteError> {
        let mut report = RewriteReport {
            applied: apply,
            ..Default::default()
        };
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let products: Vec<(String, String)> = sqlx::query_as("SELECT id, images FROM product")
            .fetch_all(&mut *tx)
            .await?;
        for (id, raw) in products {
            let images: Vec<String> = decode_json("product.images", &raw)?;
            let Some(next) = self.convert_list(&images, ("product", &id, "images"), &["products"], &mut report) else {
                continue;
            };
            report.products_updated += 1;
            if apply {
                sqlx::query("UPDATE product SET images = ?, updated_at = ? WHERE id = ?")
                    .bind(encode_json(&next)?)
                    .bind(now)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let categories: Vec<(String, String)> = sqlx::query_as("SELECT id, image FROM category")
            .fetch_all(&mut *tx)
            .await?;
        for (id, image) in categories {
            let Some(next) = self.convert_one(&image, ("category", &id, "image".to_string()), &["categories"], &mut report) else {
                continue;
            };
            report.categories_updated += 1;
            if apply {
                sqlx::query("UPDATE category SET image = ?, updated_at = ? WHERE id = ?")
                    .bind(&next)
                    .bind(now)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let reviews: Vec<(String, String, Option<String>)> =
            sqlx::query_as("SELECT id, images, user_image FROM review")
                .fetch_all(&mut *tx)
                .await?;
        for (id, raw, user_image) in reviews {
            let images: Vec<String> = decode_json("review.images", &raw)?;
            let next_images = self.convert_list(&images, ("review", &id, "images"), &["reviews"], &mut report);
            let next_user_image = user_image.as_deref().and_then(|url| {
                self.convert_one(url, ("review", &id, "userImage".to_string()), &["reviews"], &mut report)
            });
            if next_images.is_none() && next_user_image.is_none() {
                continue;
            }
            report.reviews_updated += 1;
            if apply {
                sqlx::query(
                    "UPDATE review
                     SET images = COALESCE(?, images), user_image = COALESCE(?, user_image),
                         updated_at = ?
                     WHERE id = ?",
                )
                .bind(next_images.as_ref().map(encode_json).transpose()?)
                .bind(&next_user_image)
                .bind(now)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let content: Option<(String, String)> =
            sqlx::query_as("SELECT hero_images, dispatch_videos FROM site_content WHERE id = 1")
                .fetch_optional(&mut *tx)
                .await?;
        if let Some((raw_hero, raw_dispatch)) = content {
            let preferred = ["products", "categories"];
            let hero: Vec<String> = decode_json("site_content.hero_images", &raw_hero)?;
            let mut dispatch: Vec<DispatchVideo> =
                decode_json("site_content.dispatch_videos", &raw_dispatch)?;

            let next_hero = self.convert_list(&hero, ("site_content", "1", "heroImages"), &preferred, &mut report);
            let mut dispatch_changed = false;
            for (i, video) in dispatch.iter_mut().enumerate() {
                let field = format!("dispatchVideos[{i}].thumbnail");
                if let Some(next) = self.convert_one(&video.thumbnail, ("site_content", "1", field), &preferred, &mut report) {
                    video.thumbnail = next;
                    dispatch_changed = true;
                }
            }

            if next_hero.is_some() || dispatch_changed {
                report.site_content_updated += 1;
                if apply {
                    sqlx::query(
                        "UPDATE site_content
                         SET hero_images = ?, dispatch_videos = ?, updated_at = ?
                         WHERE id = 1",
                    )
                    .bind(encode_json(next_hero.as_ref().unwrap_or(&hero))?)
                    .bind(encode_json(&dispatch)?)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        if apply {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        tracing::info!(
            applied = apply,
            seen = report.hosted_urls_seen,
            replaced = report.urls_replaced,
            unresolved = report.unresolved.len(),
            "image url rewrite finished"
        );
        Ok(report)
    }
}
