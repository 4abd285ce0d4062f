//! Site content persistence. The document is a single row with `id = 1`.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use prerna_db::{decode_json, encode_json, RepositoryError};

use super::models::SiteContent;

#[derive(Debug, sqlx::FromRow)]
struct SiteContentRow {
    hero_images: String,
    influencer_videos: String,
    dispatch_videos: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SiteContentRow> for SiteContent {
    type Error = RepositoryError;

    fn try_from(row: SiteContentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            hero_images: decode_json("site_content.hero_images", &row.hero_images)?,
            influencer_videos: decode_json(
                "site_content.influencer_videos",
                &row.influencer_videos,
            )?,
            dispatch_videos: decode_json("site_content.dispatch_videos", &row.dispatch_videos)?,
            updated_at: Some(row.updated_at),
        })
    }
}

const SELECT_CONTENT: &str = "
    SELECT hero_images, influencer_videos, dispatch_videos, updated_at
    FROM site_content
    WHERE id = 1";

pub struct ContentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ContentRepository<'a> {
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// The stored document, or an empty one if nothing was saved yet.
    pub async fn get(&self) -> Result<SiteContent, RepositoryError> {
        let row: Option<SiteContentRow> = sqlx::query_as(SELECT_CONTENT)
            .fetch_optional(self.pool)
            .await?;

        row.map(SiteContent::try_from)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Read, change and write the document in one transaction, creating it
    /// on first use. Returns the stored document and the closure's result.
    pub async fn modify<R>(
        &self,
        change: impl FnOnce(&mut SiteContent) -> R,
    ) -> Result<(SiteContent, R), RepositoryError> {
        let (tx, mut content) = self.lock().await?;
        let outcome = change(&mut content);
        let content = commit(tx, content).await?;
        Ok((content, outcome))
    }

    /// Like [`Self::modify`], but the change may decline by returning `None`.
    /// A declined change leaves the table exactly as it was, including
    /// `updated_at` and a missing document.
    pub async fn modify_if<R>(
        &self,
        change: impl FnOnce(&mut SiteContent) -> Option<R>,
    ) -> Result<Option<(SiteContent, R)>, RepositoryError> {
        let (tx, mut content) = self.lock().await?;
        let Some(outcome) = change(&mut content) else {
            tx.rollback().await?;
            return Ok(None);
        };
        let content = commit(tx, content).await?;
        Ok(Some((content, outcome)))
    }

    /// Open a transaction holding the write lock and load the document,
    /// creating the row if it does not exist yet.
    async fn lock(&self) -> Result<(Transaction<'static, Sqlite>, SiteContent), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Writing first takes the write lock before the read.
        sqlx::query(
            "INSERT OR IGNORE INTO site_content
                (id, hero_images, influencer_videos, dispatch_videos, created_at, updated_at)
             VALUES (1, '[]', '[]', '[]', ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row: SiteContentRow = sqlx::query_as(SELECT_CONTENT).fetch_one(&mut *tx).await?;
        Ok((tx, SiteContent::try_from(row)?))
    }
}

async fn commit(
    mut tx: Transaction<'_, Sqlite>,
    mut content: SiteContent,
) -> Result<SiteContent, RepositoryError> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE site_content
         SET hero_images = ?, influencer_videos = ?, dispatch_videos = ?, updated_at = ?
         WHERE id = 1",
    )
    .bind(encode_json(&content.hero_images)?)
    .bind(encode_json(&content.influencer_videos)?)
    .bind(encode_json(&content.dispatch_videos)?)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    content.updated_at = Some(now);
    Ok(content)
}
