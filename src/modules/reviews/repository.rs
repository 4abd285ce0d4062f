//! Review persistence.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use prerna_db::{decode_json, decode_uuid, encode_json, RepositoryError};

use super::models::{NewReview, ProductRef, Review, ReviewFilter};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: String,
    product_id: String,
    rating: i64,
    user_name: String,
    user_image: Option<String>,
    video_link: Option<String>,
    comment: Option<String>,
    images: String,
    is_approved: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_name: Option<String>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let product_id = decode_uuid(&row.product_id)?;

        Ok(Self {
            id: decode_uuid(&row.id)?,
            product_id,
            product: row.product_name.map(|name| ProductRef {
                id: product_id,
                name,
            }),
            rating: row.rating,
            user_name: row.user_name,
            user_image: row.user_image,
            video_link: row.video_link,
            comment: row.comment,
            images: decode_json("review.images", &row.images)?,
            is_approved: row.is_approved,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_REVIEW: &str = "
    SELECT r.id, r.product_id, r.rating, r.user_name, r.user_image, r.video_link, r.comment,
           r.images, r.is_approved, r.is_featured, r.created_at, r.updated_at,
           p.name AS product_name
    FROM review r
    LEFT JOIN product p ON p.id = r.product_id";

pub struct ReviewRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReviewRepository<'a> {
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Reviews matching `filter`, newest first.
    pub async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "{SELECT_REVIEW}
             WHERE (? = 0 OR r.is_approved = 1)
               AND (? = 0 OR r.is_featured = 1)
               AND (? IS NULL OR r.product_id = ?)
             ORDER BY r.created_at DESC, r.rowid DESC"
        ))
        .bind(filter.approved_only)
        .bind(filter.featured_only)
        .bind(filter.product_id.map(|id| id.to_string()))
        .bind(filter.product_id.map(|id| id.to_string()))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!("{SELECT_REVIEW} WHERE r.id = ?"))
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Store a submission. It always starts unapproved and unfeatured.
    pub async fn create(&self, id: Uuid, review: &NewReview) -> Result<Review, RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO review
                (id, product_id, rating, user_name, user_image, video_link, comment, images,
                 is_approved, is_featured, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)",
        )
        .bind(id.to_string())
        .bind(review.product_id.to_string())
        .bind(review.rating)
        .bind(&review.user_name)
        .bind(&review.user_image)
        .bind(&review.video_link)
        .bind(&review.comment)
        .bind(encode_json(&review.images)?)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Change moderation flags; `None` leaves a flag as it is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists.
    pub async fn moderate(
        &self,
        id: Uuid,
        is_approved: Option<bool>,
        is_featured: Option<bool>,
    ) -> Result<Review, RepositoryError> {
        let result = sqlx::query(
            "UPDATE review
             SET is_approved = COALESCE(?, is_approved),
                 is_featured = COALESCE(?, is_featured),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(is_approved)
        .bind(is_featured)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a review, returning what was removed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        let Some(review) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM review WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(review))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;

    fn submission(product_id: Uuid, user_name: &str) -> NewReview {
        NewReview {
            product_id,
            rating: 5,
            user_name: user_name.to_string(),
            user_image: None,
            video_link: None,
            comment: Some("Beautiful drape".to_string()),
            images: vec![],
        }
    }

    #[tokio::test]
    async fn filters_combine() {
        let pool = migrated_pool().await;
        let repo = ReviewRepository::new(&pool);
        let saree = Uuid::now_v7();
        let other = Uuid::now_v7();

        let approved = repo.create(Uuid::now_v7(), &submission(saree, "Asha")).await.unwrap();
        repo.create(Uuid::now_v7(), &submission(saree, "Meera")).await.unwrap();
        let featured = repo.create(Uuid::now_v7(), &submission(other, "Nila")).await.unwrap();

        repo.moderate(approved.id, Some(true), None).await.unwrap();
        repo.moderate(featured.id, Some(true), Some(true)).await.unwrap();

        let all = repo.list(&ReviewFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].user_name, "Nila");

        let public = ReviewFilter {
            approved_only: true,
            ..Default::default()
        };
        assert_eq!(repo.list(&public).await.unwrap().len(), 2);

        let public_for_saree = ReviewFilter {
            approved_only: true,
            product_id: Some(saree),
            ..Default::default()
        };
        let names: Vec<String> = repo
            .list(&public_for_saree)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_name)
            .collect();
        assert_eq!(names, vec!["Asha"]);

        let featured_only = ReviewFilter {
            featured_only: true,
            ..Default::default()
        };
        assert_eq!(repo.list(&featured_only).await.unwrap()[0].id, featured.id);
    }

    #[tokio::test]
    async fn moderation_keeps_unspecified_flags() {
        let pool = migrated_pool().await;
        let repo = ReviewRepository::new(&pool);

        let review = repo
            .create(Uuid::now_v7(), &submission(Uuid::now_v7(), "Asha"))
            .await
            .unwrap();
        assert!(!review.is_approved && !review.is_featured);
        assert_eq!(review.product, None);

        let featured = repo.moderate(review.id, None, Some(true)).await.unwrap();
        assert!(!featured.is_approved);
        assert!(featured.is_featured);

        let err = repo.moderate(Uuid::now_v7(), Some(true), None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
