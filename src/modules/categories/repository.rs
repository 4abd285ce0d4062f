//! Category persistence.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use prerna_db::{decode_uuid, RepositoryError};

use super::models::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode_uuid(&row.id)?,
            name: row.name,
            slug: row.slug,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, name, slug, image, created_at, updated_at";

fn slug_taken(slug: &str) -> String {
    format!("A category with slug '{slug}' already exists")
}

pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All categories, newest first.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM category ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM category WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM category WHERE slug = ?"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already used.
    pub async fn create(
        &self,
        id: Uuid,
        name: &str,
        slug: &str,
        image: &str,
    ) -> Result<Category, RepositoryError> {
        let now = Utc::now();
        let row: CategoryRow = sqlx::query_as(&format!(
            "INSERT INTO category (id, name, slug, image, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(name)
        .bind(slug)
        .bind(image)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, || slug_taken(slug)))?;

        row.try_into()
    }

    /// Overwrite name, slug and image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists and
    /// `RepositoryError::Conflict` if the slug is already used.
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        slug: &str,
        image: &str,
    ) -> Result<Category, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "UPDATE category SET name = ?, slug = ?, image = ?, updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(name)
        .bind(slug)
        .bind(image)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, || slug_taken(slug)))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a category, returning what was removed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "DELETE FROM category WHERE id = ? RETURNING {COLUMNS}"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let pool = migrated_pool().await;
        let repo = CategoryRepository::new(&pool);

        repo.create(Uuid::now_v7(), "Silk", "silk", "/uploads/categories/a.jpg")
            .await
            .unwrap();
        let err = repo
            .create(Uuid::now_v7(), "silk", "silk", "/uploads/categories/b.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(msg) if msg.contains("'silk'")));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_delete_returns_row() {
        let pool = migrated_pool().await;
        let repo = CategoryRepository::new(&pool);

        let first = repo
            .create(Uuid::now_v7(), "Cotton", "cotton", "/a.jpg")
            .await
            .unwrap();
        let second = repo
            .create(Uuid::now_v7(), "Linen", "linen", "/b.jpg")
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Linen", "Cotton"]);

        let deleted = repo.delete(first.id).await.unwrap().unwrap();
        assert_eq!(deleted.slug, "cotton");
        assert!(repo.delete(first.id).await.unwrap().is_none());
        assert_eq!(
            repo.get_by_slug("linen").await.unwrap().map(|c| c.id),
            Some(second.id)
        );
    }

    #[tokio::test]
    async fn update_missing_category_is_not_found() {
        let pool = migrated_pool().await;
        let repo = CategoryRepository::new(&pool);

        let err = repo
            .update(Uuid::now_v7(), "Ghost", "ghost", "/g.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
