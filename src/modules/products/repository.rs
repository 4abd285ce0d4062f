//! Product persistence. Reads join the referenced category so responses can
//! embed it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use uuid::Uuid;

use prerna_db::{decode_json, decode_uuid, encode_json, RepositoryError};

use super::models::{CategorySummary, Product, ProductDraft};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: String,
    category_id: String,
    images: String,
    specs: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_image: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = row.price.parse::<Decimal>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price '{}': {e}", row.price))
        })?;
        let category_id = decode_uuid(&row.category_id)?;
        let category = match (row.category_name, row.category_slug, row.category_image) {
            (Some(name), Some(slug), Some(image)) => Some(CategorySummary {
                id: category_id,
                name,
                slug,
                image,
            }),
            _ => None,
        };

        Ok(Self {
            id: decode_uuid(&row.id)?,
            name: row.name,
            description: row.description,
            price,
            category_id,
            category,
            images: decode_json("product.images", &row.images)?,
            specs: decode_json("product.specs", &row.specs)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_PRODUCT: &str = "
    SELECT p.id, p.name, p.description, p.price, p.category_id, p.images, p.specs,
           p.created_at, p.updated_at,
           c.name AS category_name, c.slug AS category_slug, c.image AS category_image
    FROM product p
    LEFT JOIN category c ON c.id = p.category_id";

pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Products newest first, optionally restricted to one category.
    pub async fn list(&self, category_id: Option<Uuid>) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = match category_id {
            Some(category_id) => {
                sqlx::query_as(&format!(
                    "{SELECT_PRODUCT} WHERE p.category_id = ? ORDER BY p.created_at DESC, p.rowid DESC"
                ))
                .bind(category_id.to_string())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{SELECT_PRODUCT} ORDER BY p.created_at DESC, p.rowid DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE p.id = ?"))
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM product WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn create(&self, id: Uuid, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO product
                (id, name, description, price, category_id, images, specs, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.to_string())
        .bind(draft.category_id.to_string())
        .bind(encode_json(&draft.images)?)
        .bind(encode_json(&draft.specs)?)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Overwrite every editable field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn update(&self, id: Uuid, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE product
             SET name = ?, description = ?, price = ?, category_id = ?, images = ?, specs = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.to_string())
        .bind(draft.category_id.to_string())
        .bind(encode_json(&draft.images)?)
        .bind(encode_json(&draft.specs)?)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, returning what was removed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::categories::repository::CategoryRepository;
    use crate::modules::products::models::ProductSpecs;
    use crate::test_support::migrated_pool;

    fn draft(name: &str, category_id: Uuid) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: "Handwoven".to_string(),
            price: Decimal::new(249900, 2),
            category_id,
            images: vec!["/uploads/products/a.jpg".to_string()],
            specs: ProductSpecs {
                fabric: Some("Silk".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn products_embed_their_category_until_it_is_deleted() {
        let pool = migrated_pool().await;
        let categories = CategoryRepository::new(&pool);
        let products = ProductRepository::new(&pool);

        let silk = categories
            .create(Uuid::now_v7(), "Silk", "silk", "/c.jpg")
            .await
            .unwrap();
        let product = products
            .create(Uuid::now_v7(), &draft("Red Silk", silk.id))
            .await
            .unwrap();

        assert_eq!(product.price, Decimal::new(249900, 2));
        assert_eq!(product.category.as_ref().map(|c| c.slug.as_str()), Some("silk"));
        assert_eq!(product.specs.fabric.as_deref(), Some("Silk"));

        categories.delete(silk.id).await.unwrap();
        let orphan = products.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(orphan.category, None);
        assert_eq!(orphan.category_id, silk.id);
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let pool = migrated_pool().await;
        let categories = CategoryRepository::new(&pool);
        let products = ProductRepository::new(&pool);

        let silk = categories
            .create(Uuid::now_v7(), "Silk", "silk", "/c.jpg")
            .await
            .unwrap();
        let cotton = categories
            .create(Uuid::now_v7(), "Cotton", "cotton", "/d.jpg")
            .await
            .unwrap();
        products
            .create(Uuid::now_v7(), &draft("Red Silk", silk.id))
            .await
            .unwrap();
        products
            .create(Uuid::now_v7(), &draft("Blue Cotton", cotton.id))
            .await
            .unwrap();

        let only_cotton = products.list(Some(cotton.id)).await.unwrap();
        assert_eq!(only_cotton.len(), 1);
        assert_eq!(only_cotton[0].name, "Blue Cotton");
        assert_eq!(products.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_missing_product() {
        let pool = migrated_pool().await;
        let products = ProductRepository::new(&pool);

        let err = products
            .update(Uuid::now_v7(), &draft("Ghost", Uuid::now_v7()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(products.delete(Uuid::now_v7()).await.unwrap().is_none());
        assert!(!products.exists(Uuid::now_v7()).await.unwrap());
    }
}
