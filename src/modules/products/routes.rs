use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use prerna_authz::RequireAdmin;
use prerna_http::{ApiJson, ApiQuery, AppError};

use super::models::{
    OrderLink, Product, ProductDraft, ProductPayload, ProductQuery, ProductSpecs,
};
use super::repository::ProductRepository;
use crate::modules::categories::repository::CategoryRepository;
use crate::modules::{new_id, parse_id};
use crate::state::AppState;
use crate::utils::{non_blank, whatsapp};

fn clean_images(images: Vec<String>) -> Vec<String> {
    images
        .into_iter()
        .filter_map(|url| non_blank(Some(url)))
        .collect()
}

fn check_price(price: Decimal) -> Result<Decimal, AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation(
            vec![json!({"field": "price", "error": "must be greater than zero"})],
            "Price must be greater than zero",
        ));
    }
    Ok(price)
}

/// Resolve the category reference sent by the admin UI.
async fn resolve_category(pool: &SqlitePool, raw: &str) -> Result<Uuid, AppError> {
    let unknown = || {
        AppError::validation(
            vec![json!({"field": "category", "error": "unknown category"})],
            "Category not found",
        )
    };
    let id = Uuid::parse_str(raw).map_err(|_| unknown())?;
    match CategoryRepository::new(pool).get_by_id(id).await? {
        Some(category) => Ok(category.id),
        None => Err(unknown()),
    }
}

pub async fn list_products(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let category_id = match non_blank(query.category) {
        Some(slug) => {
            let category = CategoryRepository::new(&pool).get_by_slug(&slug).await?;
            if category.is_none() {
                tracing::debug!(slug = %slug, "unknown category slug; listing every product");
            }
            category.map(|c| c.id)
        }
        None => None,
    };

    let products = ProductRepository::new(&pool).list(category_id).await?;
    Ok(Json(products))
}

pub async fn create_product(
    _admin: RequireAdmin,
    State(pool): State<SqlitePool>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let name = non_blank(payload.name);
    let description = non_blank(payload.description);
    let category = non_blank(payload.category);
    let images = clean_images(payload.images.unwrap_or_default());

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    if description.is_none() {
        missing.push("description");
    }
    if payload.price.is_none() {
        missing.push("price");
    }
    if category.is_none() {
        missing.push("category");
    }
    if images.is_empty() {
        missing.push("images");
    }

    let (Some(name), Some(description), Some(price), Some(category), false) =
        (name, description, payload.price, category, images.is_empty())
    else {
        return Err(AppError::missing_fields(&missing, "Missing required fields"));
    };

    let draft = ProductDraft {
        name,
        description,
        price: check_price(price)?,
        category_id: resolve_category(&pool, &category).await?,
        images,
        specs: ProductSpecs::default().merge(payload.specs.unwrap_or_default()),
    };

    let product = ProductRepository::new(&pool).create(new_id(), &draft).await?;

    tracing::info!(product_id = %product.id, category_id = %product.category_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    ProductRepository::new(&pool)
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Product not found"))
}

pub async fn update_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    let repo = ProductRepository::new(&state.pool);
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let mut draft = existing.to_draft();
    if let Some(name) = non_blank(payload.name) {
        draft.name = name;
    }
    if let Some(description) = non_blank(payload.description) {
        draft.description = description;
    }
    if let Some(price) = payload.price {
        draft.price = check_price(price)?;
    }
    if let Some(category) = non_blank(payload.category) {
        draft.category_id = resolve_category(&state.pool, &category).await?;
    }
    if let Some(images) = payload.images {
        let images = clean_images(images);
        if images.is_empty() {
            return Err(AppError::validation(
                vec![json!({"field": "images", "error": "must not be empty"})],
                "At least one image is required",
            ));
        }
        draft.images = images;
    }
    if let Some(specs) = payload.specs {
        draft.specs = draft.specs.merge(specs);
    }

    let updated = repo.update(id, &draft).await?;

    let dropped: Vec<&String> = existing
        .images
        .iter()
        .filter(|url| !updated.images.contains(url))
        .collect();
    let removed = state.media.delete_many(dropped).await;

    tracing::info!(product_id = %updated.id, removed_images = removed, "product updated");
    Ok(Json(updated))
}

pub async fn delete_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let deleted = ProductRepository::new(&state.pool)
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let removed = state.media.delete_many(&deleted.images).await;

    tracing::info!(product_id = %deleted.id, removed_images = removed, "product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}

pub async fn order_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderLink>, AppError> {
    let id = parse_id(&id)?;
    let product = ProductRepository::new(&state.pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let storefront = &state.settings.storefront;
    let page = whatsapp::product_page_url(&storefront.public_base_url, &product.id.to_string());
    let url = whatsapp::order_link(&storefront.whatsapp_number, &product.name, &page);

    Ok(Json(OrderLink { url }))
}
