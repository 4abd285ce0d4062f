use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use prerna_authz::RequireAdmin;
use prerna_http::{ApiJson, AppError};

use super::models::{Category, CategoryPayload};
use super::repository::CategoryRepository;
use crate::modules::{new_id, parse_id};
use crate::state::AppState;
use crate::utils::{non_blank, slug::slugify};

fn slug_from_name(name: &str) -> Result<String, AppError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::validation(
            vec![json!({"field": "name", "error": "must contain letters or digits"})],
            "Category name must produce a non-empty slug",
        ));
    }
    Ok(slug)
}

pub async fn list_categories(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(&pool).list_all().await?;
    Ok(Json(categories))
}

pub async fn create_category(
    _admin: RequireAdmin,
    State(pool): State<SqlitePool>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let (name, image) = match (non_blank(payload.name), non_blank(payload.image)) {
        (Some(name), Some(image)) => (name, image),
        (name, image) => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("name");
            }
            if image.is_none() {
                missing.push("image");
            }
            return Err(AppError::missing_fields(
                &missing,
                "Name and image are required",
            ));
        }
    };
    let slug = slug_from_name(&name)?;

    let category = CategoryRepository::new(&pool)
        .create(new_id(), &name, &slug, &image)
        .await?;

    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<Category>, AppError> {
    let id = parse_id(&id)?;
    CategoryRepository::new(&pool)
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Category not found"))
}

pub async fn get_category_by_slug(
    State(pool): State<SqlitePool>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, AppError> {
    CategoryRepository::new(&pool)
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Category not found"))
}

pub async fn update_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> Result<Json<Category>, AppError> {
    let id = parse_id(&id)?;
    let repo = CategoryRepository::new(&state.pool);
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;

    let (name, slug) = match non_blank(payload.name) {
        Some(name) => {
            let slug = slug_from_name(&name)?;
            (name, slug)
        }
        None => (existing.name.clone(), existing.slug.clone()),
    };
    let image = non_blank(payload.image).unwrap_or_else(|| existing.image.clone());

    let updated = repo.update(id, &name, &slug, &image).await?;

    if existing.image != updated.image {
        state.media.delete(&existing.image).await;
    }

    tracing::info!(category_id = %updated.id, slug = %updated.slug, "category updated");
    Ok(Json(updated))
}

pub async fn delete_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let deleted = CategoryRepository::new(&state.pool)
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;

    state.media.delete(&deleted.image).await;

    tracing::info!(category_id = %deleted.id, "category deleted");
    Ok(Json(json!({ "message": "Category deleted" })))
}
