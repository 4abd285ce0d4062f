use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use prerna_authz::RequireAdmin;
use prerna_http::{ApiJson, ApiQuery, AppError};

use super::models::{
    ModerateReview, NewReview, Review, ReviewFilter, ReviewQuery, SubmitReview, MAX_RATING,
    MIN_RATING,
};
use super::repository::ReviewRepository;
use crate::modules::products::repository::ProductRepository;
use crate::modules::{new_id, parse_id};
use crate::state::AppState;
use crate::utils::{non_blank, query_flag};

/// Public listings only ever show approved reviews; the full moderation
/// queue needs admin credentials. Any non-empty `public` value selects the
/// public listing, `public=false` included.
pub async fn list_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<Vec<Review>>, AppError> {
    let approved_only = query.public.as_deref().is_some_and(|v| !v.is_empty());
    if !approved_only {
        state.guard.authorize(&headers)?;
    }

    let filter = ReviewFilter {
        approved_only,
        featured_only: query_flag(query.featured.as_deref()),
        product_id: non_blank(query.product_id)
            .map(|raw| parse_id(&raw))
            .transpose()?,
    };

    let reviews = ReviewRepository::new(&state.pool).list(&filter).await?;
    Ok(Json(reviews))
}

pub async fn submit_review(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<SubmitReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let product_id = non_blank(body.product_id);
    let user_name = non_blank(body.user_name);

    let mut missing = Vec::new();
    if product_id.is_none() {
        missing.push("productId");
    }
    if body.rating.is_none() {
        missing.push("rating");
    }
    if user_name.is_none() {
        missing.push("userName");
    }
    let (Some(product_id), Some(rating), Some(user_name)) = (product_id, body.rating, user_name)
    else {
        return Err(AppError::missing_fields(&missing, "Missing required fields"));
    };

    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::validation(
            vec![json!({"field": "rating", "error": "must be between 1 and 5"})],
            "Rating must be between 1 and 5",
        ));
    }

    let product_id = parse_id(&product_id)?;
    if !ProductRepository::new(&pool).exists(product_id).await? {
        return Err(AppError::validation(
            vec![json!({"field": "productId", "error": "unknown product"})],
            "Product not found",
        ));
    }

    let submission = NewReview {
        product_id,
        rating,
        user_name,
        user_image: non_blank(body.user_image),
        video_link: non_blank(body.video_link),
        comment: non_blank(body.comment),
        images: body
            .images
            .unwrap_or_default()
            .into_iter()
            .filter_map(|url| non_blank(Some(url)))
            .collect(),
    };

    let review = ReviewRepository::new(&pool)
        .create(new_id(), &submission)
        .await?;

    tracing::info!(review_id = %review.id, product_id = %review.product_id, "review submitted");
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn moderate_review(
    _admin: RequireAdmin,
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<ModerateReview>,
) -> Result<Json<Review>, AppError> {
    let Some(id) = non_blank(body.id) else {
        return Err(AppError::missing_fields(&["id"], "ID is required"));
    };
    let id = parse_id(&id)?;

    let review = ReviewRepository::new(&pool)
        .moderate(id, body.is_approved, body.is_featured)
        .await
        .map_err(|err| match err {
            prerna_db::RepositoryError::NotFound => AppError::not_found("Review not found"),
            other => other.into(),
        })?;

    tracing::info!(
        review_id = %review.id,
        approved = review.is_approved,
        featured = review.is_featured,
        "review moderated"
    );
    Ok(Json(review))
}

pub async fn delete_review(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let deleted = ReviewRepository::new(&state.pool)
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found"))?;

    let mut uploads = deleted.images.clone();
    uploads.extend(deleted.user_image.clone());
    let removed = state.media.delete_many(&uploads).await;

    tracing::info!(review_id = %deleted.id, removed_images = removed, "review deleted");
    Ok(Json(json!({ "message": "Review deleted" })))
}
