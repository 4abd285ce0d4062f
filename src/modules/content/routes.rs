use axum::{extract::State, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use prerna_authz::RequireAdmin;
use prerna_http::{ApiJson, ApiQuery, AppError};

use super::models::{
    AddVideoPayload, DeleteVideoQuery, DispatchVideo, DispatchVideoInput, HeroPayload,
    InfluencerVideo, InfluencerVideoInput, SiteContentView, VideoKind, VideosView,
};
use super::repository::ContentRepository;
use crate::modules::{new_id, parse_id};
use crate::utils::{non_blank, video};

fn invalid_field(field: &str, error: &str, message: &str) -> AppError {
    AppError::validation(vec![json!({"field": field, "error": error})], message)
}

fn parse_kind(raw: &str) -> Result<VideoKind, AppError> {
    raw.parse().map_err(|()| {
        invalid_field(
            "type",
            "must be influencer or dispatch",
            "Video type must be influencer or dispatch",
        )
    })
}

fn influencer_video(raw: Value) -> Result<InfluencerVideo, AppError> {
    let input: InfluencerVideoInput = serde_json::from_value(raw)
        .map_err(|e| AppError::bad_request(format!("invalid influencer video: {e}")))?;

    let url = non_blank(input.url)
        .ok_or_else(|| AppError::missing_fields(&["video.url"], "Video URL is required"))?;
    if video::youtube_id(&url).is_none() && !video::is_instagram_reel(&url) {
        return Err(invalid_field(
            "video.url",
            "must be a YouTube or Instagram reel link",
            "Influencer videos must link to YouTube or an Instagram reel",
        ));
    }
    let creator_name = non_blank(input.creator_name).ok_or_else(|| {
        AppError::missing_fields(&["video.creatorName"], "Creator name is required")
    })?;

    Ok(InfluencerVideo {
        id: new_id(),
        url,
        creator_name,
        review_summary: non_blank(input.review_summary),
    })
}

fn dispatch_video(raw: Value) -> Result<DispatchVideo, AppError> {
    let input: DispatchVideoInput = serde_json::from_value(raw)
        .map_err(|e| AppError::bad_request(format!("invalid dispatch video: {e}")))?;

    let url = non_blank(input.url)
        .ok_or_else(|| AppError::missing_fields(&["video.url"], "Video URL is required"))?;
    let Some(youtube_id) = video::youtube_id(&url) else {
        return Err(invalid_field(
            "video.url",
            "must be a YouTube link",
            "Dispatch videos must link to YouTube",
        ));
    };
    let thumbnail =
        non_blank(input.thumbnail).unwrap_or_else(|| video::youtube_thumbnail(youtube_id));

    Ok(DispatchVideo {
        id: new_id(),
        url,
        thumbnail,
    })
}

pub async fn get_content(State(pool): State<SqlitePool>) -> Result<Json<SiteContentView>, AppError> {
    let content = ContentRepository::new(&pool).get().await?;
    Ok(Json(content.into()))
}

pub async fn get_hero(State(pool): State<SqlitePool>) -> Result<Json<Vec<String>>, AppError> {
    let content = ContentRepository::new(&pool).get().await?;
    Ok(Json(content.hero_images))
}

pub async fn update_hero(
    _admin: RequireAdmin,
    State(pool): State<SqlitePool>,
    ApiJson(payload): ApiJson<HeroPayload>,
) -> Result<Json<Vec<String>>, AppError> {
    let images: Vec<String> = match payload.images {
        Some(images @ Value::Array(_)) => serde_json::from_value(images).map_err(|_| {
            invalid_field("images", "must contain strings", "Images must be an array of URLs")
        })?,
        _ => {
            return Err(AppError::validation(
                vec![json!({"field": "images", "error": "must be an array"})],
                "Images must be an array",
            ))
        }
    };

    let (content, ()) = ContentRepository::new(&pool)
        .modify(|content| content.hero_images = images)
        .await?;

    tracing::info!(count = content.hero_images.len(), "hero images updated");
    Ok(Json(content.hero_images))
}

pub async fn list_videos(State(pool): State<SqlitePool>) -> Result<Json<VideosView>, AppError> {
    let content = ContentRepository::new(&pool).get().await?;
    Ok(Json(VideosView::from_content(&content)))
}

pub async fn add_video(
    _admin: RequireAdmin,
    State(pool): State<SqlitePool>,
    ApiJson(payload): ApiJson<AddVideoPayload>,
) -> Result<Json<SiteContentView>, AppError> {
    let kind = non_blank(payload.kind);
    let raw = payload.video.filter(|v| !v.is_null());
    let (Some(kind), Some(raw)) = (kind, raw) else {
        return Err(AppError::missing_fields(
            &["type", "video"],
            "Type and Video data are required",
        ));
    };

    let repo = ContentRepository::new(&pool);
    let (content, id) = match parse_kind(&kind)? {
        VideoKind::Influencer => {
            let video = influencer_video(raw)?;
            let id = video.id;
            repo.modify(move |content| {
                content.influencer_videos.push(video);
                id
            })
            .await?
        }
        VideoKind::Dispatch => {
            let video = dispatch_video(raw)?;
            let id = video.id;
            repo.modify(move |content| {
                content.dispatch_videos.push(video);
                id
            })
            .await?
        }
    };

    tracing::info!(video_id = %id, kind = %kind, "video added");
    Ok(Json(content.into()))
}

pub async fn delete_video(
    _admin: RequireAdmin,
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<DeleteVideoQuery>,
) -> Result<Json<Value>, AppError> {
    let (Some(id), Some(kind)) = (non_blank(query.id), non_blank(query.kind)) else {
        return Err(AppError::missing_fields(
            &["id", "type"],
            "ID and Type are required",
        ));
    };
    let kind = parse_kind(&kind)?;
    let id: Uuid = parse_id(&id)?;

    let removed = ContentRepository::new(&pool)
        .modify_if(|content| {
            let videos_before = (content.influencer_videos.len(), content.dispatch_videos.len());
            match kind {
                VideoKind::Influencer => content.influencer_videos.retain(|v| v.id != id),
                VideoKind::Dispatch => content.dispatch_videos.retain(|v| v.id != id),
            }
            let videos_after = (content.influencer_videos.len(), content.dispatch_videos.len());
            (videos_before != videos_after).then_some(())
        })
        .await?;

    if removed.is_none() {
        return Err(AppError::not_found("Video not found"));
    }

    tracing::info!(video_id = %id, "video deleted");
    Ok(Json(json!({ "message": "Video deleted" })))
}
