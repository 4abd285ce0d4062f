mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn hero_images_round_trip() {
    let app = common::spawn().await;

    let (status, content) = app.get("/api/content").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["heroImages"], json!([]));

    let (status, _) = app
        .json(Method::PUT, "/api/content/hero", Some(json!({ "images": "/a.jpg" })), true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(Method::PUT, "/api/content/hero", Some(json!({ "images": ["/a.jpg"] })), false)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, hero) = app
        .json(
            Method::PUT,
            "/api/content/hero",
            Some(json!({ "images": ["/uploads/products/a.jpg", "/uploads/products/b.jpg"] })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hero.as_array().unwrap().len(), 2);

    let (_, hero) = app.get("/api/content/hero").await;
    assert_eq!(hero[1], "/uploads/products/b.jpg");
}

#[tokio::test]
async fn videos_are_added_with_embeds_and_removed() {
    let app = common::spawn().await;

    let (status, content) = app
        .json(
            Method::POST,
            "/api/content/videos",
            Some(json!({ "type": "dispatch", "video": { "url": "https://youtu.be/dQw4w9WgXcQ" } })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{content}");
    let dispatch = &content["dispatchVideos"][0];
    assert_eq!(
        dispatch["thumbnail"],
        "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
    );
    assert_eq!(dispatch["embedUrl"], "https://www.youtube.com/embed/dQw4w9WgXcQ");
    let dispatch_id = dispatch["id"].as_str().unwrap().to_string();

    let (status, content) = app
        .json(
            Method::POST,
            "/api/content/videos",
            Some(json!({
                "type": "influencer",
                "video": {
                    "url": "https://www.instagram.com/reel/Cx1abc/?igsh=1",
                    "creatorName": "Priya"
                }
            })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["influencerVideos"][0]["creatorName"], "Priya");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/content/videos",
            Some(json!({ "type": "dispatch", "video": { "url": "https://vimeo.com/1" } })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(Method::POST, "/api/content/videos", Some(json!({ "type": "dispatch" })), true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, videos) = app.get("/api/content/videos").await;
    assert_eq!(videos["influencerVideos"].as_array().unwrap().len(), 1);
    assert_eq!(videos["dispatchVideos"].as_array().unwrap().len(), 1);

    let uri = format!("/api/content/videos?id={dispatch_id}&type=dispatch");
    let (status, body) = app.json(Method::DELETE, &uri, None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Video deleted");

    let (status, _) = app.json(Method::DELETE, &uri, None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(Method::DELETE, "/api/content/videos?type=dispatch", None, true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_unknown_video_leaves_content_untouched() {
    let app = common::spawn().await;
    let uri = "/api/content/videos?id=0192a0a5-8f1e-7c3a-9b2d-5e6f7a8b9c0d&type=influencer";

    let (status, body) = app.json(Method::DELETE, uri, None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Video not found");

    let (status, content) = app.get("/api/content").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content.get("updatedAt").is_none(), "{content}");

    let (status, content) = app
        .json(Method::PUT, "/api/content/hero", Some(json!({ "images": ["/a.jpg"] })), true)
        .await;
    assert_eq!(status, StatusCode::OK, "{content}");
    let (_, before) = app.get("/api/content").await;

    let (status, _) = app.json(Method::DELETE, uri, None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, after) = app.get("/api/content").await;
    assert_eq!(after["updatedAt"], before["updatedAt"]);
}
