mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn reviews_are_moderated_before_public_listing() {
    let app = common::spawn().await;
    let silk = app.create_category("Silk").await;
    let product = app
        .create_product("Red Silk", silk["id"].as_str().unwrap(), &["/uploads/products/a.jpg"])
        .await;
    let product_id = product["id"].as_str().unwrap();

    let (status, review) = app
        .json(
            Method::POST,
            "/api/reviews",
            Some(json!({
                "productId": product_id,
                "rating": 5,
                "userName": "Ananya",
                "comment": "Gorgeous drape",
                "isApproved": true
            })),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{review}");
    assert_eq!(review["isApproved"], false);
    assert_eq!(review["isFeatured"], false);
    let review_id = review["id"].as_str().unwrap();

    let (status, public) = app.get("/api/reviews?public=true").await;
    assert_eq!(status, StatusCode::OK);
    assert!(public.as_array().unwrap().is_empty());

    let (status, _) = app.get("/api/reviews").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, queue) = app.json(Method::GET, "/api/reviews", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let (status, moderated) = app
        .json(
            Method::PATCH,
            "/api/reviews",
            Some(json!({ "id": review_id, "isApproved": true, "isFeatured": true })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moderated["isApproved"], true);

    let (_, public) = app
        .get(&format!("/api/reviews?public=true&featured=true&productId={product_id}"))
        .await;
    let public = public.as_array().unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["product"]["name"], "Red Silk");

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/reviews/{review_id}"), None, true)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn review_submission_validation() {
    let app = common::spawn().await;

    let (status, body) = app
        .json(Method::POST, "/api/reviews", Some(json!({ "rating": 4 })), false)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "productId");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/reviews",
            Some(json!({
                "productId": "0190b5a2-6c1e-7c3a-9a53-5d8f0e2b7c11",
                "rating": 9,
                "userName": "Meera"
            })),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/reviews",
            Some(json!({
                "productId": "0190b5a2-6c1e-7c3a-9a53-5d8f0e2b7c11",
                "rating": 4,
                "userName": "Meera"
            })),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .json(Method::PATCH, "/api/reviews", Some(json!({ "isApproved": true })), true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "ID is required");
}

#[tokio::test]
async fn any_public_value_selects_the_public_listing() {
    let app = common::spawn().await;

    for value in ["1", "false", "0"] {
        let (status, public) = app.get(&format!("/api/reviews?public={value}")).await;
        assert_eq!(status, StatusCode::OK, "public={value}");
        assert!(public.as_array().unwrap().is_empty());
    }

    let (status, _) = app.get("/api/reviews?public=").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
