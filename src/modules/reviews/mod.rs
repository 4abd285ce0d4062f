pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get},
    Router,
};
use prerna_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::modules::{error_response, message_schema};
use crate::state::AppState;

/// Customer reviews: public submission, admin moderation.
pub struct ReviewsModule {
    state: AppState,
}

impl ReviewsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(routes::list_reviews)
                    .post(routes::submit_review)
                    .patch(routes::moderate_review),
            )
            .route("/{id}", delete(routes::delete_review))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let review = json!({ "$ref": "#/components/schemas/Review" });
        let admin = json!([{ "adminToken": [] }]);
        let json_body = |schema: &str| {
            json!({
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": format!("#/components/schemas/{schema}") }
                    }
                }
            })
        };
        let ok = |description: &str, schema: serde_json::Value| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": schema } }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List reviews, newest first",
                        "description": "Without `public`, the full moderation queue is returned and admin credentials are required.",
                        "tags": ["Reviews"],
                        "parameters": [
                            { "name": "public", "in": "query", "schema": { "type": "string" }, "description": "Only approved reviews" },
                            { "name": "productId", "in": "query", "schema": { "type": "string", "format": "uuid" } },
                            { "name": "featured", "in": "query", "schema": { "type": "string" }, "description": "Only featured reviews" }
                        ],
                        "responses": {
                            "200": ok("Reviews", json!({ "type": "array", "items": review })),
                            "401": error_response("Moderation queue requires admin credentials")
                        }
                    },
                    "post": {
                        "summary": "Submit a review",
                        "tags": ["Reviews"],
                        "requestBody": json_body("SubmitReview"),
                        "responses": {
                            "201": ok("Stored review, pending approval", review.clone()),
                            "400": error_response("Missing or invalid fields")
                        }
                    },
                    "patch": {
                        "summary": "Approve or feature a review",
                        "tags": ["Reviews"],
                        "security": admin,
                        "requestBody": json_body("ModerateReview"),
                        "responses": {
                            "200": ok("Updated review", review.clone()),
                            "400": error_response("Missing id"),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Review not found")
                        }
                    }
                },
                "/{id}": {
                    "delete": {
                        "summary": "Delete a review",
                        "tags": ["Reviews"],
                        "security": admin,
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "string", "format": "uuid" } }
                        ],
                        "responses": {
                            "200": ok("Deleted", message_schema()),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Review not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Review": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "productId": { "type": "string", "format": "uuid" },
                            "product": {
                                "type": ["object", "null"],
                                "properties": {
                                    "id": { "type": "string", "format": "uuid" },
                                    "name": { "type": "string" }
                                }
                            },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "userName": { "type": "string" },
                            "userImage": { "type": "string" },
                            "videoLink": { "type": "string" },
                            "comment": { "type": "string" },
                            "images": { "type": "array", "items": { "type": "string" } },
                            "isApproved": { "type": "boolean" },
                            "isFeatured": { "type": "boolean" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "productId", "rating", "userName", "images", "isApproved", "isFeatured"]
                    },
                    "SubmitReview": {
                        "type": "object",
                        "properties": {
                            "productId": { "type": "string", "format": "uuid" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "userName": { "type": "string" },
                            "userImage": { "type": "string" },
                            "videoLink": { "type": "string" },
                            "comment": { "type": "string" },
                            "images": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["productId", "rating", "userName"]
                    },
                    "ModerateReview": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "isApproved": { "type": "boolean" },
                            "isFeatured": { "type": "boolean" }
                        },
                        "required": ["id"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS review (
                    id          TEXT PRIMARY KEY NOT NULL,
                    product_id  TEXT NOT NULL,
                    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    user_name   TEXT NOT NULL CHECK (user_name <> ''),
                    user_image  TEXT,
                    video_link  TEXT,
                    comment     TEXT,
                    images      TEXT NOT NULL DEFAULT '[]',
                    is_approved INTEGER NOT NULL DEFAULT 0,
                    is_featured INTEGER NOT NULL DEFAULT 0,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS review_product_idx ON review (product_id);
                CREATE INDEX IF NOT EXISTS review_approved_idx ON review (is_approved, created_at);
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(ReviewsModule::new(state))
}
