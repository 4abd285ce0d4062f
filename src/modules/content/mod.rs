pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use prerna_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::modules::{error_response, message_schema};
use crate::state::AppState;

/// Homepage content: hero carousel and embedded videos.
pub struct ContentModule {
    state: AppState,
}

impl ContentModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ContentModule {
    fn name(&self) -> &'static str {
        "content"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "content module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::get_content))
            .route("/hero", get(routes::get_hero).put(routes::update_hero))
            .route(
                "/videos",
                get(routes::list_videos)
                    .post(routes::add_video)
                    .delete(routes::delete_video),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let admin = json!([{ "adminToken": [] }]);
        let strings = json!({ "type": "array", "items": { "type": "string" } });
        let ok = |description: &str, schema: serde_json::Value| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": schema } }
            })
        };
        let site_content = json!({ "$ref": "#/components/schemas/SiteContent" });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Whole site content document",
                        "tags": ["Content"],
                        "responses": { "200": ok("Site content", site_content.clone()) }
                    }
                },
                "/hero": {
                    "get": {
                        "summary": "Hero carousel images",
                        "tags": ["Content"],
                        "responses": { "200": ok("Image URLs", strings.clone()) }
                    },
                    "put": {
                        "summary": "Replace hero carousel images",
                        "tags": ["Content"],
                        "security": admin,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "images": strings },
                                        "required": ["images"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": ok("Stored image URLs", strings.clone()),
                            "400": error_response("Images must be an array"),
                            "401": error_response("Missing admin credentials")
                        }
                    }
                },
                "/videos": {
                    "get": {
                        "summary": "Influencer and dispatch videos",
                        "tags": ["Content"],
                        "responses": {
                            "200": ok("Videos", json!({
                                "type": "object",
                                "properties": {
                                    "influencerVideos": { "type": "array", "items": { "$ref": "#/components/schemas/InfluencerVideo" } },
                                    "dispatchVideos": { "type": "array", "items": { "$ref": "#/components/schemas/DispatchVideo" } }
                                }
                            }))
                        }
                    },
                    "post": {
                        "summary": "Add a video",
                        "tags": ["Content"],
                        "security": admin,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "type": { "type": "string", "enum": ["influencer", "dispatch"] },
                                            "video": {
                                                "type": "object",
                                                "properties": {
                                                    "url": { "type": "string" },
                                                    "creatorName": { "type": "string" },
                                                    "reviewSummary": { "type": "string" },
                                                    "thumbnail": { "type": "string" }
                                                },
                                                "required": ["url"]
                                            }
                                        },
                                        "required": ["type", "video"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": ok("Updated site content", site_content.clone()),
                            "400": error_response("Missing or invalid video"),
                            "401": error_response("Missing admin credentials")
                        }
                    },
                    "delete": {
                        "summary": "Remove a video",
                        "tags": ["Content"],
                        "security": admin,
                        "parameters": [
                            { "name": "id", "in": "query", "required": true, "schema": { "type": "string", "format": "uuid" } },
                            { "name": "type", "in": "query", "required": true, "schema": { "type": "string", "enum": ["influencer", "dispatch"] } }
                        ],
                        "responses": {
                            "200": ok("Deleted", message_schema()),
                            "400": error_response("Missing id or type"),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Video not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "InfluencerVideo": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "url": { "type": "string" },
                            "creatorName": { "type": "string" },
                            "reviewSummary": { "type": "string" },
                            "embedUrl": { "type": "string" }
                        },
                        "required": ["id", "url", "creatorName", "embedUrl"]
                    },
                    "DispatchVideo": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "url": { "type": "string" },
                            "thumbnail": { "type": "string" },
                            "embedUrl": { "type": "string" }
                        },
                        "required": ["id", "url", "thumbnail", "embedUrl"]
                    },
                    "SiteContent": {
                        "type": "object",
                        "properties": {
                            "heroImages": strings,
                            "influencerVideos": { "type": "array", "items": { "$ref": "#/components/schemas/InfluencerVideo" } },
                            "dispatchVideos": { "type": "array", "items": { "$ref": "#/components/schemas/DispatchVideo" } },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["heroImages", "influencerVideos", "dispatchVideos"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS site_content (
                    id                INTEGER PRIMARY KEY CHECK (id = 1),
                    hero_images       TEXT NOT NULL DEFAULT '[]',
                    influencer_videos TEXT NOT NULL DEFAULT '[]',
                    dispatch_videos   TEXT NOT NULL DEFAULT '[]',
                    created_at        TEXT NOT NULL,
                    updated_at        TEXT NOT NULL
                );
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(ContentModule::new(state))
}
