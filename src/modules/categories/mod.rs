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

/// Category catalog: public browsing, admin management.
pub struct CategoriesModule {
    state: AppState,
}

impl CategoriesModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for CategoriesModule {
    fn name(&self) -> &'static str {
        "categories"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "categories module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(routes::list_categories).post(routes::create_category),
            )
            .route("/slug/{slug}", get(routes::get_category_by_slug))
            .route(
                "/{id}",
                get(routes::get_category)
                    .put(routes::update_category)
                    .delete(routes::delete_category),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let category = json!({ "$ref": "#/components/schemas/Category" });
        let body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/CategoryPayload" }
                }
            }
        });
        let ok = |description: &str, schema: serde_json::Value| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": schema } }
            })
        };
        let admin = json!([{ "adminToken": [] }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List categories, newest first",
                        "tags": ["Categories"],
                        "responses": {
                            "200": ok("Categories", json!({ "type": "array", "items": category })),
                            "500": error_response("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a category",
                        "tags": ["Categories"],
                        "security": admin,
                        "requestBody": body,
                        "responses": {
                            "201": ok("Created category", category.clone()),
                            "400": error_response("Missing name or image"),
                            "401": error_response("Missing admin credentials"),
                            "409": error_response("Slug already exists")
                        }
                    }
                },
                "/slug/{slug}": {
                    "get": {
                        "summary": "Get a category by slug",
                        "tags": ["Categories"],
                        "parameters": [
                            { "name": "slug", "in": "path", "required": true, "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": ok("Category", category.clone()),
                            "404": error_response("Category not found")
                        }
                    }
                },
                "/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "string", "format": "uuid" } }
                    ],
                    "get": {
                        "summary": "Get a category",
                        "tags": ["Categories"],
                        "responses": {
                            "200": ok("Category", category.clone()),
                            "400": error_response("Invalid id"),
                            "404": error_response("Category not found")
                        }
                    },
                    "put": {
                        "summary": "Update a category",
                        "tags": ["Categories"],
                        "security": admin,
                        "requestBody": body,
                        "responses": {
                            "200": ok("Updated category", category.clone()),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Category not found"),
                            "409": error_response("Slug already exists")
                        }
                    },
                    "delete": {
                        "summary": "Delete a category",
                        "tags": ["Categories"],
                        "security": admin,
                        "responses": {
                            "200": ok("Deleted", message_schema()),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Category not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Category": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" },
                            "slug": { "type": "string" },
                            "image": { "type": "string" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "slug", "image", "createdAt", "updatedAt"]
                    },
                    "CategoryPayload": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "image": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS category (
                    id         TEXT PRIMARY KEY NOT NULL,
                    name       TEXT NOT NULL CHECK (name <> ''),
                    slug       TEXT NOT NULL CHECK (slug <> ''),
                    image      TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS category_slug_unique ON category (slug);
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(CategoriesModule::new(state))
}
