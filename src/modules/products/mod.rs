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

/// Saree catalog with WhatsApp ordering links.
pub struct ProductsModule {
    state: AppState,
}

impl ProductsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ProductsModule {
    fn name(&self) -> &'static str {
        "products"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            whatsapp_number = %ctx.settings.storefront.whatsapp_number,
            public_base_url = %ctx.settings.storefront.public_base_url,
            "products module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_products).post(routes::create_product))
            .route(
                "/{id}",
                get(routes::get_product)
                    .put(routes::update_product)
                    .delete(routes::delete_product),
            )
            .route("/{id}/order-link", get(routes::order_link))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let product = json!({ "$ref": "#/components/schemas/Product" });
        let admin = json!([{ "adminToken": [] }]);
        let id_param = json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });
        let body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ProductPayload" }
                }
            }
        });
        let ok = |description: &str, schema: serde_json::Value| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": schema } }
            })
        };
        let optional_string = json!({ "type": "string" });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List products, newest first",
                        "description": "An unknown category slug lists every product.",
                        "tags": ["Products"],
                        "parameters": [
                            { "name": "category", "in": "query", "schema": { "type": "string" }, "description": "Category slug" }
                        ],
                        "responses": {
                            "200": ok("Products", json!({ "type": "array", "items": product }))
                        }
                    },
                    "post": {
                        "summary": "Create a product",
                        "tags": ["Products"],
                        "security": admin,
                        "requestBody": body,
                        "responses": {
                            "201": ok("Created product", product.clone()),
                            "400": error_response("Missing or invalid fields"),
                            "401": error_response("Missing admin credentials")
                        }
                    }
                },
                "/{id}": {
                    "parameters": [id_param],
                    "get": {
                        "summary": "Get a product",
                        "tags": ["Products"],
                        "responses": {
                            "200": ok("Product", product.clone()),
                            "404": error_response("Product not found")
                        }
                    },
                    "put": {
                        "summary": "Update a product",
                        "tags": ["Products"],
                        "security": admin,
                        "requestBody": body,
                        "responses": {
                            "200": ok("Updated product", product.clone()),
                            "400": error_response("Invalid fields"),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Product not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a product and its uploaded images",
                        "tags": ["Products"],
                        "security": admin,
                        "responses": {
                            "200": ok("Deleted", message_schema()),
                            "401": error_response("Missing admin credentials"),
                            "404": error_response("Product not found")
                        }
                    }
                },
                "/{id}/order-link": {
                    "parameters": [id_param],
                    "get": {
                        "summary": "WhatsApp order link for a product",
                        "tags": ["Products"],
                        "responses": {
                            "200": ok("Order link", json!({
                                "type": "object",
                                "properties": { "url": { "type": "string" } },
                                "required": ["url"]
                            })),
                            "404": error_response("Product not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ProductSpecs": {
                        "type": "object",
                        "properties": {
                            "color": optional_string,
                            "fabric": optional_string,
                            "design": optional_string,
                            "border": optional_string,
                            "blouse": optional_string
                        }
                    },
                    "Product": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" },
                            "description": { "type": "string" },
                            "price": { "type": "number", "exclusiveMinimum": 0 },
                            "categoryId": { "type": "string", "format": "uuid" },
                            "category": {
                                "oneOf": [
                                    { "$ref": "#/components/schemas/Category" },
                                    { "type": "null" }
                                ]
                            },
                            "images": { "type": "array", "items": { "type": "string" } },
                            "specs": { "$ref": "#/components/schemas/ProductSpecs" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "description", "price", "categoryId", "images", "specs"]
                    },
                    "ProductPayload": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "description": { "type": "string" },
                            "price": { "type": "number" },
                            "category": { "type": "string", "format": "uuid" },
                            "images": { "type": "array", "items": { "type": "string" } },
                            "specs": { "$ref": "#/components/schemas/ProductSpecs" }
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
                CREATE TABLE IF NOT EXISTS product (
                    id          TEXT PRIMARY KEY NOT NULL,
                    name        TEXT NOT NULL CHECK (name <> ''),
                    description TEXT NOT NULL,
                    price       TEXT NOT NULL,
                    category_id TEXT NOT NULL,
                    images      TEXT NOT NULL DEFAULT '[]',
                    specs       TEXT NOT NULL DEFAULT '{}',
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS product_category_idx ON product (category_id);
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(ProductsModule::new(state))
}
