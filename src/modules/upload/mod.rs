pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use prerna_kernel::{InitCtx, Module};
use serde_json::json;

use crate::modules::error_response;
use crate::state::AppState;

/// Multipart overhead allowed on top of the image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Image uploads into the local media store.
pub struct UploadModule {
    state: AppState,
}

impl UploadModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UploadModule {
    fn name(&self) -> &'static str {
        "upload"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            public_root = %ctx.settings.media.public_root.display(),
            max_upload_bytes = ctx.settings.media.max_upload_bytes,
            "upload module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let body_limit = self.state.settings.media.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
        Router::new()
            .route("/", post(routes::upload_image))
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Upload an image",
                        "description": "Uploads into `reviews` are public; `products` and `categories` need admin credentials.",
                        "tags": ["Upload"],
                        "security": [{}, { "adminToken": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "multipart/form-data": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "file": { "type": "string", "format": "binary" },
                                            "folder": { "type": "string", "enum": ["products", "categories", "reviews"] }
                                        },
                                        "required": ["file", "folder"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Public URL of the stored image",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "url": { "type": "string" } },
                                            "required": ["url"]
                                        }
                                    }
                                }
                            },
                            "400": error_response("Invalid folder, missing file, unsupported type or oversize image"),
                            "401": error_response("Missing admin credentials")
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.state.media.ensure_folders().await?;
        tracing::info!(
            module = self.name(),
            uploads_dir = %self.state.media.uploads_dir().display(),
            "upload folders ready"
        );
        Ok(())
    }
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(UploadModule::new(state))
}
