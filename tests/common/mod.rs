#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use prerna_app::App;
use prerna_kernel::settings::{AuthSettings, DatabaseSettings, MediaSettings, Settings};

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestApp {
    pub app: App,
    pub router: Router,
    pub public_root: TempDir,
}

/// Fully booted application on an in-memory database and a temporary public root.
pub async fn spawn() -> TestApp {
    let public_root = tempfile::tempdir().unwrap();
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        auth: AuthSettings {
            admin_token: Some(ADMIN_TOKEN.to_string()),
        },
        media: MediaSettings {
            public_root: public_root.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };

    let pool = prerna_db::connect(&settings.database).await.unwrap();
    let app = App::with_pool(settings, pool).await.unwrap();
    let router = app.router();
    TestApp {
        app,
        router,
        public_root,
    }
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    /// Send a JSON request, optionally with the admin bearer token.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        admin: bool,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if admin {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let (status, bytes) = self.request(builder.body(body).unwrap()).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None, false).await
    }

    /// Write a file under the public root and return its public URL.
    pub fn put_file(&self, url: &str) -> String {
        let path = self.public_root.path().join(url.trim_start_matches('/'));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"image").unwrap();
        url.to_string()
    }

    pub fn file_exists(&self, url: &str) -> bool {
        self.public_root
            .path()
            .join(url.trim_start_matches('/'))
            .exists()
    }

    pub async fn create_category(&self, name: &str) -> Value {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/categories",
                Some(serde_json::json!({ "name": name, "image": "/uploads/categories/c.jpg" })),
                true,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn create_product(&self, name: &str, category_id: &str, images: &[&str]) -> Value {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/products",
                Some(serde_json::json!({
                    "name": name,
                    "description": "Handwoven",
                    "price": 1499.5,
                    "category": category_id,
                    "images": images,
                    "specs": { "color": "Red", "fabric": " " }
                })),
                true,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}
