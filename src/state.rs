use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use prerna_authz::AdminGuard;
use prerna_kernel::Settings;

use crate::utils::media::MediaStore;

/// Shared state handed to every storefront router.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: SqlitePool,
    pub media: MediaStore,
    pub guard: AdminGuard,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: SqlitePool, settings: Arc<Settings>) -> Self {
        Self {
            media: MediaStore::new(settings.media.public_root.clone()),
            guard: AdminGuard::from_settings(&settings.auth),
            pool,
            settings,
        }
    }
}
