//! Application assembly: pool, state, module registry and lifecycle.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sqlx::SqlitePool;

use prerna_kernel::{InitCtx, ModuleRegistry, Settings};

use crate::modules;
use crate::state::AppState;

pub struct App {
    registry: ModuleRegistry,
    state: AppState,
}

impl App {
    /// Connect to the configured database, migrate and boot every module.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let pool = prerna_db::connect(&settings.database).await?;
        Self::with_pool(settings, pool).await
    }

    /// Same as [`App::bootstrap`] with an existing pool.
    pub async fn with_pool(settings: Settings, pool: SqlitePool) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let state = AppState::new(pool, Arc::clone(&settings));
        let registry = build_registry(&state);

        migrate(&state.pool, &registry).await?;

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.boot(&ctx).await?;

        Ok(Self { registry, state })
    }

    pub fn router(&self) -> Router {
        prerna_http::build_router(&self.registry, &self.state.settings)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Serve until a shutdown signal, then stop every module.
    pub async fn serve(self) -> anyhow::Result<()> {
        let served = prerna_http::start_server(&self.registry, &self.state.settings).await;
        self.registry
            .shutdown()
            .await
            .context("failed to stop modules")?;
        served
    }
}

/// Registry holding the core modules and every storefront module.
pub fn build_registry(state: &AppState) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state);
    registry
}

/// Apply pending module migrations. Returns how many ran.
pub async fn migrate(pool: &SqlitePool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = prerna_db::run_migrations(pool, &migrations)
        .await
        .context("failed to apply migrations")?;

    tracing::info!(
        applied,
        known = migrations.len(),
        "database migrations complete"
    );
    Ok(applied)
}

/// Open the configured database and bring its schema up to date.
pub async fn prepare_database(settings: Settings) -> anyhow::Result<(AppState, usize)> {
    let pool = prerna_db::connect(&settings.database).await?;
    let state = AppState::new(pool, Arc::new(settings));
    let applied = migrate(&state.pool, &build_registry(&state)).await?;
    Ok((state, applied))
}
