use async_trait::async_trait;
use axum::Router;

/// Handed to every module while the application boots.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// SQL migration contributed by a module.
///
/// Each migration is applied once and recorded under `(module, id)`.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A unit of the service: its routes, schema, docs and lifecycle hooks.
///
/// Core modules (`db`, `authz`) boot first; custom modules are mounted
/// under `/api/{name}` in registration order.
#[async_trait]
pub trait Module: Sync + Send {
    /// Name used in logs, migration bookkeeping and the route prefix.
    fn name(&self) -> &'static str;

    /// Runs once at startup, after every migration has been applied.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes relative to the module prefix; `/` is the prefix itself.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` relative to the module prefix and
    /// optional `components.schemas`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema migrations, applied in the order returned.
    fn migrations(&self) -> Vec<Migration> {
        Vec::new()
    }

    /// Runs after every module has been initialized.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs on shutdown, in reverse registration order.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
