use async_trait::async_trait;
use prerna_kernel::{InitCtx, Module};
use sqlx::SqlitePool;

/// Core module owning the connection pool lifecycle.
pub struct DatabaseModule {
    pool: SqlitePool,
}

impl DatabaseModule {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        tracing::info!(module = self.name(), "database reachable");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        tracing::info!(module = self.name(), "database pool closed");
        Ok(())
    }
}
