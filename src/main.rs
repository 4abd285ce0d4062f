use anyhow::Context;

use prerna_app::App;
use prerna_kernel::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Prerna settings")?;
    prerna_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "prerna-app bootstrap starting"
    );

    let app = App::bootstrap(settings).await?;
    tracing::info!(
        modules = app.registry().modules().len(),
        "prerna-app bootstrap complete"
    );

    app.serve().await
}
