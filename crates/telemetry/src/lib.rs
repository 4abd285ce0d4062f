//! Tracing bootstrap shared by the server and the CLI.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prerna_kernel::settings::{LogFormat, TelemetrySettings};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. Fails if a global subscriber
/// is already set.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let env_filter = build_filter(settings);

    let json_layer = (settings.log_format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (settings.log_format == LogFormat::Pretty).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!(target: "prerna-telemetry", format = ?settings.log_format, "telemetry initialized");
    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_falls_back_to_info() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Json,
            filter: "prerna_app=notalevel".to_string(),
        };
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(build_filter(&settings).to_string(), "info");
        }
    }

    #[test]
    fn second_init_reports_an_error() {
        let settings = TelemetrySettings::default();
        let _ = init(&settings);
        assert!(init(&settings).is_err());
    }
}
