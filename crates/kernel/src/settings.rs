use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "PRERNA_ENV";
const CONFIG_DIR_ENV: &str = "PRERNA_CONFIG_DIR";
const ENV_PREFIX: &str = "PRERNA";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub media: MediaSettings,
    #[serde(default)]
    pub storefront: StorefrontSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `PRERNA_*` variables (`__` separates nested keys).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything a file declared.
        settings.environment = parsed_environment;

        Ok(settings)
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_url")]
    pub url: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn default_url() -> String {
        "sqlite://data/prerna.db?mode=rwc".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }

    /// In-memory database, used by tests and one-off tooling.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Fallback filter directive when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "prerna_app=info,prerna_http=info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthSettings {
    /// Shared bearer token for admin requests. Admin routes reject every
    /// request while this is unset.
    #[serde(default)]
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Directory served publicly; uploads land in `<public_root>/uploads`.
    #[serde(default = "MediaSettings::default_public_root")]
    pub public_root: PathBuf,
    #[serde(default = "MediaSettings::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl MediaSettings {
    fn default_public_root() -> PathBuf {
        PathBuf::from("public")
    }

    fn default_max_upload_bytes() -> usize {
        8 * 1024 * 1024
    }
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            public_root: Self::default_public_root(),
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontSettings {
    /// WhatsApp Business number, digits only with country code.
    #[serde(default = "StorefrontSettings::default_whatsapp_number")]
    pub whatsapp_number: String,
    /// Public origin of the storefront, used to build product links.
    #[serde(default = "StorefrontSettings::default_public_base_url")]
    pub public_base_url: String,
}

impl StorefrontSettings {
    fn default_whatsapp_number() -> String {
        "919104391918".to_string()
    }

    fn default_public_base_url() -> String {
        "http://localhost:3000".to_string()
    }
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            whatsapp_number: Self::default_whatsapp_number(),
            public_base_url: Self::default_public_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_database_is_sqlite_file() {
        let settings = Settings::default();
        assert!(settings.database.url.starts_with("sqlite://"));
        assert_eq!(settings.media.max_upload_bytes, 8 * 1024 * 1024);
        assert!(settings.auth.admin_token.is_none());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = "qa".parse::<Environment>().unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn environment_file_overlays_base_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 9000\n\n[storefront]\nwhatsapp_number = \"911111111111\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[server]\nport = 9100\n\n[media]\npublic_root = \"/srv/public\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), "staging").unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.storefront.whatsapp_number, "911111111111");
        assert_eq!(settings.media.public_root, PathBuf::from("/srv/public"));
        assert_eq!(settings.server.host, "0.0.0.0");
    }
}
