//! SQLite persistence plumbing: pool factory, module migrations, repository errors.
//!
//! Every storefront collection is a table owned by one module. Modules ship
//! their schema through `Module::migrations()`; [`migrate::run_migrations`]
//! applies each one exactly once.

pub mod migrate;
mod module;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use prerna_kernel::settings::DatabaseSettings;

pub use migrate::run_migrations;
pub use module::DatabaseModule;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a write failure, turning unique-constraint violations into `Conflict`.
    pub fn on_write(err: sqlx::Error, conflict: impl FnOnce() -> String) -> Self {
        if is_unique_violation(&err) {
            Self::Conflict(conflict())
        } else {
            Self::Database(err)
        }
    }
}

/// Whether the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Parse an id column stored as hyphenated UUID text.
pub fn decode_uuid(raw: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid id '{raw}': {e}")))
}

/// Decode a JSON text column.
pub fn decode_json<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid json in {column}: {e}")))
}

/// Encode a value for a JSON text column.
pub fn encode_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("unencodable json: {e}")))
}

/// Create a SQLite connection pool from settings.
///
/// In-memory databases live as long as their connection, so the pool keeps
/// its connections forever in that case.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = settings.url.contains(":memory:");
    if !in_memory {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }
    }

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10));
    if in_memory {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .context("failed to open database pool")?;

    tracing::info!(url = %settings.url, "database pool created");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unique_violations_become_conflicts() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        sqlx::query("CREATE TABLE t (slug TEXT NOT NULL UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (slug) VALUES ('silk')")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO t (slug) VALUES ('silk')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));

        let mapped = RepositoryError::on_write(err, || "slug 'silk' exists".to_string());
        assert!(matches!(mapped, RepositoryError::Conflict(msg) if msg.contains("silk")));
    }

    #[test]
    fn corrupt_columns_are_reported() {
        assert!(decode_uuid("0190b5a2-6c1e-7c3a-9a53-5d8f0e2b7c11").is_ok());
        assert!(matches!(
            decode_uuid("not-a-uuid"),
            Err(RepositoryError::DataCorruption(msg)) if msg.contains("not-a-uuid")
        ));

        let images: Vec<String> = decode_json("images", r#"["/uploads/a.jpg"]"#).unwrap();
        assert_eq!(images, vec!["/uploads/a.jpg".to_string()]);
        assert!(decode_json::<Vec<String>>("images", "{oops").is_err());
        assert_eq!(encode_json(&images).unwrap(), r#"["/uploads/a.jpg"]"#);
    }

    #[tokio::test]
    async fn other_errors_stay_database_errors() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let err = sqlx::query("SELECT * FROM missing_table")
            .execute(&pool)
            .await
            .unwrap_err();

        let mapped = RepositoryError::on_write(err, || unreachable!());
        assert!(matches!(mapped, RepositoryError::Database(_)));
    }
}
