//! Applies module migrations once each, tracked in `_migrations`.

use chrono::Utc;
use sqlx::SqlitePool;

use prerna_kernel::Migration;

const BOOKKEEPING_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (module, id)
    )";

/// Apply every migration not yet recorded. Returns how many ran.
///
/// Each migration runs in its own transaction together with its bookkeeping row.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> Result<usize, sqlx::Error> {
    sqlx::query(BOOKKEEPING_TABLE).execute(pool).await?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;
        if existing.is_some() {
            tracing::debug!(module = %module, migration = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO _migrations (module, id, applied_at) VALUES (?, ?, ?)")
            .bind(module)
            .bind(migration.id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(module = %module, migration = migration.id, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// List applied migrations as `(module, id)`, oldest first.
pub async fn applied_migrations(pool: &SqlitePool) -> Result<Vec<(String, String)>, sqlx::Error> {
    sqlx::query(BOOKKEEPING_TABLE).execute(pool).await?;
    sqlx::query_as("SELECT module, id FROM _migrations ORDER BY applied_at, module, id")
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use prerna_kernel::settings::DatabaseSettings;

    fn catalog_migrations() -> Vec<(String, Migration)> {
        vec![(
            "categories".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE category (id TEXT PRIMARY KEY);
                     CREATE INDEX category_id_idx ON category (id);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let pool = crate::connect(&DatabaseSettings::in_memory()).await.unwrap();
        let migrations = catalog_migrations();

        assert_eq!(run_migrations(&pool, &migrations).await.unwrap(), 1);
        assert_eq!(run_migrations(&pool, &migrations).await.unwrap(), 0);

        let applied = applied_migrations(&pool).await.unwrap();
        assert_eq!(
            applied,
            vec![("categories".to_string(), "001_init".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let pool = crate::connect(&DatabaseSettings::in_memory()).await.unwrap();
        let broken = vec![(
            "reviews".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE review (id TEXT PRIMARY KEY); THIS IS NOT SQL;",
            },
        )];

        assert!(run_migrations(&pool, &broken).await.is_err());
        assert!(applied_migrations(&pool).await.unwrap().is_empty());
    }
}
