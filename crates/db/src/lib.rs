//! SQLite connection factory and migration runner for BIBLIO.

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Migration contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _biblio_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        PRIMARY KEY (module, id)
    )
"#;

/// Handle to the catalog store.
///
/// Opened once at process start and closed explicitly at shutdown.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool against `url`, creating the database file if needed.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to '{url}'"))?;

        tracing::info!(target: "biblio-db", %url, "database connected");
        Ok(Self { pool })
    }

    /// Single-connection in-memory database. Every connection to
    /// `sqlite::memory:` is a fresh database, so the pool is capped at one.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply every migration not yet recorded in the ledger.
    ///
    /// Each migration runs in its own transaction together with its ledger
    /// row. Returns the number of migrations applied by this call.
    pub async fn apply_migrations(
        &self,
        migrations: &[(String, Migration)],
    ) -> anyhow::Result<usize> {
        sqlx::query(LEDGER_DDL)
            .execute(&self.pool)
            .await
            .context("failed to create migration ledger")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let seen: Option<(String,)> =
                sqlx::query_as("SELECT id FROM _biblio_migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await
                    .context("failed to read migration ledger")?;
            if seen.is_some() {
                tracing::debug!(
                    target: "biblio-db",
                    %module,
                    id = migration.id,
                    "migration already applied"
                );
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;
            sqlx::query("INSERT INTO _biblio_migrations (module, id) VALUES (?, ?)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(target: "biblio-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Wait for in-flight queries and close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "biblio-db", "database closed");
    }
}
