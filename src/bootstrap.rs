//! Process lifecycle: open the store, migrate, run modules, shut down.

use anyhow::Context;
use biblio_kernel::{settings::Settings, Database, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry holding every application module.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

async fn open_database(settings: &Settings) -> anyhow::Result<Database> {
    Database::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to open database at {}", settings.database.url))
}

async fn migrate_with(db: &Database, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let applied = db
        .apply_migrations(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");
    Ok(applied)
}

/// Apply pending migrations and return how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = open_database(settings).await?;
    let result = migrate_with(&db, &registry()).await;
    db.close().await;
    result
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let db = open_database(settings).await?;
    let registry = registry();
    migrate_with(&db, &registry).await?;

    let ctx = InitCtx {
        settings,
        db: &db,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = biblio_http::start_server(&registry, settings, shutdown_signal()).await;

    let stopped = registry.stop_modules().await;
    db.close().await;
    tracing::info!("biblio shut down");

    served?;
    stopped
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_kernel::settings::DatabaseSettings;

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("biblio-migrate-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let settings = Settings {
            database: DatabaseSettings {
                url: format!("sqlite://{}", dir.join("library.db").display()),
                max_connections: 1,
            },
            ..Settings::default()
        };

        assert_eq!(migrate(&settings).await.unwrap(), 1);
        assert_eq!(migrate(&settings).await.unwrap(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn registry_contains_books() {
        let registry = registry();
        assert_eq!(registry.module_count(), 1);
        assert!(registry.get_module("books").is_some());
    }
}
