use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::db::dao::{DaoBase, HobbyDao};

const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self> {
        let normalized = url.trim().to_ascii_lowercase();
        if normalized.starts_with("postgres://") || normalized.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if normalized.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            bail!(
                "unsupported database url scheme; expected postgres://, postgresql:// or sqlite:"
            )
        }
    }
}

fn is_sqlite_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// File path of a sqlite url, `None` for in-memory databases.
fn sqlite_file(url: &str) -> Option<PathBuf> {
    if is_sqlite_memory(url) {
        return None;
    }
    let rest = url.trim().strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// Connects, applies backend session settings, syncs the schema and seeds hobbies.
pub async fn connect(cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
    let backend = Backend::from_url(&cfg.url)?;

    let mut max_connections = cfg.max_connections;
    let mut min_idle = cfg.min_idle;
    if backend == Backend::Sqlite {
        if let Some(parent) = sqlite_file(&cfg.url)
            .and_then(|file| file.parent().map(PathBuf::from))
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(&parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        // every pooled connection to :memory: would see its own empty database
        if is_sqlite_memory(&cfg.url) {
            max_connections = 1;
            min_idle = 1;
        }
    }

    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(max_connections)
        .min_connections(min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    if backend == Backend::Sqlite {
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
        db.execute_unprepared(&format!("PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS}"))
            .await?;
    }

    info!(backend = ?backend, "syncing database schema from entities");
    db.get_schema_registry("kampong_konek::db::entities::*")
        .sync(&db)
        .await?;

    let seeded = HobbyDao::new(&db).seed_defaults().await?;
    if seeded > 0 {
        info!(count = seeded, "seeded default hobbies");
    }

    Ok(db)
}
