use super::traits::KvBackend;
use crate::BoxFuture;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

const KV_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS kv_meta (
    name  TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const LAYOUT_VERSION_NAME: &str = "layout_version";
/// Bump when the `kv` table layout changes.
const LAYOUT_VERSION: u32 = 1;

/// Stamp a fresh database with [`LAYOUT_VERSION`], or refuse one written with
/// a different layout.
async fn check_layout_version(pool: &SqlitePool) -> Result<()> {
    sqlx::query(KV_META_TABLE)
        .execute(pool)
        .await
        .context("create kv_meta table")?;
    sqlx::query("INSERT OR IGNORE INTO kv_meta (name, value) VALUES ($1, $2)")
        .bind(LAYOUT_VERSION_NAME)
        .bind(LAYOUT_VERSION.to_string())
        .execute(pool)
        .await
        .context("stamp history layout version")?;

    let (raw,): (String,) = sqlx::query_as("SELECT value FROM kv_meta WHERE name = $1")
        .bind(LAYOUT_VERSION_NAME)
        .fetch_one(pool)
        .await
        .context("read history layout version")?;
    let found: u32 = raw
        .parse()
        .with_context(|| format!("history layout version {raw:?} is not a number"))?;
    anyhow::ensure!(
        found == LAYOUT_VERSION,
        "history database uses layout v{found} but this riddlechat reads v{LAYOUT_VERSION}; \
delete the history database file to start over"
    );
    Ok(())
}

/// SQLite-backed key-value table using the sqlx async pool.
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    /// Wrap an existing pool and create the table if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        check_layout_version(&pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                 key TEXT PRIMARY KEY,
                 value TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             )",
        )
        .execute(&pool)
        .await
        .context("create kv table")?;

        Ok(Self { pool })
    }

    /// Open (creating if missing) a database file.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("open history database {}", path.display()))?;
        Self::new(pool).await
    }

    /// In-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::new(pool).await
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl KvBackend for SqliteKv {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("read kv entry {key}"))?;
            Ok(row.map(|(value,)| value))
        })
    }

    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO kv (key, value, updated_at) VALUES ($1, $2, $3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .with_context(|| format!("write kv entry {key}"))?;
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM kv WHERE key = $1")
                .bind(key)
                .execute(&self.pool)
                .await
                .with_context(|| format!("delete kv entry {key}"))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
