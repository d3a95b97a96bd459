use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;

pub type DbPool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
  #[error("Failed to create data directory: {0}")]
  DataDir(#[from] std::io::Error),

  #[error("Database connection failed: {0}")]
  Connect(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Initialize the database connection pool at an explicit path and run
/// migrations. The path is caller-supplied configuration; nothing here reads
/// ambient state.
pub async fn initialize_db(db_path: &Path) -> Result<DbPool, DbError> {
  if let Some(parent) = db_path.parent() {
    fs::create_dir_all(parent)?;
  }

  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
  tracing::debug!(url = %db_url, "initializing database");

  connect(&db_url).await
}

/// Connect to any SQLite URL (including `sqlite::memory:`) and run migrations.
pub async fn connect(db_url: &str) -> Result<DbPool, DbError> {
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
