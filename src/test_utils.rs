//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - A ready-to-use authenticated store
//! - Mock data factories and fixtures

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::generation::persist_plan;
use crate::identity::AuthSession;
use crate::models::record::{RecordDetail, WorkoutRecord};
use crate::models::snapshots::{DailyStateSnapshot, ProfileSnapshot};
use crate::store::RecordStore;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// A store signed in as `owner_id`. The session is returned so the caller
/// keeps the identity feed alive (and can sign out mid-test).
pub async fn ready_store(owner_id: &str) -> (RecordStore, SqlitePool, AuthSession) {
  let pool = setup_test_db().await;
  let (session, auth) = AuthSession::new();
  session.sign_in(owner_id);
  let store = RecordStore::new(pool.clone(), auth);
  (store, pool, session)
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_profile() -> ProfileSnapshot {
  ProfileSnapshot::default()
}

pub fn mock_daily_state() -> DailyStateSnapshot {
  DailyStateSnapshot {
    desired_distance: "Medium (2-3km)".to_string(),
    session_focus: "Endurance".to_string(),
    performance_band: "Average".to_string(),
    resting_heart_rate: 52,
    sleep_hours: 7.5,
    sleep_score: 82,
    energy_score: 75,
  }
}

/// A full generated response containing both halves.
pub fn sample_plan_markdown() -> &'static str {
  "## Warm-up\n5 min easy swim\n## Main Set\n4x100 free on 1:45\n## Cool-down\n5 min backstroke\n## Complimentary Lifting\n3x10 goblet squats"
}

/// Persist a generated primary/strength pair on `date`; returns both ids.
pub async fn seed_generated_pair(store: &RecordStore, date: NaiveDate) -> (i64, i64) {
  let saved = persist_plan(
    store,
    sample_plan_markdown(),
    &mock_profile(),
    &mock_daily_state(),
    date,
    datetime(2024, 6, 1, 9),
  )
  .await
  .expect("Failed to seed generated pair");

  (saved.primary_id, saved.strength_id.expect("sample plan has a strength half"))
}

/// An in-memory record for pure functions that never touch the store.
pub fn test_record(id: i64, date: NaiveDate, detail: RecordDetail) -> WorkoutRecord {
  WorkoutRecord {
    id,
    owner_id: "user-1".to_string(),
    created_at: datetime(2024, 6, 1, 6),
    date,
    detail,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn datetime(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(year, month, day, hour, 0, 0)
    .single()
    .expect("valid test datetime")
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='records'")
        .fetch_all(&pool)
        .await
        .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_generated_pair_creates_two_records() {
    let (store, pool, _session) = ready_store("user-1").await;

    let (primary_id, strength_id) = seed_generated_pair(&store, date(2024, 6, 1)).await;
    assert_ne!(primary_id, strength_id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
      .fetch_one(&pool)
      .await
      .expect("Failed to count records");
    assert_eq!(count, 2);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let profile = mock_profile();
    assert_eq!(profile.sport, "Swimming");
    assert!(!profile.wants_lifting());

    let daily = mock_daily_state();
    assert!(!daily.session_focus.is_empty());
    assert!(!daily.performance_band.is_empty());
  }
}
