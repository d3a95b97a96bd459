//! Record store: typed CRUD and live queries over the workout collection
//!
//! One SQLite table backs every record kind; this module is the only writer.
//! Live queries are push-based: every write broadcasts a change event, and
//! each subscription re-runs its own filtered query when an event matches,
//! delivering a fresh ordered snapshot. Delivery within one subscription is
//! strictly ordered; nothing is guaranteed between subscriptions.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::calendar::month_range;
use crate::identity::AuthState;
use crate::models::record::{
  GeneratedPlan, JournalEntry, LoggedWorkout, NewWorkoutRecord, RecordDetail, RecordKind,
  WorkoutRecord,
};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
  #[error("Store unavailable: no authenticated owner")]
  Unavailable,

  #[error("Invalid record: {0}")]
  Invalid(String),

  #[error("Write failed: {0}")]
  Write(String),

  #[error("Query failed: {0}")]
  Query(String),
}

/// ---------------------------------------------------------------------------
/// Filters
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  #[default]
  CreatedAsc,
  CreatedDesc,
}

/// What a query or subscription matches. Owner scoping is implicit; every
/// query runs as the store's current owner.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
  kinds: Option<Vec<RecordKind>>,
  date: Option<NaiveDate>,
  date_range: Option<(NaiveDate, NaiveDate)>,
  order: SortOrder,
  limit: Option<i64>,
}

impl RecordFilter {
  pub fn all() -> Self {
    Self::default()
  }

  pub fn kind(kind: RecordKind) -> Self {
    Self {
      kinds: Some(vec![kind]),
      ..Self::default()
    }
  }

  pub fn kinds(kinds: impl IntoIterator<Item = RecordKind>) -> Self {
    Self {
      kinds: Some(kinds.into_iter().collect()),
      ..Self::default()
    }
  }

  pub fn on_date(mut self, date: NaiveDate) -> Self {
    self.date = Some(date);
    self
  }

  pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
    self.date_range = Some((start, end));
    self
  }

  pub fn newest_first(mut self) -> Self {
    self.order = SortOrder::CreatedDesc;
    self
  }

  pub fn oldest_first(mut self) -> Self {
    self.order = SortOrder::CreatedAsc;
    self
  }

  pub fn limit(mut self, limit: i64) -> Self {
    self.limit = Some(limit);
    self
  }

  /// History view: all generated workouts, newest first.
  pub fn generated_history() -> Self {
    Self::kinds(RecordKind::generated()).newest_first()
  }

  /// Continuity context: the single most recent generated primary workout.
  pub fn latest_generated_primary() -> Self {
    Self::kind(RecordKind::GeneratedPrimary).newest_first().limit(1)
  }

  /// Day detail view: everything on one day except the journal.
  pub fn day_detail(date: NaiveDate) -> Self {
    Self::kinds([
      RecordKind::Logged,
      RecordKind::GeneratedPrimary,
      RecordKind::GeneratedStrength,
    ])
    .on_date(date)
    .oldest_first()
  }

  /// The journal entry for one day (at most one exists).
  pub fn journal_on(date: NaiveDate) -> Self {
    Self::kind(RecordKind::Journal).on_date(date)
  }

  /// Month calendar view: every record kind within the month.
  pub fn month(year: i32, month: u32) -> Result<Self, StoreError> {
    let (start, end) = month_range(year, month)
      .ok_or_else(|| StoreError::Invalid(format!("Invalid month: {}-{}", year, month)))?;
    Ok(Self::all().between(start, end))
  }

  fn matches(&self, event: &ChangeEvent) -> bool {
    if let Some(kinds) = &self.kinds {
      if !kinds.contains(&event.kind) {
        return false;
      }
    }
    if let Some(date) = self.date {
      if event.date != date {
        return false;
      }
    }
    if let Some((start, end)) = self.date_range {
      if event.date < start || event.date > end {
        return false;
      }
    }
    true
  }

  fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>, owner_id: &str) {
    qb.push(" WHERE owner_id = ");
    qb.push_bind(owner_id.to_owned());

    if let Some(kinds) = &self.kinds {
      if kinds.is_empty() {
        // An empty one-of set matches nothing.
        qb.push(" AND 0");
      } else {
        qb.push(" AND kind IN (");
        let mut separated = qb.separated(", ");
        for kind in kinds {
          separated.push_bind(kind.as_str());
        }
        qb.push(")");
      }
    }
    if let Some(date) = self.date {
      qb.push(" AND date = ");
      qb.push_bind(date);
    }
    if let Some((start, end)) = self.date_range {
      qb.push(" AND date >= ");
      qb.push_bind(start);
      qb.push(" AND date <= ");
      qb.push_bind(end);
    }
  }

  fn push_order_limit(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
    qb.push(match self.order {
      SortOrder::CreatedAsc => " ORDER BY created_at ASC, id ASC",
      SortOrder::CreatedDesc => " ORDER BY created_at DESC, id DESC",
    });
    if let Some(limit) = self.limit {
      qb.push(" LIMIT ");
      qb.push_bind(limit);
    }
  }
}

/// ---------------------------------------------------------------------------
/// Change Events
/// ---------------------------------------------------------------------------

/// Broadcast after every successful write; carries just enough for each
/// subscription to decide whether its result set may have changed.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
  pub owner_id: String,
  pub kind: RecordKind,
  pub date: NaiveDate,
}

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// ---------------------------------------------------------------------------
/// Row Mapping
/// ---------------------------------------------------------------------------

const RECORD_COLUMNS: &str = "id, owner_id, kind, created_at, date, sport, plan_text, \
  profile_json, daily_state_json, duration_minutes, perceived_effort, distance_or_load, \
  notes, content";

#[derive(sqlx::FromRow)]
struct RecordRow {
  id: i64,
  owner_id: String,
  kind: String,
  created_at: i64,
  date: NaiveDate,
  sport: Option<String>,
  plan_text: Option<String>,
  profile_json: Option<String>,
  daily_state_json: Option<String>,
  duration_minutes: Option<i64>,
  perceived_effort: Option<i64>,
  distance_or_load: Option<String>,
  notes: Option<String>,
  content: Option<String>,
}

impl RecordRow {
  fn into_record(self) -> Result<WorkoutRecord, StoreError> {
    let missing = |field: &str| {
      StoreError::Query(format!("Record {} is missing required field {}", self.id, field))
    };

    let kind = RecordKind::parse(&self.kind)
      .ok_or_else(|| StoreError::Query(format!("Unknown record kind: {}", self.kind)))?;
    let created_at = DateTime::from_timestamp_millis(self.created_at)
      .ok_or_else(|| StoreError::Query(format!("Invalid timestamp: {}", self.created_at)))?;

    let detail = match kind {
      RecordKind::GeneratedPrimary | RecordKind::GeneratedStrength => {
        let profile_json = self.profile_json.clone().ok_or_else(|| missing("profile_json"))?;
        let daily_json = self
          .daily_state_json
          .clone()
          .ok_or_else(|| missing("daily_state_json"))?;
        let plan = GeneratedPlan {
          sport: self.sport.clone().ok_or_else(|| missing("sport"))?,
          plan_text: self.plan_text.clone().ok_or_else(|| missing("plan_text"))?,
          profile: serde_json::from_str(&profile_json)
            .map_err(|e| StoreError::Query(format!("Record {}: {}", self.id, e)))?,
          daily_state: serde_json::from_str(&daily_json)
            .map_err(|e| StoreError::Query(format!("Record {}: {}", self.id, e)))?,
        };
        if kind == RecordKind::GeneratedPrimary {
          RecordDetail::GeneratedPrimary(plan)
        } else {
          RecordDetail::GeneratedStrength(plan)
        }
      }
      RecordKind::Logged => RecordDetail::Logged(LoggedWorkout {
        sport: self.sport.clone().ok_or_else(|| missing("sport"))?,
        duration_minutes: self.duration_minutes.ok_or_else(|| missing("duration_minutes"))?,
        perceived_effort: self.perceived_effort.ok_or_else(|| missing("perceived_effort"))?,
        distance_or_load: self.distance_or_load.clone(),
        notes: self.notes.clone(),
      }),
      RecordKind::Journal => RecordDetail::Journal(JournalEntry {
        content: self.content.clone().ok_or_else(|| missing("content"))?,
      }),
    };

    Ok(WorkoutRecord {
      id: self.id,
      owner_id: self.owner_id,
      created_at,
      date: self.date,
      detail,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Record Store
/// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RecordStore {
  pool: SqlitePool,
  auth: watch::Receiver<AuthState>,
  changes: broadcast::Sender<ChangeEvent>,
}

impl RecordStore {
  /// Build a store over an initialized pool, scoped by the identity feed.
  pub fn new(pool: SqlitePool, auth: watch::Receiver<AuthState>) -> Self {
    let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
    Self { pool, auth, changes }
  }

  fn owner(&self) -> Result<String, StoreError> {
    self
      .auth
      .borrow()
      .owner_id()
      .map(str::to_string)
      .ok_or(StoreError::Unavailable)
  }

  fn notify(&self, owner_id: String, kind: RecordKind, date: NaiveDate) {
    // Send only fails when no subscription is live.
    let _ = self.changes.send(ChangeEvent { owner_id, kind, date });
  }

  /// Persist a new record. `created_at` is assigned now unless the caller
  /// supplied one (the generated pair shares a single timestamp).
  pub async fn create(&self, record: NewWorkoutRecord) -> Result<i64, StoreError> {
    let owner_id = self.owner()?;
    validate_detail(&record.detail)?;

    let created_at = record.created_at.unwrap_or_else(Utc::now);
    let id = insert_record(&self.pool, &owner_id, created_at, record.date, &record.detail).await?;

    tracing::debug!(id, kind = record.detail.kind().as_str(), "record created");
    self.notify(owner_id, record.detail.kind(), record.date);
    Ok(id)
  }

  /// Create or update the journal entry for one day.
  ///
  /// Point lookup immediately before the write, not a transaction: two
  /// concurrent upserts for the same day can both miss the lookup and insert
  /// twice. The window is one query wide and last write wins on content.
  pub async fn upsert_journal(&self, date: NaiveDate, content: &str) -> Result<i64, StoreError> {
    let owner_id = self.owner()?;

    let existing: Option<(i64,)> =
      sqlx::query_as("SELECT id FROM records WHERE owner_id = ?1 AND kind = ?2 AND date = ?3")
        .bind(&owner_id)
        .bind(RecordKind::Journal.as_str())
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

    let id = match existing {
      Some((id,)) => {
        sqlx::query("UPDATE records SET content = ?1, created_at = ?2 WHERE id = ?3")
          .bind(content)
          .bind(Utc::now().timestamp_millis())
          .bind(id)
          .execute(&self.pool)
          .await
          .map_err(|e| StoreError::Write(e.to_string()))?;
        id
      }
      None => {
        let detail = RecordDetail::Journal(JournalEntry {
          content: content.to_string(),
        });
        insert_record(&self.pool, &owner_id, Utc::now(), date, &detail).await?
      }
    };

    self.notify(owner_id, RecordKind::Journal, date);
    Ok(id)
  }

  /// Delete one record. Deleting an id that does not exist (or belongs to
  /// another owner) is not an error.
  pub async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
    let owner_id = self.owner()?;

    let row: Option<(String, NaiveDate)> =
      sqlx::query_as("SELECT kind, date FROM records WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(&owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

    let Some((kind, date)) = row else {
      return Ok(());
    };

    sqlx::query("DELETE FROM records WHERE id = ?1 AND owner_id = ?2")
      .bind(id)
      .bind(&owner_id)
      .execute(&self.pool)
      .await
      .map_err(|e| StoreError::Write(e.to_string()))?;

    if let Some(kind) = RecordKind::parse(&kind) {
      self.notify(owner_id, kind, date);
    }
    Ok(())
  }

  /// Delete everything matching the filter as of now. Records added while
  /// the batch runs survive. Individual failures are aggregated into one
  /// error; deletes that already completed are not rolled back.
  pub async fn delete_many(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
    let owner_id = self.owner()?;

    let mut qb = QueryBuilder::new("SELECT id, kind, date FROM records");
    filter.push_where(&mut qb, &owner_id);
    let targets: Vec<(i64, String, NaiveDate)> = qb
      .build_query_as()
      .fetch_all(&self.pool)
      .await
      .map_err(|e| StoreError::Query(e.to_string()))?;

    let total = targets.len();
    let mut deleted = 0u64;
    let mut failures = Vec::new();

    for (id, kind, date) in targets {
      match sqlx::query("DELETE FROM records WHERE id = ?1")
        .bind(id)
        .execute(&self.pool)
        .await
      {
        Ok(_) => {
          deleted += 1;
          if let Some(kind) = RecordKind::parse(&kind) {
            self.notify(owner_id.clone(), kind, date);
          }
        }
        Err(e) => failures.push(format!("{}: {}", id, e)),
      }
    }

    if !failures.is_empty() {
      return Err(StoreError::Write(format!(
        "{} of {} deletes failed: {}",
        failures.len(),
        total,
        failures.join("; ")
      )));
    }

    tracing::debug!(deleted, "bulk delete finished");
    Ok(deleted)
  }

  /// Delete every generated workout (both halves) for the current owner.
  pub async fn clear_generated_history(&self) -> Result<u64, StoreError> {
    self.delete_many(&RecordFilter::kinds(RecordKind::generated())).await
  }

  /// One-shot ordered query.
  pub async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<WorkoutRecord>, StoreError> {
    let owner_id = self.owner()?;
    fetch_matching(&self.pool, &owner_id, filter).await
  }

  /// Register a live query. The subscription delivers the current matching
  /// set immediately, then a fresh set after every write affecting the match.
  /// It ends when dropped, when a query fails (after delivering the error),
  /// or when the owner signs out.
  pub fn subscribe(&self, filter: RecordFilter) -> Result<Subscription, StoreError> {
    let owner_id = self.owner()?;
    // Register for changes before the initial query so no write can fall
    // between snapshot and stream.
    let mut changes = self.changes.subscribe();
    let mut auth = self.auth.clone();
    let pool = self.pool.clone();
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
      match fetch_matching(&pool, &owner_id, &filter).await {
        Ok(snapshot) => {
          if tx.send(Ok(snapshot)).is_err() {
            return;
          }
        }
        Err(e) => {
          tracing::warn!(error = %e, "subscription initial query failed");
          let _ = tx.send(Err(e));
          return;
        }
      }

      loop {
        tokio::select! {
          changed = auth.changed() => {
            let still_mine = changed.is_ok()
              && auth.borrow_and_update().owner_id() == Some(owner_id.as_str());
            if !still_mine {
              break;
            }
          }
          event = changes.recv() => {
            let relevant = match event {
              Ok(ev) => ev.owner_id == owner_id && filter.matches(&ev),
              // Dropped events are covered by a fresh snapshot.
              Err(broadcast::error::RecvError::Lagged(_)) => true,
              Err(broadcast::error::RecvError::Closed) => break,
            };
            if !relevant {
              continue;
            }
            match fetch_matching(&pool, &owner_id, &filter).await {
              Ok(snapshot) => {
                if tx.send(Ok(snapshot)).is_err() {
                  break;
                }
              }
              Err(e) => {
                tracing::warn!(error = %e, "subscription re-query failed");
                let _ = tx.send(Err(e));
                break;
              }
            }
          }
        }
      }
    });

    Ok(Subscription { rx, handle })
  }
}

fn validate_detail(detail: &RecordDetail) -> Result<(), StoreError> {
  match detail {
    RecordDetail::Logged(logged) => {
      if !(1..=10).contains(&logged.perceived_effort) {
        return Err(StoreError::Invalid(format!(
          "Perceived effort must be between 1 and 10, got {}",
          logged.perceived_effort
        )));
      }
      if logged.duration_minutes < 0 {
        return Err(StoreError::Invalid("Duration cannot be negative".to_string()));
      }
      Ok(())
    }
    RecordDetail::GeneratedPrimary(plan) | RecordDetail::GeneratedStrength(plan) => {
      if plan.plan_text.trim().is_empty() {
        return Err(StoreError::Invalid("Generated plan text is empty".to_string()));
      }
      Ok(())
    }
    RecordDetail::Journal(_) => Ok(()),
  }
}

async fn insert_record(
  pool: &SqlitePool,
  owner_id: &str,
  created_at: DateTime<Utc>,
  date: NaiveDate,
  detail: &RecordDetail,
) -> Result<i64, StoreError> {
  let mut sport = None;
  let mut plan_text = None;
  let mut profile_json = None;
  let mut daily_state_json = None;
  let mut duration_minutes = None;
  let mut perceived_effort = None;
  let mut distance_or_load = None;
  let mut notes = None;
  let mut content = None;

  match detail {
    RecordDetail::GeneratedPrimary(plan) | RecordDetail::GeneratedStrength(plan) => {
      sport = Some(plan.sport.clone());
      plan_text = Some(plan.plan_text.clone());
      profile_json = Some(
        serde_json::to_string(&plan.profile).map_err(|e| StoreError::Write(e.to_string()))?,
      );
      daily_state_json = Some(
        serde_json::to_string(&plan.daily_state).map_err(|e| StoreError::Write(e.to_string()))?,
      );
    }
    RecordDetail::Logged(logged) => {
      sport = Some(logged.sport.clone());
      duration_minutes = Some(logged.duration_minutes);
      perceived_effort = Some(logged.perceived_effort);
      distance_or_load = logged.distance_or_load.clone();
      notes = logged.notes.clone();
    }
    RecordDetail::Journal(journal) => {
      content = Some(journal.content.clone());
    }
  }

  let result = sqlx::query(
    r#"
    INSERT INTO records (
      owner_id, kind, created_at, date, sport, plan_text, profile_json,
      daily_state_json, duration_minutes, perceived_effort, distance_or_load,
      notes, content
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    "#,
  )
  .bind(owner_id)
  .bind(detail.kind().as_str())
  .bind(created_at.timestamp_millis())
  .bind(date)
  .bind(sport)
  .bind(plan_text)
  .bind(profile_json)
  .bind(daily_state_json)
  .bind(duration_minutes)
  .bind(perceived_effort)
  .bind(distance_or_load)
  .bind(notes)
  .bind(content)
  .execute(pool)
  .await
  .map_err(|e| StoreError::Write(e.to_string()))?;

  Ok(result.last_insert_rowid())
}

async fn fetch_matching(
  pool: &SqlitePool,
  owner_id: &str,
  filter: &RecordFilter,
) -> Result<Vec<WorkoutRecord>, StoreError> {
  let mut qb = QueryBuilder::new(format!("SELECT {} FROM records", RECORD_COLUMNS));
  filter.push_where(&mut qb, owner_id);
  filter.push_order_limit(&mut qb);

  let rows: Vec<RecordRow> = qb
    .build_query_as()
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Query(e.to_string()))?;

  rows.into_iter().map(RecordRow::into_record).collect()
}

/// ---------------------------------------------------------------------------
/// Subscription Handle
/// ---------------------------------------------------------------------------

/// Handle to a live query. Dropping it (or calling `unsubscribe`) stops
/// delivery and releases the underlying task.
pub struct Subscription {
  rx: mpsc::UnboundedReceiver<Result<Vec<WorkoutRecord>, StoreError>>,
  handle: JoinHandle<()>,
}

impl Subscription {
  /// Next delivery: the full current matching set. `None` once the feed has
  /// ended (sign-out or a delivered error).
  pub async fn recv(&mut self) -> Option<Result<Vec<WorkoutRecord>, StoreError>> {
    self.rx.recv().await
  }

  pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
