use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::snapshots::{DailyStateSnapshot, ProfileSnapshot};

/// The three main endurance sports counted as "primary sport" activity.
pub const ENDURANCE_SPORTS: [&str; 3] = ["Swimming", "Running", "Cycling"];

/// Sport name recorded on the strength half of a generated session.
pub const LIFTING_SPORT: &str = "Lifting";

/// ---------------------------------------------------------------------------
/// Record Kinds
/// ---------------------------------------------------------------------------

/// Discriminant for the polymorphic record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
  GeneratedPrimary,
  GeneratedStrength,
  Logged,
  Journal,
}

impl RecordKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      RecordKind::GeneratedPrimary => "generated_primary",
      RecordKind::GeneratedStrength => "generated_strength",
      RecordKind::Logged => "logged",
      RecordKind::Journal => "journal",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "generated_primary" => Some(RecordKind::GeneratedPrimary),
      "generated_strength" => Some(RecordKind::GeneratedStrength),
      "logged" => Some(RecordKind::Logged),
      "journal" => Some(RecordKind::Journal),
      _ => None,
    }
  }

  /// Both halves of an AI-generated session.
  pub fn generated() -> [RecordKind; 2] {
    [RecordKind::GeneratedPrimary, RecordKind::GeneratedStrength]
  }
}

/// ---------------------------------------------------------------------------
/// Record Payloads
/// ---------------------------------------------------------------------------

/// One half of a saved AI generation (primary sport or strength section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
  pub sport: String,
  pub plan_text: String,
  pub profile: ProfileSnapshot,
  pub daily_state: DailyStateSnapshot,
}

/// A manually logged session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedWorkout {
  pub sport: String,
  pub duration_minutes: i64,
  /// Perceived effort on a 1-10 scale.
  pub perceived_effort: i64,
  pub distance_or_load: Option<String>,
  pub notes: Option<String>,
}

/// Free-text journal entry; at most one per (owner, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
  pub content: String,
}

/// Kind-specific payload of a record. Consumers match exhaustively so the
/// required fields of each kind are checked by the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetail {
  GeneratedPrimary(GeneratedPlan),
  GeneratedStrength(GeneratedPlan),
  Logged(LoggedWorkout),
  Journal(JournalEntry),
}

impl RecordDetail {
  pub fn kind(&self) -> RecordKind {
    match self {
      RecordDetail::GeneratedPrimary(_) => RecordKind::GeneratedPrimary,
      RecordDetail::GeneratedStrength(_) => RecordKind::GeneratedStrength,
      RecordDetail::Logged(_) => RecordKind::Logged,
      RecordDetail::Journal(_) => RecordKind::Journal,
    }
  }

  /// Sport label, where the kind carries one.
  pub fn sport(&self) -> Option<&str> {
    match self {
      RecordDetail::GeneratedPrimary(plan) | RecordDetail::GeneratedStrength(plan) => {
        Some(&plan.sport)
      }
      RecordDetail::Logged(logged) => Some(&logged.sport),
      RecordDetail::Journal(_) => None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Persisted Record
/// ---------------------------------------------------------------------------

/// A record as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
  pub id: i64,
  pub owner_id: String,
  pub created_at: DateTime<Utc>,
  /// The calendar day this record applies to, independent of `created_at`.
  pub date: NaiveDate,
  pub detail: RecordDetail,
}

impl WorkoutRecord {
  pub fn kind(&self) -> RecordKind {
    self.detail.kind()
  }
}

/// For inserting new records (without id and owner; `created_at` is assigned
/// at write time when not supplied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutRecord {
  pub created_at: Option<DateTime<Utc>>,
  pub date: NaiveDate,
  pub detail: RecordDetail,
}

impl NewWorkoutRecord {
  pub fn new(date: NaiveDate, detail: RecordDetail) -> Self {
    Self {
      created_at: None,
      date,
      detail,
    }
  }

  pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
    self.created_at = Some(at);
    self
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_round_trips_through_column_value() {
    for kind in [
      RecordKind::GeneratedPrimary,
      RecordKind::GeneratedStrength,
      RecordKind::Logged,
      RecordKind::Journal,
    ] {
      assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(RecordKind::parse("trackedWorkout"), None);
  }

  #[test]
  fn test_detail_reports_kind_and_sport() {
    let logged = RecordDetail::Logged(LoggedWorkout {
      sport: "Running".to_string(),
      duration_minutes: 40,
      perceived_effort: 6,
      distance_or_load: Some("8k".to_string()),
      notes: None,
    });
    assert_eq!(logged.kind(), RecordKind::Logged);
    assert_eq!(logged.sport(), Some("Running"));

    let journal = RecordDetail::Journal(JournalEntry {
      content: "easy day".to_string(),
    });
    assert_eq!(journal.kind(), RecordKind::Journal);
    assert_eq!(journal.sport(), None);
  }
}
