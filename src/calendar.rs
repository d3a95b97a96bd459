//! Month calendar derived from the live record stream
//!
//! Buckets records by their logical day and classifies each day for the
//! summary grid: primary-sport work, strength work, and journal presence are
//! independent indicators, so a day can show all three at once.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::models::record::{
  RecordDetail, WorkoutRecord, ENDURANCE_SPORTS, LIFTING_SPORT,
};
use crate::store::{RecordFilter, RecordStore, StoreError, Subscription};

/// ---------------------------------------------------------------------------
/// Date Utilities
/// ---------------------------------------------------------------------------

/// First and last day of a month. `None` for an invalid month number.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  let next_first = if month == 12 {
    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
  } else {
    NaiveDate::from_ymd_opt(year, month + 1, 1)?
  };
  Some((first, next_first.pred_opt()?))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
  month_range(year, month).map(|(_, last)| last.day())
}

/// Weekday of the 1st, 0 = Sunday, matching the grid layout.
pub fn first_weekday_of_month(year: i32, month: u32) -> Option<u32> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  Some(first.weekday().num_days_from_sunday())
}

/// ---------------------------------------------------------------------------
/// Day Classification
/// ---------------------------------------------------------------------------

/// Indicator flags for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayIndicators {
  pub primary_sport: bool,
  pub strength: bool,
  pub journal: bool,
}

impl DayIndicators {
  pub fn classify(records: &[WorkoutRecord]) -> Self {
    let mut indicators = Self::default();
    for record in records {
      match &record.detail {
        RecordDetail::GeneratedPrimary(_) => indicators.primary_sport = true,
        RecordDetail::GeneratedStrength(_) => indicators.strength = true,
        RecordDetail::Logged(logged) => {
          if ENDURANCE_SPORTS.contains(&logged.sport.as_str()) {
            indicators.primary_sport = true;
          } else if logged.sport == LIFTING_SPORT {
            indicators.strength = true;
          }
        }
        RecordDetail::Journal(_) => indicators.journal = true,
      }
    }
    indicators
  }
}

/// All records on one day plus its indicator flags.
#[derive(Debug, Clone, Default)]
pub struct DaySummary {
  pub records: Vec<WorkoutRecord>,
  pub indicators: DayIndicators,
}

pub type MonthBuckets = BTreeMap<NaiveDate, DaySummary>;

/// Group records by their logical day and classify each bucket.
pub fn bucket_by_day(records: Vec<WorkoutRecord>) -> MonthBuckets {
  let mut buckets: MonthBuckets = BTreeMap::new();
  for record in records {
    buckets.entry(record.date).or_default().records.push(record);
  }
  for summary in buckets.values_mut() {
    summary.indicators = DayIndicators::classify(&summary.records);
  }
  buckets
}

/// ---------------------------------------------------------------------------
/// Calendar Aggregator
/// ---------------------------------------------------------------------------

/// Live month view. Holds at most one store subscription; switching months
/// drops the old one before the new one opens, so a stale month can never
/// deliver again.
pub struct CalendarAggregator {
  store: RecordStore,
  current: Option<MonthSubscription>,
}

struct MonthSubscription {
  year: i32,
  month: u32,
  sub: Subscription,
}

impl CalendarAggregator {
  pub fn new(store: RecordStore) -> Self {
    Self { store, current: None }
  }

  /// Point the aggregator at a month, replacing any previous subscription.
  pub fn show_month(&mut self, year: i32, month: u32) -> Result<(), StoreError> {
    self.current = None;
    let sub = self.store.subscribe(RecordFilter::month(year, month)?)?;
    self.current = Some(MonthSubscription { year, month, sub });
    Ok(())
  }

  pub fn month(&self) -> Option<(i32, u32)> {
    self.current.as_ref().map(|c| (c.year, c.month))
  }

  /// Next bucketed snapshot of the current month. `None` when no month is
  /// selected or its feed has ended.
  pub async fn next(&mut self) -> Option<Result<MonthBuckets, StoreError>> {
    let current = self.current.as_mut()?;
    match current.sub.recv().await? {
      Ok(records) => Some(Ok(bucket_by_day(records))),
      Err(e) => Some(Err(e)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::record::{JournalEntry, LoggedWorkout, NewWorkoutRecord, RecordDetail};
  use crate::test_utils::*;

  #[test]
  fn test_month_range_boundaries() {
    assert_eq!(month_range(2024, 6), Some((date(2024, 6, 1), date(2024, 6, 30))));
    assert_eq!(month_range(2024, 12), Some((date(2024, 12, 1), date(2024, 12, 31))));
    assert_eq!(month_range(2024, 13), None);
  }

  #[test]
  fn test_days_in_month_handles_leap_years() {
    assert_eq!(days_in_month(2024, 2), Some(29));
    assert_eq!(days_in_month(2023, 2), Some(28));
    assert_eq!(days_in_month(2024, 4), Some(30));
  }

  #[test]
  fn test_first_weekday_counts_from_sunday() {
    // 2024-06-01 was a Saturday, 2024-09-01 a Sunday.
    assert_eq!(first_weekday_of_month(2024, 6), Some(6));
    assert_eq!(first_weekday_of_month(2024, 9), Some(0));
  }

  #[test]
  fn test_classification_of_logged_and_journal_days() {
    let run = test_record(
      1,
      date(2024, 6, 1),
      RecordDetail::Logged(LoggedWorkout {
        sport: "Running".to_string(),
        duration_minutes: 40,
        perceived_effort: 5,
        distance_or_load: None,
        notes: None,
      }),
    );
    let journal = test_record(
      2,
      date(2024, 6, 2),
      RecordDetail::Journal(JournalEntry {
        content: "rest day".to_string(),
      }),
    );

    let buckets = bucket_by_day(vec![run, journal]);

    let day1 = &buckets[&date(2024, 6, 1)].indicators;
    assert!(day1.primary_sport);
    assert!(!day1.strength);
    assert!(!day1.journal);

    let day2 = &buckets[&date(2024, 6, 2)].indicators;
    assert!(!day2.primary_sport);
    assert!(!day2.strength);
    assert!(day2.journal);
  }

  #[test]
  fn test_indicators_are_independent() {
    let lifting = test_record(
      1,
      date(2024, 6, 3),
      RecordDetail::Logged(LoggedWorkout {
        sport: "Lifting".to_string(),
        duration_minutes: 20,
        perceived_effort: 7,
        distance_or_load: Some("3x10".to_string()),
        notes: None,
      }),
    );
    let journal = test_record(
      2,
      date(2024, 6, 3),
      RecordDetail::Journal(JournalEntry {
        content: "strength block".to_string(),
      }),
    );
    let other = test_record(
      3,
      date(2024, 6, 3),
      RecordDetail::Logged(LoggedWorkout {
        sport: "Other".to_string(),
        duration_minutes: 15,
        perceived_effort: 3,
        distance_or_load: None,
        notes: None,
      }),
    );

    let buckets = bucket_by_day(vec![lifting, journal, other]);
    let day = &buckets[&date(2024, 6, 3)];
    assert_eq!(day.records.len(), 3);
    assert!(!day.indicators.primary_sport);
    assert!(day.indicators.strength);
    assert!(day.indicators.journal);
  }

  #[tokio::test]
  async fn test_aggregator_follows_month_changes() {
    let (store, pool, _session) = ready_store("user-1").await;

    let mut aggregator = CalendarAggregator::new(store.clone());
    aggregator.show_month(2024, 6).unwrap();
    assert_eq!(aggregator.month(), Some((2024, 6)));

    let initial = aggregator.next().await.unwrap().unwrap();
    assert!(initial.is_empty());

    store
      .create(NewWorkoutRecord::new(
        date(2024, 6, 15),
        RecordDetail::Logged(LoggedWorkout {
          sport: "Cycling".to_string(),
          duration_minutes: 60,
          perceived_effort: 6,
          distance_or_load: None,
          notes: None,
        }),
      ))
      .await
      .unwrap();

    let updated = aggregator.next().await.unwrap().unwrap();
    assert!(updated[&date(2024, 6, 15)].indicators.primary_sport);

    // Switching months re-subscribes; June's record is out of scope.
    aggregator.show_month(2024, 7).unwrap();
    let july = aggregator.next().await.unwrap().unwrap();
    assert!(july.is_empty());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_invalid_month_is_rejected() {
    assert!(RecordFilter::month(2024, 0).is_err());
  }
}
