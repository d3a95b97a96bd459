//! Continuity context for prompt building
//!
//! Tracks the single most recent generated primary-sport workout so the next
//! generation can steer away from repeating its focus. Strictly read-only:
//! this module never writes to the store.

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::record::{RecordDetail, WorkoutRecord};
use crate::store::{RecordFilter, RecordStore, StoreError};

/// Summary of the last generated primary workout, as the prompt needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentContext {
  pub date: NaiveDate,
  pub created_at: DateTime<Utc>,
  pub sport: String,
  pub focus: String,
}

impl RecentContext {
  fn from_record(record: &WorkoutRecord) -> Option<Self> {
    match &record.detail {
      RecordDetail::GeneratedPrimary(plan) => Some(Self {
        date: record.date,
        created_at: record.created_at,
        sport: plan.sport.clone(),
        focus: plan.daily_state.session_focus.clone(),
      }),
      _ => None,
    }
  }
}

/// Live view of the most recent generated primary workout. `None` until one
/// exists; updates as generations are saved or deleted.
pub struct RecentContextTracker {
  rx: watch::Receiver<Option<RecentContext>>,
  handle: JoinHandle<()>,
}

impl RecentContextTracker {
  pub fn spawn(store: &RecordStore) -> Result<Self, StoreError> {
    let mut sub = store.subscribe(RecordFilter::latest_generated_primary())?;
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
      while let Some(delivery) = sub.recv().await {
        match delivery {
          Ok(records) => {
            let latest = records.first().and_then(RecentContext::from_record);
            if tx.send(latest).is_err() {
              break;
            }
          }
          Err(e) => {
            tracing::warn!(error = %e, "recent context feed failed");
            break;
          }
        }
      }
    });

    Ok(Self { rx, handle })
  }

  /// The current most-recent context, if any generation has been saved.
  pub fn current(&self) -> Option<RecentContext> {
    self.rx.borrow().clone()
  }

  /// Wait until the tracked value changes.
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }
}

impl Drop for RecentContextTracker {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
