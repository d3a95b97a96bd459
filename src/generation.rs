//! Generation pipeline
//!
//! Sequences prompt building, the generation call, and (as a separate,
//! explicit action) splitting and persisting the result. Each attempt walks
//! `Idle -> Validating -> Requesting -> Succeeded | Failed`; validation
//! failures never reach the generation service, and service failures are
//! surfaced once without retrying.

use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;

use crate::context::RecentContext;
use crate::llm::{GeminiClient, LlmError};
use crate::models::record::{GeneratedPlan, NewWorkoutRecord, RecordDetail, LIFTING_SPORT};
use crate::models::snapshots::{DailyStateSnapshot, ProfileSnapshot};
use crate::parser::split_generated_plan;
use crate::prompt::build_workout_prompt;
use crate::store::{RecordStore, StoreError};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
  /// A required daily-state selection is missing; nothing was sent anywhere.
  #[error("{0}")]
  Validation(String),

  #[error(transparent)]
  Request(#[from] LlmError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// ---------------------------------------------------------------------------
/// Generator Seam
/// ---------------------------------------------------------------------------

/// The single call the orchestrator needs from the generation service.
pub trait WorkoutGenerator {
  fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

impl WorkoutGenerator for GeminiClient {
  async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
    let (text, _usage) = self.generate_content(prompt).await?;
    Ok(text)
  }
}

/// ---------------------------------------------------------------------------
/// Orchestrator
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPhase {
  #[default]
  Idle,
  Validating,
  Requesting,
  Succeeded,
  Failed,
}

/// Drives one generation attempt at a time and holds the currently displayed
/// plan. Guarding against overlapping attempts is the caller's job (the
/// triggering action is disabled while a request is in flight).
pub struct GenerationOrchestrator<G> {
  generator: G,
  phase: GenerationPhase,
  current_plan: Option<String>,
  last_error: Option<String>,
}

impl<G: WorkoutGenerator> GenerationOrchestrator<G> {
  pub fn new(generator: G) -> Self {
    Self {
      generator,
      phase: GenerationPhase::Idle,
      current_plan: None,
      last_error: None,
    }
  }

  pub fn phase(&self) -> GenerationPhase {
    self.phase
  }

  /// The plan currently shown to the user. Not yet persisted.
  pub fn current_plan(&self) -> Option<&str> {
    self.current_plan.as_deref()
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Fresh generation from the profile, today's state, and the previous
  /// session context.
  pub async fn generate(
    &mut self,
    profile: &ProfileSnapshot,
    daily: &DailyStateSnapshot,
    recent: Option<&RecentContext>,
  ) -> Result<(), GenerationError> {
    self.run(profile, daily, recent, None).await
  }

  /// Regeneration with user feedback; on success the displayed plan is
  /// replaced. Identical to `generate` apart from the feedback block.
  pub async fn regenerate(
    &mut self,
    profile: &ProfileSnapshot,
    daily: &DailyStateSnapshot,
    recent: Option<&RecentContext>,
    feedback: &str,
  ) -> Result<(), GenerationError> {
    if feedback.trim().is_empty() {
      return self.fail_validation("Please type your feedback or request for modification.");
    }
    self.run(profile, daily, recent, Some(feedback)).await
  }

  async fn run(
    &mut self,
    profile: &ProfileSnapshot,
    daily: &DailyStateSnapshot,
    recent: Option<&RecentContext>,
    feedback: Option<&str>,
  ) -> Result<(), GenerationError> {
    self.phase = GenerationPhase::Validating;
    self.last_error = None;

    if daily.performance_band.trim().is_empty() {
      return self.fail_validation(&format!(
        "Please select your recent performance metric for {}.",
        profile.sport
      ));
    }
    if daily.session_focus.trim().is_empty() {
      return self.fail_validation("Please select a primary workout focus.");
    }

    self.phase = GenerationPhase::Requesting;
    let prompt = build_workout_prompt(profile, daily, recent, feedback);

    match self.generator.generate(&prompt).await {
      Ok(text) => {
        self.phase = GenerationPhase::Succeeded;
        self.current_plan = Some(text);
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "generation request failed");
        self.phase = GenerationPhase::Failed;
        self.last_error = Some(e.to_string());
        Err(GenerationError::Request(e))
      }
    }
  }

  fn fail_validation(&mut self, message: &str) -> Result<(), GenerationError> {
    self.phase = GenerationPhase::Failed;
    self.last_error = Some(message.to_string());
    Err(GenerationError::Validation(message.to_string()))
  }

  /// Persist the currently displayed plan. Saving is always an explicit user
  /// action; generation itself never writes to the store.
  pub async fn save_current_plan(
    &self,
    store: &RecordStore,
    profile: &ProfileSnapshot,
    daily: &DailyStateSnapshot,
  ) -> Result<SavedPlan, GenerationError> {
    let plan = self
      .current_plan
      .as_deref()
      .ok_or_else(|| GenerationError::Validation("No generated workout to save.".to_string()))?;

    let now = Utc::now();
    Ok(persist_plan(store, plan, profile, daily, now.date_naive(), now).await?)
  }
}

/// ---------------------------------------------------------------------------
/// Plan Persistence
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedPlan {
  pub primary_id: i64,
  pub strength_id: Option<i64>,
}

/// Split a raw generated response and persist it as one or two records. Both
/// halves share the timestamp, the date, and the profile/daily snapshots;
/// the strength half exists only when the response contained one.
pub async fn persist_plan(
  store: &RecordStore,
  plan_text: &str,
  profile: &ProfileSnapshot,
  daily: &DailyStateSnapshot,
  date: NaiveDate,
  created_at: DateTime<Utc>,
) -> Result<SavedPlan, StoreError> {
  let split = split_generated_plan(plan_text);

  let primary_id = store
    .create(
      NewWorkoutRecord::new(
        date,
        RecordDetail::GeneratedPrimary(GeneratedPlan {
          sport: profile.sport.clone(),
          plan_text: split.primary,
          profile: profile.clone(),
          daily_state: daily.clone(),
        }),
      )
      .created_at(created_at),
    )
    .await?;

  let strength_id = match split.strength {
    Some(strength_text) => Some(
      store
        .create(
          NewWorkoutRecord::new(
            date,
            RecordDetail::GeneratedStrength(GeneratedPlan {
              sport: LIFTING_SPORT.to_string(),
              plan_text: strength_text,
              profile: profile.clone(),
              daily_state: daily.clone(),
            }),
          )
          .created_at(created_at),
        )
        .await?,
    ),
    None => None,
  };

  Ok(SavedPlan {
    primary_id,
    strength_id,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
