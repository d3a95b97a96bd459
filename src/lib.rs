//! Personal workout designer: core data and generation pipeline
//!
//! The crate keeps a live, per-owner collection of workout records (generated
//! plans, manual logs, journal entries) with push updates to every open view,
//! assembles generation requests from the sport profile and the day's
//! physiological readings, and parses the service's markdown response back
//! into typed primary/strength plans.
//!
//! Typical wiring: initialize a pool with [`db::initialize_db`], feed identity
//! through an [`identity::AuthSession`], build a [`store::RecordStore`], then
//! hang views ([`calendar::CalendarAggregator`],
//! [`context::RecentContextTracker`]) and the
//! [`generation::GenerationOrchestrator`] off it. Rendering and input live
//! outside this crate.

pub mod calendar;
pub mod context;
pub mod db;
pub mod generation;
pub mod identity;
pub mod llm;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use calendar::{CalendarAggregator, DayIndicators, DaySummary, MonthBuckets};
pub use context::{RecentContext, RecentContextTracker};
pub use generation::{GenerationError, GenerationOrchestrator, GenerationPhase, SavedPlan};
pub use identity::{AuthSession, AuthState};
pub use llm::{GeminiClient, LlmError};
pub use models::{
  DailyStateSnapshot, EquipmentSet, NewWorkoutRecord, ProfileSnapshot, RecordDetail, RecordKind,
  WorkoutRecord,
};
pub use parser::{split_generated_plan, SplitPlan};
pub use prompt::build_workout_prompt;
pub use store::{RecordFilter, RecordStore, StoreError, Subscription};
