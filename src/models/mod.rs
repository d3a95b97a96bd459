pub mod record;
pub mod snapshots;

pub use record::{
  GeneratedPlan, JournalEntry, LoggedWorkout, NewWorkoutRecord, RecordDetail, RecordKind,
  WorkoutRecord, ENDURANCE_SPORTS, LIFTING_SPORT,
};
pub use snapshots::{DailyStateSnapshot, EquipmentSet, ProfileSnapshot};
