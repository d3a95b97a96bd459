use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Equipment
/// ---------------------------------------------------------------------------

/// Equipment the user owns, as named booleans. Field names serialize in
/// camelCase to match the stored snapshot documents; `enabled_keys` yields
/// those camelCase keys in declaration order so prompt rendering is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentSet {
  // Swim
  pub swim_goggles: bool,
  pub swim_cap: bool,
  pub kickboard: bool,
  pub short_fins: bool,
  pub long_fins: bool,
  pub paddle: bool,
  pub buoy: bool,
  pub snorkel: bool,
  pub parachutes: bool,
  // Run
  pub running_shoes: bool,
  pub gps_watch: bool,
  pub hydration_vest: bool,
  // Bike
  pub bike: bool,
  pub helmet: bool,
  pub cycling_shoes: bool,
  pub indoor_trainer: bool,
  // Strength / mobility
  pub resistance_bands: bool,
  pub dumbbells: bool,
  pub kettlebell: bool,
  pub yoga_mat: bool,
  pub foam_roller: bool,
  pub pull_up_bar: bool,
}

impl EquipmentSet {
  /// camelCase keys of the enabled items, in declaration order.
  pub fn enabled_keys(&self) -> Vec<&'static str> {
    let entries: [(&'static str, bool); 22] = [
      ("swimGoggles", self.swim_goggles),
      ("swimCap", self.swim_cap),
      ("kickboard", self.kickboard),
      ("shortFins", self.short_fins),
      ("longFins", self.long_fins),
      ("paddle", self.paddle),
      ("buoy", self.buoy),
      ("snorkel", self.snorkel),
      ("parachutes", self.parachutes),
      ("runningShoes", self.running_shoes),
      ("gpsWatch", self.gps_watch),
      ("hydrationVest", self.hydration_vest),
      ("bike", self.bike),
      ("helmet", self.helmet),
      ("cyclingShoes", self.cycling_shoes),
      ("indoorTrainer", self.indoor_trainer),
      ("resistanceBands", self.resistance_bands),
      ("dumbbells", self.dumbbells),
      ("kettlebell", self.kettlebell),
      ("yogaMat", self.yoga_mat),
      ("foamRoller", self.foam_roller),
      ("pullUpBar", self.pull_up_bar),
    ];

    entries
      .into_iter()
      .filter_map(|(key, enabled)| enabled.then_some(key))
      .collect()
  }
}

/// ---------------------------------------------------------------------------
/// Profile Snapshot
/// ---------------------------------------------------------------------------

/// The sport profile captured with every saved generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
  pub sport: String,
  pub sport_goal: String,
  pub sport_level: String,
  pub days_per_week: u8,
  pub session_duration_minutes: u32,
  /// Complementary strength goal; `"None"` means no strength section.
  pub lifting_goal: String,
  pub equipment: EquipmentSet,
  pub tracker_brand: String,
}

impl ProfileSnapshot {
  pub fn wants_lifting(&self) -> bool {
    self.lifting_goal != "None"
  }
}

impl Default for ProfileSnapshot {
  fn default() -> Self {
    Self {
      sport: "Swimming".to_string(),
      sport_goal: "Improve Endurance".to_string(),
      sport_level: "Intermediate".to_string(),
      days_per_week: 3,
      session_duration_minutes: 45,
      lifting_goal: "None".to_string(),
      equipment: EquipmentSet::default(),
      tracker_brand: "No Watch".to_string(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Daily State Snapshot
/// ---------------------------------------------------------------------------

/// Day-of inputs: what the user wants from this session plus the morning's
/// physiological readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStateSnapshot {
  /// Desired distance/volume band for this session.
  pub desired_distance: String,
  /// Primary focus for this session (e.g. "Endurance", "Speed").
  pub session_focus: String,
  /// Recent performance band for the primary sport.
  pub performance_band: String,
  pub resting_heart_rate: u32,
  pub sleep_hours: f64,
  pub sleep_score: u32,
  pub energy_score: u32,
}

impl Default for DailyStateSnapshot {
  fn default() -> Self {
    Self {
      desired_distance: String::new(),
      session_focus: String::new(),
      performance_band: String::new(),
      resting_heart_rate: 60,
      sleep_hours: 7.0,
      sleep_score: 70,
      energy_score: 80,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_enabled_keys_preserves_declaration_order() {
    let equipment = EquipmentSet {
      gps_watch: true,
      swim_goggles: true,
      dumbbells: true,
      ..EquipmentSet::default()
    };
    assert_eq!(equipment.enabled_keys(), vec!["swimGoggles", "gpsWatch", "dumbbells"]);
  }

  #[test]
  fn test_enabled_keys_empty_when_nothing_owned() {
    assert!(EquipmentSet::default().enabled_keys().is_empty());
  }

  #[test]
  fn test_snapshot_serializes_camel_case() {
    let json = serde_json::to_value(ProfileSnapshot::default()).unwrap();
    assert!(json.get("sportGoal").is_some());
    assert!(json.get("liftingGoal").is_some());
    assert!(json["equipment"].get("swimGoggles").is_some());

    let daily = serde_json::to_value(DailyStateSnapshot::default()).unwrap();
    assert!(daily.get("sessionFocus").is_some());
    assert!(daily.get("restingHeartRate").is_some());
  }

  #[test]
  fn test_wants_lifting_sentinel() {
    let mut profile = ProfileSnapshot::default();
    assert!(!profile.wants_lifting());
    profile.lifting_goal = "General Strength".to_string();
    assert!(profile.wants_lifting());
  }
}
