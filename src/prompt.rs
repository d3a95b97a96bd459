//! Generation request assembly
//!
//! Renders the sport profile, the day's physiological inputs, the previous
//! generated session, and optional user feedback into the single-turn prompt
//! sent to the generation service. Pure string assembly: identical inputs
//! produce byte-identical output. The heading tokens named in the template
//! are the contract the response parser matches on.

use crate::context::RecentContext;
use crate::models::snapshots::{DailyStateSnapshot, EquipmentSet, ProfileSnapshot};
use crate::parser::{COOLDOWN_HEADING, LIFTING_HEADING, WARMUP_HEADING};

/// Rendered when no equipment is enabled.
pub const NO_EQUIPMENT: &str = "no special equipment available";

/// Split a camelCase key into spaced lowercase words ("gpsWatch" -> "gps watch").
fn humanize_key(key: &str) -> String {
  let mut out = String::with_capacity(key.len() + 4);
  for ch in key.chars() {
    if ch.is_ascii_uppercase() {
      out.push(' ');
      out.push(ch.to_ascii_lowercase());
    } else {
      out.push(ch);
    }
  }
  out
}

/// Comma-joined humanized list of enabled equipment, or the no-equipment phrase.
pub fn describe_equipment(equipment: &EquipmentSet) -> String {
  let enabled = equipment.enabled_keys();
  if enabled.is_empty() {
    return NO_EQUIPMENT.to_string();
  }
  enabled
    .iter()
    .map(|key| humanize_key(key))
    .collect::<Vec<_>>()
    .join(", ")
}

fn previous_workout_block(recent: &RecentContext) -> String {
  format!(
    r#"Previous Workout Context:
- The last generated {sport} workout was on {date}.
- Its primary focus was "{focus}".
IMPORTANT: Design the current workout to be complementary and avoid giving a workout of the exact same primary focus or intensity as the previous one, unless specifically requested in additional feedback. For example, if the last was "Speed", consider "Endurance" or "Threshold" for today.

"#,
    sport = recent.sport,
    date = recent.date.format("%Y-%m-%d"),
    focus = recent.focus,
  )
}

fn feedback_block(feedback: &str) -> String {
  format!(
    r#"IMPORTANT: The user has provided additional feedback for this workout generation. Please incorporate the following:
Feedback: "{feedback}"

Please use this feedback to adjust, refine, or regenerate the workout plan accordingly. For example, if the feedback indicates low energy, suggest a lighter workout; if it asks for a specific drill, include it.

"#
  )
}

fn lifting_block(lifting_goal: &str) -> String {
  format!(
    r#"- The user also has a complimentary lifting goal: "{lifting_goal}". Please design a short (15-20 min) strength/mobility session relevant to this goal, as a distinct section clearly marked with the heading "{LIFTING_HEADING}".
"#
  )
}

/// Build the full generation request. `feedback` is the only difference
/// between a fresh generation and a feedback-driven regeneration.
pub fn build_workout_prompt(
  profile: &ProfileSnapshot,
  daily: &DailyStateSnapshot,
  recent: Option<&RecentContext>,
  feedback: Option<&str>,
) -> String {
  let sport = &profile.sport;
  let equipment = describe_equipment(&profile.equipment);

  let previous = recent.map(previous_workout_block).unwrap_or_default();
  let feedback = feedback
    .filter(|text| !text.trim().is_empty())
    .map(feedback_block)
    .unwrap_or_default();
  let lifting = if profile.wants_lifting() {
    lifting_block(&profile.lifting_goal)
  } else {
    String::new()
  };

  format!(
    r###"As an expert AI {sport} coach, design a personalized {sport} workout plan for one session based on the following user profile and recent daily data.
Consider the user's current fitness state, their overall goals, and the available equipment for this specific workout.

{previous}User Sport Profile (from Settings):
- Primary Sport Focus: {sport}
- Primary Sport Goal: {sport_goal}
- Sport Level: {sport_level}
- Desired Workout Days Per Week for Main Sport: {days_per_week}
- Desired Workout Duration per session: {duration} minutes
- Available Equipment: {equipment}

Recent Health and Performance Data (Day-to-Day Inputs):
- Desired Workout Distance/Volume for THIS session: {desired_distance}
- Primary Workout Focus for THIS session: {session_focus}
- Recent Performance Metric: {performance_band}
- Resting Heart Rate: {resting_heart_rate} bpm
- Sleep Hours (last night): {sleep_hours} hours
- Sleep Score (out of 100): {sleep_score}
- Energy Score (out of 100): {energy_score}

{feedback}Please provide a detailed {sport} workout plan. The plan should be challenging yet appropriate for the user's level and recent data.
The workout should typically include:
- A warm-up (5-10 minutes, e.g., dynamic stretches, light cardio specific to {sport})
- 3-5 main sets (e.g., technique drills, endurance sets, speed/power work, strength training, flexibility exercises).
  For each set, specify recommended duration/repetitions/distance, appropriate intervals (if applicable), and the primary focus (e.g., "focus on form", "build stamina", "increase power").
  Clearly specify the exercises, techniques, or movements where applicable, specific to {sport}.
- A cool-down (5-10 minutes, easy movements and stretching)
{lifting}
Structure the workout plan clearly using Markdown, with prominent headings for sections ("{WARMUP_HEADING}", "## Main Set", "{COOLDOWN_HEADING}", and "{LIFTING_HEADING}" when requested). Use standard {sport} terminology.
Ensure the total workout duration aligns closely with the user's desired workout duration, including the complimentary lifting if requested and included."###,
    sport_goal = profile.sport_goal,
    sport_level = profile.sport_level,
    days_per_week = profile.days_per_week,
    duration = profile.session_duration_minutes,
    desired_distance = daily.desired_distance,
    session_focus = daily.session_focus,
    performance_band = daily.performance_band,
    resting_heart_rate = daily.resting_heart_rate,
    sleep_hours = daily.sleep_hours,
    sleep_score = daily.sleep_score,
    energy_score = daily.energy_score,
  )
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
