//! Response parsing: split one generated plan into its two halves
//!
//! The generation service returns a single markdown blob. The prompt asks it
//! to mark sections with fixed headings; this module finds those headings
//! (case-insensitively, at line starts) and cuts the text into the primary
//! sport session and the optional complementary strength session. Content is
//! never dropped: an unrecognized layout degrades to "everything is primary".

/// Heading that opens the primary block.
pub const WARMUP_HEADING: &str = "## Warm-up";

/// Heading that closes the primary block.
pub const COOLDOWN_HEADING: &str = "## Cool-down";

/// Heading that opens the optional strength block; everything from here to
/// the end of the response belongs to it.
pub const LIFTING_HEADING: &str = "## Complimentary Lifting";

/// A response split into its two persistable halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
  pub primary: String,
  /// `Some` exactly when the response contained a strength heading.
  pub strength: Option<String>,
}

/// Case-insensitive search for `needle` at the start of a line.
fn find_heading(text: &str, needle: &str) -> Option<usize> {
  let haystack = text.as_bytes();
  let needle = needle.as_bytes();
  if needle.len() > haystack.len() {
    return None;
  }
  for start in 0..=(haystack.len() - needle.len()) {
    let at_line_start = start == 0 || haystack[start - 1] == b'\n';
    if at_line_start && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle) {
      return Some(start);
    }
  }
  None
}

/// Split a generated response into primary and strength sections.
///
/// The strength section runs from its heading to the end of the text. The
/// primary section starts at the warm-up heading and keeps everything after
/// it, cool-down included; when no warm-up heading exists the whole remaining
/// text is the primary section. Idempotent on text without a strength
/// heading (modulo trimming).
pub fn split_generated_plan(text: &str) -> SplitPlan {
  let (working, strength) = match find_heading(text, LIFTING_HEADING) {
    Some(start) => (&text[..start], Some(text[start..].trim().to_string())),
    None => (text, None),
  };

  let primary = match find_heading(working, WARMUP_HEADING) {
    Some(start) => working[start..].trim().to_string(),
    None => working.trim().to_string(),
  };

  SplitPlan { primary, strength }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_splits_primary_and_strength() {
    let response = "## Warm-up\nA\n## Cool-down\nB\n## Complimentary Lifting\nC";
    let split = split_generated_plan(response);

    assert!(split.primary.contains("## Warm-up"));
    assert!(split.primary.contains("A"));
    assert!(split.primary.contains("## Cool-down"));
    assert!(split.primary.contains("B"));
    assert!(!split.primary.contains("C"));

    assert_eq!(split.strength.as_deref(), Some("## Complimentary Lifting\nC"));
  }

  #[test]
  fn test_no_strength_heading_keeps_everything_primary() {
    let response = "## Warm-up\nA\n## Cool-down\nB";
    let split = split_generated_plan(response);

    assert_eq!(split.primary, response);
    assert_eq!(split.strength, None);
  }

  #[test]
  fn test_split_is_idempotent_on_primary() {
    let response = "Intro chatter.\n## Warm-up\nA\n## Main Set\nB\n## Cool-down\nC\n";
    let once = split_generated_plan(response);
    let twice = split_generated_plan(&once.primary);

    assert_eq!(once, twice);
  }

  #[test]
  fn test_missing_warmup_falls_back_to_whole_text() {
    let response = "Main set only:\n- 4x100 free\n\n## Complimentary Lifting\nGoblet squats";
    let split = split_generated_plan(response);

    assert_eq!(split.primary, "Main set only:\n- 4x100 free");
    assert_eq!(split.strength.as_deref(), Some("## Complimentary Lifting\nGoblet squats"));
  }

  #[test]
  fn test_headings_match_case_insensitively() {
    let response = "## WARM-UP\nA\n## complimentary lifting\nC";
    let split = split_generated_plan(response);

    assert!(split.primary.starts_with("## WARM-UP"));
    assert_eq!(split.strength.as_deref(), Some("## complimentary lifting\nC"));
  }

  #[test]
  fn test_heading_must_start_a_line() {
    let response = "Talking about ## Complimentary Lifting inline.\n## Warm-up\nA";
    let split = split_generated_plan(response);

    assert_eq!(split.strength, None);
    assert_eq!(split.primary, "## Warm-up\nA");
  }

  #[test]
  fn test_primary_never_empty_for_nonempty_input() {
    for input in ["just text", "## Warm-up\nA", "  \n## Warm-up\nA\n  "] {
      let split = split_generated_plan(input);
      assert!(!split.primary.is_empty(), "empty primary for {:?}", input);
    }
  }

  #[test]
  fn test_empty_input_yields_empty_primary_and_no_strength() {
    let split = split_generated_plan("");
    assert_eq!(split.primary, "");
    assert_eq!(split.strength, None);
  }
}
