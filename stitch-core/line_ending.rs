//! Line delimiter detection.

use crate::search::first_match;

/// Canonical line delimiters.
///
/// Ordering is irrelevant for detection: `first_match` picks the earliest
/// occurrence and breaks position ties by length, so `"\r\n"` always wins
/// over a lone `"\r"` at the same boundary.
pub const DELIMITERS: [&str; 3] = ["\n", "\r", "\r\n"];

/// Returns the delimiter used at the first line boundary of `text`, or
/// `hint` if `text` contains no line boundary.
pub fn determine_line_delimiter<'a>(text: &str, hint: &'a str) -> &'a str {
  match first_match(&DELIMITERS, text, 0) {
    Some((_, index)) => DELIMITERS[index],
    None => hint,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_first_delimiter() {
    assert_eq!(determine_line_delimiter("a\nb\r\nc", "?"), "\n");
    assert_eq!(determine_line_delimiter("a\r\nb\nc", "?"), "\r\n");
    assert_eq!(determine_line_delimiter("a\rb", "?"), "\r");
  }

  #[test]
  fn crlf_wins_over_cr_at_same_boundary() {
    assert_eq!(determine_line_delimiter("\r\n", "?"), "\r\n");
  }

  #[test]
  fn falls_back_to_hint() {
    assert_eq!(determine_line_delimiter("no boundary here", "\n"), "\n");
    assert_eq!(determine_line_delimiter("", "\r\n"), "\r\n");
  }
}
