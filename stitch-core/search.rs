//! Multi-needle matching over a small fixed set of candidate strings.
//!
//! These functions back line-delimiter detection and other places where a
//! handful of known strings must be located in or compared against a text.
//! Positions and offsets are byte offsets into the haystack.

/// Returns the starting position and needle index of the first needle found
/// at or after `offset`, or `None` if nothing matches.
///
/// When several needles match at the same starting position the longest one
/// wins. A zero-length needle is a last resort: it is only reported, at
/// position 0, if no non-empty needle matched anywhere.
pub fn first_match(needles: &[&str], haystack: &str, offset: usize) -> Option<(usize, usize)> {
  let mut best: Option<(usize, usize)> = None;
  let mut zero_index = None;

  for (i, needle) in needles.iter().enumerate() {
    if needle.is_empty() {
      zero_index = Some(i);
      continue;
    }

    let Some(pos) = haystack.get(offset..).and_then(|tail| tail.find(needle)) else {
      continue;
    };
    let pos = offset + pos;

    match best {
      Some((best_pos, best_index)) => {
        if pos < best_pos || (pos == best_pos && needle.len() > needles[best_index].len()) {
          best = Some((pos, i));
        }
      },
      None => best = Some((pos, i)),
    }
  }

  best.or_else(|| zero_index.map(|i| (0, i)))
}

/// Returns the index of the longest needle that is a suffix of `text`.
///
/// Only a strictly longer needle replaces the current best, so among
/// equal-length matches the first declared wins.
pub fn longest_suffix_match(needles: &[&str], text: &str) -> Option<usize> {
  let mut best: Option<usize> = None;

  for (i, needle) in needles.iter().enumerate() {
    if text.ends_with(needle) && best.is_none_or(|b| needle.len() > needles[b].len()) {
      best = Some(i);
    }
  }

  best
}

/// Returns the index of the longest needle that is a prefix of `text`.
pub fn longest_prefix_match(needles: &[&str], text: &str) -> Option<usize> {
  let mut best: Option<usize> = None;

  for (i, needle) in needles.iter().enumerate() {
    if text.starts_with(needle) && best.is_none_or(|b| needle.len() > needles[b].len()) {
      best = Some(i);
    }
  }

  best
}

/// Returns the index of the first candidate equal to `text`.
pub fn first_exact_match(candidates: &[&str], text: &str) -> Option<usize> {
  candidates.iter().position(|candidate| *candidate == text)
}
