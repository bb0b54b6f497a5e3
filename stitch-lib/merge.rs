//! Collapsing an ordered stream of edit events into one equivalent edit.
//!
//! Editing a document produces a stream of atomic [`TextEdit`] events, each
//! expressed in the coordinate system of the document as it stood right
//! before that event was applied. Consumers that react to a whole batch
//! (partition re-scanners, position updaters) want a single edit that has the
//! same net effect, without ever observing the intermediate states.
//!
//! Two merge functions cover the two situations a caller can be in:
//!
//! - [`merge_unprocessed`]: none of the events have been applied yet and the
//!   *original* document is available. The events are walked forward and the
//!   replacement text is assembled incrementally, pulling the untouched gaps
//!   between events out of the original document.
//! - [`merge_processed`]: all events have already been applied and only the
//!   *final* document is available. The events are walked in reverse and only
//!   offsets and lengths are tracked; the replacement text is materialized at
//!   the end with a single fetch, because the final document already contains
//!   it contiguously. No intermediate strings are ever built.
//!
//! Both sweeps track the merge window as `(offset, length)` over the
//! reference document plus a signed delta for the net size change
//! accumulated so far; intermediate document states are never materialized.
//!
//! # Coordinates
//!
//! All offsets and lengths are char indices. The merged edit is expressed in
//! *original*-document coordinates in both modes.
//!
//! # Errors
//!
//! A merge fails only when a fetch against the supplied [`TextSource`] falls
//! out of bounds, meaning the edit stream and the snapshot disagree. That is
//! an internal-consistency fault of the caller and is propagated, never
//! swallowed. An empty event list is not an error: it merges to `None`.

use ropey::Rope;
use stitch_core::region::Region;

use crate::{
  Tendril,
  source::{
    InvalidRange,
    Result,
    TextSource,
    char_to_byte,
  },
};

/// A single range replacement: the chars in `offset..offset + length` of
/// some reference document state are replaced by `replacement`.
///
/// Which document state the coordinates refer to is implicit from context
/// and must not be confused: events handed to [`merge_unprocessed`] or
/// [`merge_processed`] are each relative to the state right before they were
/// applied, while a merged edit is relative to the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
  pub offset:      usize,
  pub length:      usize,
  pub replacement: Tendril,
}

impl TextEdit {
  pub fn new(offset: usize, length: usize, replacement: impl Into<Tendril>) -> Self {
    Self {
      offset,
      length,
      replacement: replacement.into(),
    }
  }

  /// An insertion at `offset`.
  pub fn insert(offset: usize, text: impl Into<Tendril>) -> Self {
    Self::new(offset, 0, text)
  }

  /// A deletion of `offset..offset + length`.
  pub fn delete(offset: usize, length: usize) -> Self {
    Self::new(offset, length, "")
  }

  /// End of the replaced range, exclusive.
  pub fn end(&self) -> usize {
    self.offset + self.length
  }

  /// The replaced range as a [`Region`], for checking the edit against
  /// content regions with [`Region::overlaps`].
  pub fn region(&self) -> Region {
    Region::new(self.offset, self.length)
  }

  /// Length of the replacement text in chars.
  pub fn replacement_len(&self) -> usize {
    self.replacement.chars().count()
  }

  /// Splices this edit into `text`.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    if self.end() > text.len_chars() {
      return Err(InvalidRange {
        from: self.offset as isize,
        to:   self.end() as isize,
        len:  text.len_chars(),
      });
    }

    text.remove(self.offset..self.end());
    text.insert(self.offset, &self.replacement);
    Ok(())
  }
}

/// Where an incoming event sits relative to the merge window, in the
/// coordinate space the event was expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
  /// Strictly after the window, untouched text in between.
  After,
  /// Strictly before the window, untouched text in between.
  Before,
  /// Touching or intersecting the window.
  Overlap,
}

fn classify(
  event_start: isize,
  event_end: isize,
  window_start: isize,
  window_end: isize,
) -> Placement {
  if event_start > window_end {
    Placement::After
  } else if event_end < window_start {
    Placement::Before
  } else {
    Placement::Overlap
  }
}

/// Fetch with signed coordinates; negative drift turns into [`InvalidRange`]
/// here rather than a wrapped index.
fn fetch<S>(source: &S, offset: isize, length: isize) -> Result<Tendril>
where
  S: TextSource + ?Sized,
{
  let (Ok(offset), Ok(length)) = (usize::try_from(offset), usize::try_from(length)) else {
    return Err(InvalidRange {
      from: offset,
      to:   offset + length,
      len:  source.len(),
    });
  };
  source.get(offset, length)
}

/// Merges `events` into one equivalent edit against `source`, the document
/// state *before any* of the events were applied.
///
/// Each event's coordinates are relative to the document as it stood right
/// before that event; the result is in original-document coordinates.
/// Returns `Ok(None)` for an empty stream. Fails with [`InvalidRange`] when
/// the stream is inconsistent with `source`.
pub fn merge_unprocessed<S>(source: &S, events: &[TextEdit]) -> Result<Option<TextEdit>>
where
  S: TextSource + ?Sized,
{
  let Some((first, rest)) = events.split_first() else {
    return Ok(None);
  };

  let mut offset = first.offset as isize;
  let mut length = first.length as isize;
  let mut text = first.replacement.clone();
  let mut text_len = first.replacement_len() as isize;

  for event in rest {
    // Net growth of the window's replacement over the original span it
    // replaces. Remaps the event's coordinates back to original space.
    let delta = text_len - length;

    let event_offset = event.offset as isize;
    let event_length = event.length as isize;
    let event_text_len = event.replacement_len() as isize;

    match classify(
      event_offset,
      event_offset + event_length,
      offset,
      offset + length + delta,
    ) {
      Placement::After => {
        // Untouched original text between the window's end and the event.
        let gap = fetch(
          source,
          offset + length,
          (event_offset - delta) - (offset + length),
        )?;
        text_len += gap.chars().count() as isize + event_text_len;
        text.push_str(&gap);
        text.push_str(&event.replacement);

        length = (event_offset - delta) + event_length - offset;
      },
      Placement::Before => {
        let gap = fetch(
          source,
          event_offset + event_length,
          offset - (event_offset + event_length),
        )?;
        text_len += gap.chars().count() as isize + event_text_len;

        // The gap sits between the event and the old window, so the event
        // text goes first.
        let mut grown = event.replacement.clone();
        grown.push_str(&gap);
        grown.push_str(&text);
        text = grown;

        length = offset + length - event_offset;
        offset = event_offset;
      },
      Placement::Overlap => {
        let start = (event_offset - offset).max(0);
        let end = (event_length + event_offset - offset).min(text_len);

        // 0 <= start <= end <= text_len holds for any overlap, so the char
        // positions always resolve.
        let byte_start = char_to_byte(&text, start as usize).unwrap();
        let byte_end = char_to_byte(&text, end as usize).unwrap();
        let mut spliced = Tendril::from(&text[..byte_start]);
        spliced.push_str(&event.replacement);
        spliced.push_str(&text[byte_end..]);
        text = spliced;
        text_len += event_text_len - (end - start);

        offset = offset.min(event_offset);
        let total_delta = delta + event_text_len - event_length;
        length = text_len - total_delta;
      },
    }
  }

  tracing::trace!(
    offset,
    length,
    replacement_len = text_len,
    "merged {} unprocessed events",
    events.len()
  );

  // offset and length cannot drift below zero: offset only ever moves down
  // to an event's (unsigned) offset, and every branch grows length by a
  // non-negative amount.
  Ok(Some(TextEdit {
    offset: offset as usize,
    length: length as usize,
    replacement: text,
  }))
}

/// Merges `events` into one equivalent edit against `source`, the document
/// state *after all* of the events were applied.
///
/// The events are walked in reverse, tracking offsets and lengths only; the
/// replacement text is fetched from `source` in one piece at the end, since
/// the final document contains, contiguously, exactly the text that replaced
/// the merged span. Returns `Ok(None)` for an empty stream. Fails with
/// [`InvalidRange`] when the stream is inconsistent with `source`.
pub fn merge_processed<S>(events: &[TextEdit], source: &S) -> Result<Option<TextEdit>>
where
  S: TextSource + ?Sized,
{
  let Some((last, rest)) = events.split_last() else {
    return Ok(None);
  };

  let mut offset = last.offset as isize;
  let mut length = last.length as isize;
  let mut text_len = last.replacement_len() as isize;

  for event in rest.iter().rev() {
    // Walking backward, the roles of consumed length and replacement length
    // swap relative to the forward sweep.
    let delta = length - text_len;

    let event_offset = event.offset as isize;
    let event_length = event.length as isize;
    let event_text_len = event.replacement_len() as isize;

    match classify(
      event_offset,
      event_offset + event_text_len,
      offset,
      offset + text_len + delta,
    ) {
      Placement::After => {
        length = (event_offset - delta) - (offset + text_len) + length + event_length;
        text_len = (event_offset - delta) + event_text_len - offset;
      },
      Placement::Before => {
        length = offset - (event_offset + event_text_len) + length + event_length;
        text_len = offset + text_len - event_offset;
        offset = event_offset;
      },
      Placement::Overlap => {
        let start = (event_offset - offset).max(0);
        let end = (event_text_len + event_offset - offset).min(length);
        length += event_length - (end - start);

        offset = offset.min(event_offset);
        let total_delta = delta + event_length - event_text_len;
        text_len = length - total_delta;
      },
    }
  }

  let replacement = fetch(source, offset, text_len)?;
  let length = usize::try_from(length).map_err(|_| InvalidRange {
    from: offset,
    to:   offset + length,
    len:  source.len(),
  })?;

  tracing::trace!(
    offset,
    length,
    replacement_len = text_len,
    "merged {} processed events",
    events.len()
  );

  Ok(Some(TextEdit {
    offset: offset as usize,
    length,
    replacement,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn edit(offset: usize, length: usize, replacement: &str) -> TextEdit {
    TextEdit::new(offset, length, replacement)
  }

  /// Applies the events one at a time, each in the coordinates of the
  /// document state it was recorded against.
  fn apply_all(original: &str, events: &[TextEdit]) -> String {
    let mut doc = Rope::from(original);
    for event in events {
      event.apply(&mut doc).unwrap();
    }
    doc.to_string()
  }

  fn apply_one(original: &str, event: &TextEdit) -> String {
    let mut doc = Rope::from(original);
    event.apply(&mut doc).unwrap();
    doc.to_string()
  }

  /// Clamps arbitrary quickcheck triples into a valid in-order event stream
  /// and returns the events together with the final document they produce.
  fn build_stream(original: &str, raw: &[(usize, usize, String)]) -> (Vec<TextEdit>, String) {
    let mut doc = Rope::from(original);
    let mut events = Vec::with_capacity(raw.len());

    for (offset, length, replacement) in raw {
      let len = doc.len_chars();
      let offset = offset % (len + 1);
      let length = if offset == len {
        0
      } else {
        length % (len - offset + 1)
      };

      let event = TextEdit::new(offset, length, replacement.as_str());
      event.apply(&mut doc).unwrap();
      events.push(event);
    }

    (events, doc.to_string())
  }

  #[test]
  fn empty_stream_merges_to_none() {
    assert_eq!(merge_unprocessed("abc", &[]), Ok(None));
    assert_eq!(merge_processed(&[], "abc"), Ok(None));
  }

  #[test]
  fn single_event_is_returned_unchanged() {
    let event = edit(6, 5, "rust");
    let original = "hello world";
    let final_doc = apply_one(original, &event);
    assert_eq!(final_doc, "hello rust");

    assert_eq!(
      merge_unprocessed(original, std::slice::from_ref(&event)).unwrap(),
      Some(event.clone())
    );
    assert_eq!(
      merge_processed(std::slice::from_ref(&event), final_doc.as_str()).unwrap(),
      Some(event)
    );
  }

  #[test]
  fn disjoint_ascending() {
    let original = "0123456789";
    let events = [edit(0, 1, "A"), edit(5, 1, "B")];

    let merged = merge_unprocessed(original, &events).unwrap().unwrap();
    assert_eq!(merged, edit(0, 6, "A1234B"));
    assert_eq!(apply_one(original, &merged), apply_all(original, &events));
  }

  #[test]
  fn disjoint_descending() {
    let original = "0123456789";
    let events = [edit(5, 1, "B"), edit(0, 1, "A")];

    let merged = merge_unprocessed(original, &events).unwrap().unwrap();
    assert_eq!(merged, edit(0, 6, "A1234B"));
    assert_eq!(apply_one(original, &merged), apply_all(original, &events));
  }

  #[test]
  fn overlap_collapse() {
    let original = "0123456789";
    // The second event's offset is relative to the state after the first.
    let events = [edit(2, 3, "X"), edit(3, 1, "YZ")];
    assert_eq!(apply_all(original, &events), "01XYZ6789");

    let merged = merge_unprocessed(original, &events).unwrap().unwrap();
    assert_eq!(merged, edit(2, 4, "XYZ"));
    assert_eq!(apply_one(original, &merged), "01XYZ6789");
  }

  #[test]
  fn adjacent_inserts_coalesce() {
    let original = "abc";
    let events = [edit(1, 0, "x"), edit(2, 0, "y")];
    let final_doc = apply_all(original, &events);
    assert_eq!(final_doc, "axybc");

    let merged = merge_unprocessed(original, &events).unwrap().unwrap();
    assert_eq!(apply_one(original, &merged), final_doc);
    assert_eq!(
      merge_processed(&events, final_doc.as_str()).unwrap().unwrap(),
      merged
    );
  }

  #[test]
  fn processed_mode_matches_unprocessed_mode() {
    let original = "0123456789";
    let streams: &[&[TextEdit]] = &[
      &[edit(0, 1, "A"), edit(5, 1, "B")],
      &[edit(5, 1, "B"), edit(0, 1, "A")],
      &[edit(2, 3, "X"), edit(3, 1, "YZ")],
      &[edit(4, 0, "long insertion"), edit(0, 2, ""), edit(3, 4, "z")],
    ];

    for events in streams {
      let final_doc = apply_all(original, events);
      let forward = merge_unprocessed(original, events).unwrap();
      let reverse = merge_processed(events, final_doc.as_str()).unwrap();
      assert_eq!(forward, reverse, "streams disagree for {events:?}");
    }
  }

  #[test]
  fn deletions_and_insertions_merge() {
    let original = "hello world";
    let events = [TextEdit::delete(0, 6), TextEdit::insert(5, "!")];
    let final_doc = apply_all(original, &events);
    assert_eq!(final_doc, "world!");

    let merged = merge_unprocessed(original, &events).unwrap().unwrap();
    assert_eq!(apply_one(original, &merged), final_doc);
  }

  #[test]
  fn merged_region_locates_the_edit() {
    let original = "0123456789";
    let events = [edit(2, 3, "X"), edit(3, 1, "YZ")];
    let merged = merge_unprocessed(original, &events).unwrap().unwrap();

    assert!(merged.region().overlaps(Region::new(0, 4)));
    assert!(!merged.region().overlaps(Region::new(6, 4)));
    assert!(Region::point(2).overlaps(merged.region()));
  }

  #[test]
  fn out_of_range_gap_fetch_fails() {
    // The second event claims text far past the end of the source.
    let events = [edit(0, 1, "A"), edit(10, 1, "B")];
    let err = merge_unprocessed("abc", &events).unwrap_err();
    assert_eq!(err, InvalidRange {
      from: 1,
      to:   10,
      len:  3,
    });
  }

  #[test]
  fn processed_fetch_past_final_document_fails() {
    let events = [edit(0, 0, "way too long")];
    assert!(merge_processed(&events, "short").is_err());
  }

  #[test]
  fn multibyte_replacements_merge_by_chars() {
    let original = "日本語テキスト";
    let events = [edit(1, 2, "ö"), edit(0, 3, "ab")];
    let final_doc = apply_all(original, &events);

    let merged = merge_unprocessed(original, &events).unwrap().unwrap();
    assert_eq!(apply_one(original, &merged), final_doc);
    assert_eq!(
      merge_processed(&events, final_doc.as_str()).unwrap().unwrap(),
      merged
    );
  }

  quickcheck::quickcheck! {
    fn merged_edit_matches_sequential_application(
      original: String,
      raw: Vec<(usize, usize, String)>
    ) -> bool {
      let (events, final_doc) = build_stream(&original, &raw);
      match merge_unprocessed(original.as_str(), &events).unwrap() {
        Some(merged) => apply_one(&original, &merged) == final_doc,
        None => original == final_doc,
      }
    }

    fn forward_and_reverse_sweeps_agree(
      original: String,
      raw: Vec<(usize, usize, String)>
    ) -> bool {
      let (events, final_doc) = build_stream(&original, &raw);
      let forward = merge_unprocessed(original.as_str(), &events).unwrap();
      let reverse = merge_processed(&events, final_doc.as_str()).unwrap();
      forward == reverse
    }
  }
}
