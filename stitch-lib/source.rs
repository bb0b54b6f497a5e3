//! Read-only snapshot access to document text.
//!
//! [`TextSource`] is the narrow contract the merge algorithms consume: fetch
//! a substring by char offset and length, and report the total length. It
//! stands in for whatever the surrounding document model stores its text in;
//! implementations are provided for [`Rope`], [`RopeSlice`] and `str`.
//!
//! A source is a snapshot of one document state and must not change while a
//! merge over it runs. The provided implementations are borrows of immutable
//! data, so the borrow rules enforce that for them.

use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::Tendril;

pub type Result<T> = std::result::Result<T, InvalidRange>;

/// A fetch against a [`TextSource`] fell outside the source's bounds.
///
/// The fields are signed: coordinate drift over an inconsistent edit stream
/// can steer an intermediate fetch below zero, and the range is reported as
/// computed. This always signals that the caller's edit stream disagrees
/// with the supplied snapshot; it must not be swallowed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("range {from}..{to} is out of bounds for source length {len}")]
pub struct InvalidRange {
  pub from: isize,
  pub to:   isize,
  pub len:  usize,
}

/// Read-only snapshot of one document state, indexed in chars.
pub trait TextSource {
  /// Total length of the snapshot in chars.
  fn len(&self) -> usize;

  /// Fetches the `length` chars starting at `offset`.
  fn get(&self, offset: usize, length: usize) -> Result<Tendril>;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn out_of_bounds(offset: usize, length: usize, len: usize) -> InvalidRange {
  InvalidRange {
    from: offset as isize,
    to:   (offset + length) as isize,
    len,
  }
}

/// Byte index of the char with index `char_idx`, or the text's byte length
/// when `char_idx` equals the char count. `None` past the end.
pub(crate) fn char_to_byte(text: &str, char_idx: usize) -> Option<usize> {
  text
    .char_indices()
    .map(|(byte, _)| byte)
    .chain(std::iter::once(text.len()))
    .nth(char_idx)
}

impl TextSource for RopeSlice<'_> {
  fn len(&self) -> usize {
    self.len_chars()
  }

  fn get(&self, offset: usize, length: usize) -> Result<Tendril> {
    let slice = self
      .get_slice(offset..offset + length)
      .ok_or_else(|| out_of_bounds(offset, length, self.len_chars()))?;

    let mut text = Tendril::new();
    for chunk in slice.chunks() {
      text.push_str(chunk);
    }
    Ok(text)
  }
}

impl TextSource for Rope {
  fn len(&self) -> usize {
    self.len_chars()
  }

  fn get(&self, offset: usize, length: usize) -> Result<Tendril> {
    TextSource::get(&self.slice(..), offset, length)
  }
}

impl TextSource for str {
  fn len(&self) -> usize {
    self.chars().count()
  }

  fn get(&self, offset: usize, length: usize) -> Result<Tendril> {
    let start = char_to_byte(self, offset)
      .ok_or_else(|| out_of_bounds(offset, length, TextSource::len(self)))?;
    let span = char_to_byte(&self[start..], length)
      .ok_or_else(|| out_of_bounds(offset, length, TextSource::len(self)))?;

    Ok(Tendril::from(&self[start..start + span]))
  }
}
