/// A contiguous span of a document, expressed as `offset..offset + length`.
///
/// A zero-length region denotes an insertion point rather than a span.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  pub offset: usize,
  pub length: usize,
}

impl Region {
  pub const fn new(offset: usize, length: usize) -> Self {
    Self { offset, length }
  }

  pub const fn point(offset: usize) -> Self {
    Self { offset, length: 0 }
  }

  /// End of the region, exclusive.
  pub const fn end(self) -> usize {
    self.offset + self.length
  }

  pub const fn is_point(self) -> bool {
    self.length == 0
  }

  /// Whether the two regions overlap.
  ///
  /// Non-empty spans intersect as half-open ranges. A point overlaps a span
  /// when it lies at the span's start or inside it, but not at the span's
  /// end. Two points overlap only when their offsets are equal. The boundary
  /// asymmetry is intentional and callers locating an edit point against a
  /// content region rely on it.
  pub const fn overlaps(self, other: Region) -> bool {
    if other.length > 0 {
      if self.length > 0 {
        return self.offset < other.end() && other.offset < self.end();
      }
      return other.offset <= self.offset && self.offset < other.end();
    }

    if self.length > 0 {
      return self.offset <= other.offset && other.offset < self.end();
    }

    self.offset == other.offset
  }
}
