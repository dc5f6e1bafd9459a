use std::mem;

use crate::region::Region;

/// Bytes taken by the header in front of every block: the `size` word.
pub const HEADER_SIZE: usize = mem::size_of::<usize>();

/// Bytes taken by the `next` link of a free block. The link lives in the
/// first payload word, so a payload is never smaller than this.
pub const LINK_SIZE: usize = mem::size_of::<usize>();

/// In-band encoding of "no next block".
const NIL: usize = usize::MAX;

/// A typed view of the block header at `offset` inside a [`Region`].
///
/// ```text
///   offset          offset + HEADER_SIZE
///   ▼               ▼
///   ┌───────────────┬───────────────┬─────────────────────────────┐
///   │ size          │ next (free)   │ ... rest of payload ...     │
///   └───────────────┴───────────────┴─────────────────────────────┘
///                   ◄──────────────────── size bytes ────────────►
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
  pub offset: usize,
}

impl Block {
  pub fn new(offset: usize) -> Self {
    Self { offset }
  }

  /// Recovers the block owning the payload that starts at `payload`.
  pub fn from_payload(payload: usize) -> Option<Self> {
    payload.checked_sub(HEADER_SIZE).map(Self::new)
  }

  /// Installs a fresh header: `size` payload bytes followed by `next`.
  pub fn install(
    region: &mut Region,
    offset: usize,
    size: usize,
    next: Option<Block>,
  ) -> Self {
    debug_assert_eq!(size % mem::size_of::<usize>(), 0);

    let block = Self::new(offset);
    block.set_size(region, size);
    block.set_next(region, next);
    block
  }

  pub fn size(
    self,
    region: &Region,
  ) -> usize {
    region.read_word(self.offset)
  }

  pub fn set_size(
    self,
    region: &mut Region,
    size: usize,
  ) {
    region.write_word(self.offset, size);
  }

  pub fn next(
    self,
    region: &Region,
  ) -> Option<Block> {
    match region.read_word(self.payload()) {
      NIL => None,
      offset => Some(Block::new(offset)),
    }
  }

  pub fn set_next(
    self,
    region: &mut Region,
    next: Option<Block>,
  ) {
    region.write_word(self.payload(), next.map_or(NIL, |block| block.offset));
  }

  /// Offset of the first payload byte.
  pub fn payload(self) -> usize {
    self.offset + HEADER_SIZE
  }

  /// Offset one past the last payload byte.
  pub fn end(
    self,
    region: &Region,
  ) -> usize {
    self.payload() + self.size(region)
  }
}
