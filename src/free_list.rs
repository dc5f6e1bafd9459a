//! Address-ordered free list threaded through the region.
//!
//! ```text
//!   head
//!    │
//!    ▼
//!   ┌────┬────┬──────┐   ┌──────────┐   ┌────┬────┬──────┐   ┌──────────┐
//!   │size│next│      │   │allocated │   │size│next│      │   │allocated │
//!   └────┴─┬──┴──────┘   └──────────┘   └────┴─┬──┴──────┘   └──────────┘
//!          └──────────────────────────────▲    └──► None
//!                                         │
//! ```
//!
//! Every splice of the list goes through [`FreeList::link`] or
//! [`FreeList::unlink`], so address order is checked in one place.

use crate::{block::{Block, HEADER_SIZE}, region::Region};

/// A free block together with the free block that links to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
  pub prev: Option<Block>,
  pub block: Block,
}

/// Walks the free list in address order.
pub struct Iter<'a> {
  region: &'a Region,
  prev: Option<Block>,
  current: Option<Block>,
}

impl Iterator for Iter<'_> {
  type Item = Entry;

  fn next(&mut self) -> Option<Entry> {
    let block = self.current?;
    let entry = Entry { prev: self.prev, block };

    self.prev = Some(block);
    self.current = block.next(self.region);

    Some(entry)
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FreeList {
  head: Option<Block>,
}

impl FreeList {
  pub fn new(head: Option<Block>) -> Self {
    Self { head }
  }

  #[cfg(test)]
  pub fn head(&self) -> Option<Block> {
    self.head
  }

  pub fn iter<'a>(
    &self,
    region: &'a Region,
  ) -> Iter<'a> {
    Iter { region, prev: None, current: self.head }
  }

  /// Number of free blocks.
  pub fn len(
    &self,
    region: &Region,
  ) -> usize {
    self.iter(region).count()
  }

  /// Sum of the payload sizes of all free blocks.
  pub fn free_bytes(
    &self,
    region: &Region,
  ) -> usize {
    self.iter(region).map(|entry| entry.block.size(region)).sum()
  }

  /// Splices `block` in between `prev` and `next`.
  pub fn link(
    &mut self,
    region: &mut Region,
    prev: Option<Block>,
    block: Block,
    next: Option<Block>,
  ) {
    debug_assert!(prev.is_none_or(|prev| prev < block));
    debug_assert!(next.is_none_or(|next| block < next));

    block.set_next(region, next);

    match prev {
      Some(prev) => prev.set_next(region, Some(block)),
      None => self.head = Some(block),
    }
  }

  /// Splices `block` out; `prev` must be the block currently linking to it.
  pub fn unlink(
    &mut self,
    region: &mut Region,
    prev: Option<Block>,
    block: Block,
  ) {
    let next = block.next(region);

    match prev {
      Some(prev) => {
        debug_assert_eq!(prev.next(region), Some(block));
        prev.set_next(region, next);
      }
      None => {
        debug_assert_eq!(self.head, Some(block));
        self.head = next;
      }
    }
  }

  /// Inserts `block` at the position that keeps the list address ordered.
  pub fn insert(
    &mut self,
    region: &mut Region,
    block: Block,
  ) {
    let mut prev = None;
    let mut current = self.head;

    while let Some(candidate) = current {
      if candidate > block {
        break;
      }
      prev = Some(candidate);
      current = candidate.next(region);
    }

    self.link(region, prev, block, current);
  }

  /// Merges every pair of list neighbours that are also neighbours in
  /// memory. Returns the number of merges performed.
  pub fn coalesce(
    &mut self,
    region: &mut Region,
  ) -> usize {
    let mut merges = 0;
    let mut current = self.head;

    while let Some(block) = current {
      let Some(next) = block.next(region) else {
        break;
      };

      if block.end(region) == next.offset {
        log::debug!("coalescing blocks at {:#x} and {:#x}", block.offset, next.offset);

        let merged = block.size(region) + HEADER_SIZE + next.size(region);
        let after = next.next(region);

        block.set_size(region, merged);
        block.set_next(region, after);
        merges += 1;
      } else {
        current = Some(next);
      }
    }

    merges
  }
}
