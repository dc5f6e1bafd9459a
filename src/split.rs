//! Carving a selected free block for an allocation.
//!
//! ```text
//!   before:  ┌──────┬──────────────────────────────────────────────┐
//!            │ size │                 free payload                 │
//!            └──────┴──────────────────────────────────────────────┘
//!
//!   split:   ┌──────┬──────────────┬──────┬────────────────────────┐
//!            │ req  │ granted      │ rest │ free remainder         │
//!            └──────┴──────────────┴──────┴────────────────────────┘
//!                                  ▲
//!                                  └── takes the old block's list slot
//! ```

use crate::{
  block::{Block, HEADER_SIZE, LINK_SIZE},
  free_list::{Entry, FreeList},
  region::Region,
};

/// Outcome of carving a block out of the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carved {
  /// Offset of the payload handed to the caller.
  pub payload: usize,
  /// Payload bytes granted, which may exceed the request.
  pub granted: usize,
  /// The free block left behind by a split, if any.
  pub remainder: Option<Block>,
}

/// Whether a free block of `size` payload bytes is worth splitting for an
/// aligned `request`: the leftover must host a header and a link.
pub fn should_split(
  size: usize,
  request: usize,
) -> bool {
  size > request + HEADER_SIZE + LINK_SIZE
}

/// Takes `entry.block` off the free list for an aligned `request`, either
/// shrinking it and leaving a remainder in its slot, or consuming it whole.
pub fn carve(
  list: &mut FreeList,
  region: &mut Region,
  entry: Entry,
  request: usize,
) -> Carved {
  let Entry { prev, block } = entry;
  let size = block.size(region);

  debug_assert!(size >= request);

  if should_split(size, request) {
    let next = block.next(region);
    let remainder_offset = block.payload() + request;
    let remainder = Block::install(region, remainder_offset, size - request - HEADER_SIZE, None);

    block.set_size(region, request);
    list.link(region, prev, remainder, next);

    log::debug!(
      "split block at {:#x}: {request} bytes granted, {} bytes left at {remainder_offset:#x}",
      block.offset,
      size - request - HEADER_SIZE,
    );

    Carved { payload: block.payload(), granted: request, remainder: Some(remainder) }
  } else {
    list.unlink(region, prev, block);

    log::debug!("consumed whole block at {:#x} ({size} bytes for {request})", block.offset);

    Carved { payload: block.payload(), granted: size, remainder: None }
  }
}
