use std::{mem, ptr::NonNull};

use crate::{
  align::checked_align,
  block::{Block, HEADER_SIZE, LINK_SIZE},
  config::Config,
  dump::{BlockInfo, Dump},
  error::{AllocError, FreeError, InitError},
  free_list::FreeList,
  region::Region,
  split::carve,
  strategy::Strategy,
};

const WORD: usize = mem::size_of::<usize>();

/// A free-list allocator over one fixed region, using one [`Strategy`].
///
/// The allocator is an ordinary value: every piece of state (region, free
/// list, strategy and next-fit cursor) lives in it, and dropping it unmaps
/// the region. It is not thread safe; wrap it in a lock to share it.
pub struct FitAllocator {
  region: Region,
  free_list: FreeList,
  strategy: Strategy,
  cursor: Option<usize>,
}

impl FitAllocator {
  /// Reserves at least `region_bytes` (rounded up to the page size) and
  /// seeds the free list with one block spanning the whole region.
  pub fn init(
    region_bytes: usize,
    strategy: Strategy,
  ) -> Result<Self, InitError> {
    let mut region = Region::reserve(region_bytes)?;

    let size = region.len() - HEADER_SIZE;
    let head = Block::install(&mut region, 0, size, None);

    log::debug!(
      "initialized {strategy} allocator: {} bytes at {:#x}, {size} bytes free",
      region.len(),
      region.base()
    );

    Ok(Self {
      region,
      free_list: FreeList::new(Some(head)),
      strategy,
      cursor: None,
    })
  }

  pub fn with_config(config: &Config) -> Result<Self, InitError> {
    Self::init(config.region_bytes, config.strategy)
  }

  /// Allocates at least `size` bytes, word aligned.
  ///
  /// On failure the free list is left exactly as it was.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidSize);
    }

    let out_of_memory = AllocError::OutOfMemory { requested: size };
    let request = checked_align(size).ok_or(out_of_memory)?.max(LINK_SIZE);

    let Some(entry) = self.strategy.select(&self.free_list, &self.region, request, self.cursor) else {
      log::debug!("{} found no block for {request} bytes", self.strategy);
      return Err(out_of_memory);
    };

    let carved = carve(&mut self.free_list, &mut self.region, entry, request);

    if self.strategy == Strategy::NextFit {
      self.cursor = Some(match carved.remainder {
        Some(remainder) => remainder.offset,
        None => carved.payload + carved.granted,
      });
    }

    Ok(self.region.pointer(carved.payload))
  }

  /// Returns an allocation to the free list and merges it with any free
  /// neighbours.
  ///
  /// A null pointer, or one that cannot be a payload of this region, is
  /// rejected with [`FreeError::InvalidArgument`] without touching any state.
  ///
  /// # Safety
  ///
  /// A non-null `ptr` must have been returned by [`FitAllocator::allocate`]
  /// on this allocator and not freed since. Double frees and foreign
  /// pointers inside the region are not detected and corrupt the free list.
  pub unsafe fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), FreeError> {
    if ptr.is_null() {
      return Err(FreeError::InvalidArgument);
    }

    let block = self.owning_block(ptr).ok_or(FreeError::InvalidArgument)?;

    log::debug!(
      "freeing block at {:#x} with size {}",
      block.offset,
      block.size(&self.region)
    );

    self.free_list.insert(&mut self.region, block);
    self.free_list.coalesce(&mut self.region);

    Ok(())
  }

  /// Payload bytes granted to the allocation at `ptr`, which can be more
  /// than were requested.
  pub fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> Option<usize> {
    self
      .owning_block(ptr.as_ptr())
      .map(|block| block.size(&self.region))
  }

  /// Lists the free blocks in address order.
  pub fn dump(&self) -> Dump {
    let blocks = self
      .free_list
      .iter(&self.region)
      .enumerate()
      .map(|(i, entry)| BlockInfo {
        index: i + 1,
        size: entry.block.size(&self.region),
        address: self.region.address(entry.block.offset),
      })
      .collect();

    Dump::new(blocks)
  }

  pub fn strategy(&self) -> Strategy {
    self.strategy
  }

  /// Address of the first byte of the region.
  pub fn region_base(&self) -> usize {
    self.region.base()
  }

  /// Region length in bytes, a multiple of the page size.
  pub fn region_len(&self) -> usize {
    self.region.len()
  }

  pub fn free_blocks(&self) -> usize {
    self.free_list.len(&self.region)
  }

  pub fn free_bytes(&self) -> usize {
    self.free_list.free_bytes(&self.region)
  }

  /// Address where the next next-fit search resumes, if one has been set.
  pub fn cursor(&self) -> Option<usize> {
    self.cursor.map(|offset| self.region.address(offset))
  }

  /// The header in front of `ptr`, if `ptr` is shaped like a payload of
  /// this region.
  fn owning_block(
    &self,
    ptr: *const u8,
  ) -> Option<Block> {
    let payload = self.region.offset_of(ptr)?;
    if payload % WORD != 0 {
      return None;
    }

    let block = Block::from_payload(payload)?;
    let size = block.size(&self.region);

    let fits = size % WORD == 0
      && size >= LINK_SIZE
      && payload.checked_add(size).is_some_and(|end| end <= self.region.len());

    fits.then_some(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::{
    prelude::{any, prop},
    prop_assert, prop_assert_eq, prop_oneof, proptest,
    strategy::Strategy as PropStrategy,
  };

  fn shape(allocator: &FitAllocator) -> Vec<(usize, usize)> {
    allocator
      .free_list
      .iter(&allocator.region)
      .map(|entry| (entry.block.offset, entry.block.size(&allocator.region)))
      .collect()
  }

  fn offset(
    allocator: &FitAllocator,
    ptr: NonNull<u8>,
  ) -> usize {
    ptr.as_ptr() as usize - allocator.region_base()
  }

  #[test]
  fn test_init_seeds_one_block() {
    let allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();
    let len = allocator.region_len();

    assert_eq!(shape(&allocator), vec![(0, len - HEADER_SIZE)]);
    assert_eq!(allocator.cursor(), None);
  }

  #[test]
  fn test_init_rejects_zero() {
    assert!(matches!(
      FitAllocator::init(0, Strategy::BestFit),
      Err(InitError::InvalidSize)
    ));
  }

  #[test]
  fn test_allocate_rounds_to_word() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();

    let ptr = allocator.allocate(13).unwrap();

    assert_eq!(ptr.as_ptr() as usize % WORD, 0);
    assert_eq!(allocator.usable_size(ptr), Some(checked_align(13).unwrap()));

    let tiny = allocator.allocate(1).unwrap();
    assert_eq!(allocator.usable_size(tiny), Some(LINK_SIZE));
  }

  #[test]
  fn test_allocate_zero_is_invalid() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();
    let before = shape(&allocator);

    assert_eq!(allocator.allocate(0), Err(AllocError::InvalidSize));
    assert_eq!(shape(&allocator), before);
  }

  #[test]
  fn test_out_of_memory_leaves_list_alone() {
    for strategy in Strategy::ALL {
      let mut allocator = FitAllocator::init(4096, strategy).unwrap();
      allocator.allocate(512).unwrap();
      let before = shape(&allocator);
      let cursor = allocator.cursor();

      let too_big = allocator.region_len();
      assert_eq!(
        allocator.allocate(too_big),
        Err(AllocError::OutOfMemory { requested: too_big })
      );
      assert_eq!(
        allocator.allocate(usize::MAX),
        Err(AllocError::OutOfMemory { requested: usize::MAX })
      );
      assert_eq!(shape(&allocator), before);
      assert_eq!(allocator.cursor(), cursor);
    }
  }

  #[test]
  fn test_exhaust_and_recover() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();
    let whole = allocator.region_len() - HEADER_SIZE;

    let ptr = allocator.allocate(whole).unwrap();
    assert!(allocator.dump().is_empty());
    assert_eq!(allocator.allocate(8), Err(AllocError::OutOfMemory { requested: 8 }));

    unsafe { allocator.free(ptr.as_ptr()).unwrap() };
    assert_eq!(shape(&allocator), vec![(0, whole)]);
  }

  #[test]
  fn test_small_leftover_is_consumed() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();
    let whole = allocator.region_len() - HEADER_SIZE;

    let ptr = allocator.allocate(whole - HEADER_SIZE - LINK_SIZE).unwrap();

    assert_eq!(allocator.usable_size(ptr), Some(whole));
    assert_eq!(allocator.free_blocks(), 0);
  }

  #[test]
  fn test_free_null_is_invalid() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();
    allocator.allocate(64).unwrap();
    let before = shape(&allocator);

    let result = unsafe { allocator.free(std::ptr::null_mut()) };

    assert_eq!(result, Err(FreeError::InvalidArgument));
    assert_eq!(shape(&allocator), before);
  }

  #[test]
  fn test_free_outside_region_is_invalid() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();
    let ptr = allocator.allocate(64).unwrap();
    let mut local = 0u64;

    unsafe {
      assert_eq!(
        allocator.free(&mut local as *mut u64 as *mut u8),
        Err(FreeError::InvalidArgument)
      );
      assert_eq!(allocator.free(ptr.as_ptr().add(1)), Err(FreeError::InvalidArgument));
    }
  }

  #[test]
  fn test_free_coalesces_both_sides() {
    let mut allocator = FitAllocator::init(4096, Strategy::FirstFit).unwrap();

    let a = allocator.allocate(64).unwrap();
    let b = allocator.allocate(64).unwrap();
    let c = allocator.allocate(64).unwrap();
    let _guard = allocator.allocate(64).unwrap();

    unsafe {
      allocator.free(a.as_ptr()).unwrap();
      allocator.free(c.as_ptr()).unwrap();
      assert_eq!(allocator.free_blocks(), 3);

      allocator.free(b.as_ptr()).unwrap();
    }

    let blocks = shape(&allocator);
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], (0, 3 * 64 + 2 * HEADER_SIZE));
  }

  #[test]
  fn test_next_fit_cursor_follows_remainder() {
    let mut allocator = FitAllocator::init(4096, Strategy::NextFit).unwrap();

    let a = allocator.allocate(100).unwrap();
    let a_offset = offset(&allocator, a);
    assert_eq!(
      allocator.cursor,
      Some(a_offset + checked_align(100).unwrap())
    );

    allocator.allocate(200).unwrap();
    let remainder = allocator.free_list.head().unwrap().offset;
    assert_eq!(allocator.cursor, Some(remainder));
  }

  #[test]
  fn test_next_fit_cursor_after_whole_block() {
    let mut allocator = FitAllocator::init(4096, Strategy::NextFit).unwrap();

    let a = allocator.allocate(64).unwrap();
    allocator.allocate(64).unwrap();
    unsafe { allocator.free(a.as_ptr()).unwrap() };

    // Start over at the head, where the freed block is an exact fit.
    allocator.cursor = Some(allocator.region_len());
    let again = allocator.allocate(64).unwrap();

    assert_eq!(again, a);
    assert_eq!(allocator.cursor, Some(HEADER_SIZE + 64));
  }

  #[test]
  fn test_next_fit_resumes_in_block_holding_cursor() {
    let mut allocator = FitAllocator::init(4096, Strategy::NextFit).unwrap();

    let p0 = allocator.allocate(100).unwrap();
    allocator.allocate(100).unwrap();
    let p2 = allocator.allocate(100).unwrap();
    assert_eq!(offset(&allocator, p0), 0x8);
    assert_eq!(offset(&allocator, p2), 0xe8);
    assert_eq!(allocator.cursor, Some(0x150));

    unsafe {
      allocator.free(p0.as_ptr()).unwrap();
      allocator.free(p2.as_ptr()).unwrap();
    }
    let len = allocator.region_len();
    assert_eq!(shape(&allocator), vec![(0, 104), (0xe0, len - 0xe0 - HEADER_SIZE)]);

    // The cursor now sits inside the merged block at 0xe0.
    let next = allocator.allocate(8).unwrap();
    assert_eq!(next, p2);
    assert_eq!(allocator.cursor, Some(0xf0));
  }

  #[test]
  fn test_free_bytes_tracks_free_list() {
    let mut allocator = FitAllocator::init(4096, Strategy::BestFit).unwrap();
    let whole = allocator.region_len() - HEADER_SIZE;
    assert_eq!(allocator.free_bytes(), whole);

    let a = allocator.allocate(100).unwrap();
    allocator.allocate(40).unwrap();
    assert_eq!(allocator.free_bytes(), whole - 104 - 40 - 2 * HEADER_SIZE);

    unsafe { allocator.free(a.as_ptr()).unwrap() };
    assert_eq!(allocator.free_bytes(), allocator.dump().free_bytes());
    assert_eq!(allocator.free_bytes(), whole - 40 - HEADER_SIZE - HEADER_SIZE);
  }

  #[test]
  fn test_strategy_and_config() {
    let config = Config::new(10_000, Strategy::WorstFit);
    let allocator = FitAllocator::with_config(&config).unwrap();

    assert_eq!(allocator.strategy(), Strategy::WorstFit);
    assert!(allocator.region_len() >= 10_000);
    assert_eq!(allocator.region_len() % crate::region::page_size(), 0);
  }

  fn strategies() -> impl PropStrategy<Value = Strategy> {
    prop::sample::select(Strategy::ALL.to_vec())
  }

  #[derive(Debug, Clone)]
  enum Op {
    Alloc(usize),
    Free(usize),
  }

  fn ops() -> impl PropStrategy<Value = Vec<Op>> {
    prop::collection::vec(
      prop_oneof![
        (1usize..600).prop_map(Op::Alloc),
        any::<usize>().prop_map(Op::Free),
      ],
      1..80,
    )
  }

  proptest! {
    #[test]
    fn prop_free_list_stays_merged_and_ordered(strategy in strategies(), ops in ops()) {
      let mut allocator = FitAllocator::init(8192, strategy).unwrap();
      let mut live = Vec::new();

      for op in ops {
        match op {
          Op::Alloc(size) => {
            if let Ok(ptr) = allocator.allocate(size) {
              live.push(ptr);
            }
          }
          Op::Free(pick) if !live.is_empty() => {
            let ptr = live.swap_remove(pick % live.len());
            unsafe { allocator.free(ptr.as_ptr()).unwrap() };

            let blocks = shape(&allocator);
            for pair in blocks.windows(2) {
              let (offset, size) = pair[0];
              prop_assert!(offset + HEADER_SIZE + size < pair[1].0);
            }
          }
          Op::Free(_) => {}
        }

        for (offset, size) in shape(&allocator) {
          prop_assert_eq!(size % WORD, 0);
          prop_assert!(offset + HEADER_SIZE + size <= allocator.region_len());
        }
      }

      let once = shape(&allocator);
      prop_assert_eq!(allocator.free_list.coalesce(&mut allocator.region), 0);
      prop_assert_eq!(shape(&allocator), once);
    }
  }
}
