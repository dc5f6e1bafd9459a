use std::ptr::NonNull;

use fitalloc::{FitAllocator, HEADER_SIZE, Strategy};
use proptest::{prelude::*, strategy::Strategy as _};

#[derive(Debug, Clone)]
enum Op {
  Alloc(usize),
  Free(usize),
}

fn ops() -> impl proptest::strategy::Strategy<Value = Vec<Op>> {
  prop::collection::vec(
    prop_oneof![
      3 => (1usize..400).prop_map(Op::Alloc),
      2 => any::<usize>().prop_map(Op::Free),
    ],
    1..120,
  )
}

fn strategies() -> impl proptest::strategy::Strategy<Value = Strategy> {
  prop::sample::select(Strategy::ALL.to_vec())
}

/// `(header address, payload size)` of every free block.
fn free_blocks(allocator: &FitAllocator) -> Vec<(usize, usize)> {
  allocator.dump().iter().map(|block| (block.address, block.size)).collect()
}

/// Checks that free and live blocks tile the region exactly.
fn check_tiling(
  allocator: &FitAllocator,
  live: &[NonNull<u8>],
) -> Result<(), TestCaseError> {
  let mut spans: Vec<(usize, usize)> = free_blocks(allocator)
    .into_iter()
    .map(|(address, size)| (address, address + HEADER_SIZE + size))
    .collect();

  for ptr in live {
    let payload = ptr.as_ptr() as usize;
    let size = allocator.usable_size(*ptr).unwrap();
    spans.push((payload - HEADER_SIZE, payload + size));
  }

  spans.sort_unstable();

  let mut expected = allocator.region_base();
  for (start, end) in spans {
    prop_assert_eq!(start, expected, "gap or overlap at {:#x}", start);
    expected = end;
  }
  prop_assert_eq!(expected, allocator.region_base() + allocator.region_len());

  Ok(())
}

proptest! {
  #[test]
  fn blocks_tile_the_region(strategy in strategies(), ops in ops()) {
    let _ = env_logger::try_init();
    let mut allocator = FitAllocator::init(8192, strategy).unwrap();
    let mut live = Vec::new();

    for op in ops {
      match op {
        Op::Alloc(size) => {
          if let Ok(ptr) = allocator.allocate(size) {
            prop_assert_eq!(ptr.as_ptr() as usize % std::mem::size_of::<usize>(), 0);
            prop_assert!(allocator.usable_size(ptr).unwrap() >= size);
            live.push(ptr);
          }
        }
        Op::Free(pick) if !live.is_empty() => {
          let ptr: NonNull<u8> = live.swap_remove(pick % live.len());
          unsafe { allocator.free(ptr.as_ptr()).unwrap() };

          for pair in free_blocks(&allocator).windows(2) {
            let (address, size) = pair[0];
            prop_assert!(address + HEADER_SIZE + size < pair[1].0);
          }
        }
        Op::Free(_) => {}
      }

      for (_, size) in free_blocks(&allocator) {
        prop_assert_eq!(size % std::mem::size_of::<usize>(), 0);
      }
      check_tiling(&allocator, &live)?;
    }

    for ptr in live.drain(..) {
      unsafe { allocator.free(ptr.as_ptr()).unwrap() };
    }
    prop_assert_eq!(
      free_blocks(&allocator),
      vec![(allocator.region_base(), allocator.region_len() - HEADER_SIZE)]
    );
  }

  #[test]
  fn allocate_then_free_restores_the_free_list(
    strategy in strategies(),
    setup in ops(),
    size in 1usize..2048,
  ) {
    let mut allocator = FitAllocator::init(8192, strategy).unwrap();
    let mut live = Vec::new();

    for op in setup {
      match op {
        Op::Alloc(size) => live.extend(allocator.allocate(size).ok()),
        Op::Free(pick) if !live.is_empty() => {
          let ptr: NonNull<u8> = live.swap_remove(pick % live.len());
          unsafe { allocator.free(ptr.as_ptr()).unwrap() };
        }
        Op::Free(_) => {}
      }
    }

    let before = free_blocks(&allocator);

    if let Ok(ptr) = allocator.allocate(size) {
      unsafe { allocator.free(ptr.as_ptr()).unwrap() };
    }

    prop_assert_eq!(free_blocks(&allocator), before);
  }
}
