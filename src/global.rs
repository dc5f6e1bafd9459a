//! A process-wide allocator that can be initialized exactly once.
//!
//! These functions wrap one [`FitAllocator`] kept for the rest of the
//! process. The lock only makes the static well formed; callers are still
//! expected to serialize their calls.

use std::{
  ptr::NonNull,
  sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
  allocator::FitAllocator,
  dump::Dump,
  error::{AllocError, FreeError, InitError},
  strategy::Strategy,
};

static ALLOCATOR: Mutex<Option<FitAllocator>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<FitAllocator>> {
  ALLOCATOR.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initializes the process-wide allocator.
///
/// A second call fails with [`InitError::AlreadyInitialized`] and leaves
/// the first allocator untouched.
pub fn init(
  region_bytes: usize,
  strategy: Strategy,
) -> Result<(), InitError> {
  let mut slot = lock();

  if slot.is_some() {
    return Err(InitError::AlreadyInitialized);
  }

  *slot = Some(FitAllocator::init(region_bytes, strategy)?);
  Ok(())
}

pub fn allocate(size: usize) -> Result<NonNull<u8>, AllocError> {
  lock().as_mut().ok_or(AllocError::Uninitialized)?.allocate(size)
}

/// # Safety
///
/// Same contract as [`FitAllocator::free`]: a non-null `ptr` must come from
/// [`allocate`] and must not have been freed already.
pub unsafe fn free(ptr: *mut u8) -> Result<(), FreeError> {
  let mut slot = lock();
  let allocator = slot.as_mut().ok_or(FreeError::Uninitialized)?;

  unsafe { allocator.free(ptr) }
}

/// Snapshot of the free list; empty before [`init`].
pub fn dump() -> Dump {
  lock().as_ref().map(FitAllocator::dump).unwrap_or_default()
}
