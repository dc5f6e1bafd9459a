//! The single contiguous span of memory an allocator manages.
//!
//! ```text
//!   base                                                   base + len
//!   ▼                                                               ▼
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │ anonymous, zero-filled, read/write mapping (page multiple)    │
//!   └───────────────────────────────────────────────────────────────┘
//!   offset 0                                                   len
//! ```
//!
//! Everything above this module speaks in byte offsets from `base`.
//! Offsets are only turned into machine addresses at the moment a word
//! is read or written, or when a payload pointer is handed to a caller.

use std::{io, mem, ptr::NonNull};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, mmap, munmap, sysconf};

use crate::{align::checked_align_to, error::InitError};

const WORD: usize = mem::size_of::<usize>();

/// Page size used when `sysconf` cannot tell us.
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Returns the operating system page size.
pub fn page_size() -> usize {
  let size = unsafe { sysconf(libc::_SC_PAGESIZE) };

  if size > 0 && (size as usize).is_power_of_two() {
    size as usize
  } else {
    FALLBACK_PAGE_SIZE
  }
}

pub struct Region {
  base: NonNull<u8>,
  len: usize,
}

// The mapping is owned exclusively by its `Region`; moving it to another
// thread moves that ownership with it.
unsafe impl Send for Region {}

impl Region {
  /// Reserves `bytes` rounded up to the page size as one anonymous mapping.
  pub fn reserve(bytes: usize) -> Result<Self, InitError> {
    if bytes == 0 {
      return Err(InitError::InvalidSize);
    }

    let len = checked_align_to(bytes, page_size()).ok_or_else(|| {
      InitError::ReservationFailed(io::Error::from(io::ErrorKind::OutOfMemory))
    })?;

    let address = unsafe {
      mmap(
        std::ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(InitError::ReservationFailed(io::Error::last_os_error()));
    }

    let base = NonNull::new(address.cast::<u8>())
      .ok_or_else(|| InitError::ReservationFailed(io::Error::from(io::ErrorKind::AddrNotAvailable)))?;

    log::debug!("reserved region of {len} bytes at {base:p}");

    Ok(Self { base, len })
  }

  pub fn base(&self) -> usize {
    self.base.as_ptr() as usize
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Absolute address of the byte at `offset`.
  pub fn address(
    &self,
    offset: usize,
  ) -> usize {
    self.base() + offset
  }

  /// Pointer to the byte at `offset`.
  pub fn pointer(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    debug_assert!(offset <= self.len, "offset {offset:#x} outside region");
    unsafe { self.base.add(offset) }
  }

  /// Converts a pointer back into an offset, if it lies inside the region.
  pub fn offset_of(
    &self,
    pointer: *const u8,
  ) -> Option<usize> {
    let address = pointer as usize;
    let offset = address.checked_sub(self.base())?;
    (offset < self.len).then_some(offset)
  }

  pub fn read_word(
    &self,
    offset: usize,
  ) -> usize {
    self.check_word(offset);
    unsafe { self.base.add(offset).cast::<usize>().read() }
  }

  pub fn write_word(
    &mut self,
    offset: usize,
    value: usize,
  ) {
    self.check_word(offset);
    unsafe { self.base.add(offset).cast::<usize>().write(value) }
  }

  fn check_word(
    &self,
    offset: usize,
  ) {
    debug_assert!(
      offset % WORD == 0 && offset.checked_add(WORD).is_some_and(|end| end <= self.len),
      "word access at {offset:#x} outside region of {} bytes",
      self.len
    );
  }
}

impl Drop for Region {
  fn drop(&mut self) {
    unsafe {
      munmap(self.base.as_ptr().cast(), self.len);
    }
  }
}
