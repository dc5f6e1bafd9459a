/// Calculates the machine word alignment for the given size.
///
/// # Examples
///
/// ```rust
/// use fitalloc::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `alignment`, which must be a
/// power of two.
///
/// ```rust
/// use fitalloc::align_to;
///
/// assert_eq!(align_to!(1, 4096), 4096);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// assert_eq!(align_to!(4097, 4096), 8192);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

/// Overflow-checked form of [`align!`] for sizes coming from callers.
pub fn checked_align(value: usize) -> Option<usize> {
  let mask = core::mem::size_of::<usize>() - 1;
  value.checked_add(mask).map(|v| v & !mask)
}

/// Overflow-checked form of [`align_to!`].
pub fn checked_align_to(
  value: usize,
  alignment: usize,
) -> Option<usize> {
  debug_assert!(alignment.is_power_of_two());
  value.checked_add(alignment - 1).map(|v| v & !(alignment - 1))
}
