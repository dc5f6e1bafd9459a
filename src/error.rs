use std::io;

use thiserror::Error;

/// Errors returned when setting up an allocator.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("allocator is already initialized")]
  AlreadyInitialized,

  #[error("invalid region size (must be > 0)")]
  InvalidSize,

  #[error("could not reserve the backing region: {0}")]
  ReservationFailed(#[source] io::Error),
}

/// Errors returned by `allocate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("out of memory (requested: {requested} bytes)")]
  OutOfMemory { requested: usize },

  #[error("invalid allocation size (must be > 0)")]
  InvalidSize,

  #[error("allocator is not initialized")]
  Uninitialized,
}

/// Errors returned by `free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FreeError {
  #[error("invalid pointer passed to free")]
  InvalidArgument,

  #[error("allocator is not initialized")]
  Uninitialized,
}

/// Errors returned while reading a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("unknown allocation strategy: {0:?}")]
  UnknownStrategy(String),

  #[error("invalid region size {value:?}: {source}")]
  InvalidRegionSize {
    value: String,
    #[source]
    source: std::num::ParseIntError,
  },
}
