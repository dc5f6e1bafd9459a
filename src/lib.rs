//! # fitalloc - A Fixed-Region Free-List Allocator
//!
//! This crate provides a **free-list allocator** that manages one fixed-size
//! region of memory reserved once from the operating system with `mmap`, and
//! hands out pieces of it using one of four classic placement strategies.
//!
//! ## Overview
//!
//! ```text
//!   Free-List Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          REGION (mmap)                               │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬──────┬────┬──────────┬────┬──────────────────┐  │
//!   │   │ H  │ used │ H  │ free │ H  │   used   │ H  │      free        │  │
//!   │   └────┴──────┴────┴──┬───┴────┴──────────┴────┴───┬──────────────┘  │
//!   │     ▲                 │                             │                │
//!   │     │                 └───── next ─────────────────►└──► None        │
//!   │   head                                                               │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Free blocks form a singly linked list, kept in address order.
//!   Allocation picks a block from the list; free puts it back and merges
//!   it with free neighbours.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── region     - The mmap-backed region (internal)
//!   ├── block      - In-band block headers (internal)
//!   ├── free_list  - Address-ordered free list and coalescing (internal)
//!   ├── split      - Block splitting (internal)
//!   ├── strategy   - First/best/worst/next fit selection
//!   ├── allocator  - FitAllocator, the allocator context
//!   ├── global     - Process-wide init-once facade
//!   ├── dump       - Free-list snapshots and the dump table
//!   ├── config     - Region size and strategy settings
//!   └── error      - Error types
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{FitAllocator, Strategy};
//!
//! let mut allocator = FitAllocator::init(4096, Strategy::BestFit).unwrap();
//!
//! let ptr = allocator.allocate(100).unwrap();
//! unsafe {
//!     ptr.as_ptr().write_bytes(0xAB, 100);
//!     allocator.free(ptr.as_ptr()).unwrap();
//! }
//!
//! println!("{}", allocator.dump());
//! assert_eq!(allocator.dump().len(), 1);
//! ```
//!
//! ## How It Works
//!
//! Every block starts with a one-word header holding its payload size. While
//! a block is free, the first payload word holds the offset of the next free
//! block:
//!
//! ```text
//!   Free Block:
//!   ┌──────────────┬──────────────┬─────────────────────────────────┐
//!   │  size: N     │  next        │           unused                │
//!   └──────────────┴──────────────┴─────────────────────────────────┘
//!     header (1 word)  ◄──────────────── N bytes payload ───────────►
//!
//!   Allocated Block:
//!   ┌──────────────┬────────────────────────────────────────────────┐
//!   │  size: N     │              caller data                       │
//!   └──────────────┴────────────────────────────────────────────────┘
//!                  ▲
//!                  └── Pointer returned to caller
//! ```
//!
//! Requests are rounded up to the machine word. A chosen block is split
//! when what is left over can hold a header and a link; otherwise the caller
//! gets the whole block.
//!
//! | Strategy  | Chooses                                             |
//! |-----------|-----------------------------------------------------|
//! | first-fit | the first block that fits                           |
//! | best-fit  | the block leaving the smallest leftover             |
//! | worst-fit | the block leaving the largest leftover              |
//! | next-fit  | the first block that fits, resuming where it stopped|
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed size**: The region never grows and memory is never returned
//!   to the OS while the allocator lives
//! - **No free validation**: Double frees and foreign pointers inside the
//!   region are not detected
//! - **Unix-only**: Requires `libc` and `mmap` (POSIX systems)
//!
//! ## Safety
//!
//! Allocation is safe; [`FitAllocator::free`] is `unsafe` because it trusts
//! the pointer it is given to be a live allocation from the same allocator.

pub mod align;
mod allocator;
mod block;
mod config;
mod dump;
mod error;
mod free_list;
pub mod global;
mod region;
mod split;
mod strategy;

pub use allocator::FitAllocator;
pub use block::HEADER_SIZE;
pub use config::{Config, REGION_BYTES_VAR, STRATEGY_VAR};
pub use dump::{BlockInfo, Dump};
pub use error::{AllocError, ConfigError, FreeError, InitError};
pub use region::page_size;
pub use strategy::Strategy;
