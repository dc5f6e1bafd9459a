//! Block selection over the free list.
//!
//! | Strategy  | Picks                                         |
//! |-----------|-----------------------------------------------|
//! | first-fit | first block large enough, from the head       |
//! | best-fit  | smallest leftover, first one on ties          |
//! | worst-fit | largest leftover, first one on ties           |
//! | next-fit  | first block large enough, from the cursor on  |
//!
//! Selection never mutates anything; carving the chosen block is left to
//! [`split::carve`](crate::split::carve) so all four share one split rule.

use std::{fmt, iter, str::FromStr};

use crate::{
  error::ConfigError,
  free_list::{Entry, FreeList},
  region::Region,
};

/// Block-selection algorithm, fixed for the lifetime of an allocator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
  #[default]
  FirstFit,
  BestFit,
  WorstFit,
  NextFit,
}

impl Strategy {
  pub const ALL: [Strategy; 4] = [
    Strategy::FirstFit,
    Strategy::BestFit,
    Strategy::WorstFit,
    Strategy::NextFit,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Strategy::FirstFit => "first-fit",
      Strategy::BestFit => "best-fit",
      Strategy::WorstFit => "worst-fit",
      Strategy::NextFit => "next-fit",
    }
  }

  /// Chooses a free block with at least `request` payload bytes.
  ///
  /// `cursor` is only consulted by [`Strategy::NextFit`].
  pub fn select(
    self,
    list: &FreeList,
    region: &Region,
    request: usize,
    cursor: Option<usize>,
  ) -> Option<Entry> {
    let selected = match self {
      Strategy::FirstFit => first_fit(list, region, request),
      Strategy::BestFit => best_fit(list, region, request),
      Strategy::WorstFit => worst_fit(list, region, request),
      Strategy::NextFit => next_fit(list, region, request, cursor),
    };

    if let Some(entry) = selected {
      log::debug!(
        "{self} selected block at {:#x} ({} bytes) for {request} bytes",
        entry.block.offset,
        entry.block.size(region)
      );
    }

    selected
  }
}

impl fmt::Display for Strategy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Strategy {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_lowercase().replace('_', "-");

    match normalized.as_str() {
      "first-fit" | "firstfit" | "first" => Ok(Strategy::FirstFit),
      "best-fit" | "bestfit" | "best" => Ok(Strategy::BestFit),
      "worst-fit" | "worstfit" | "worst" => Ok(Strategy::WorstFit),
      "next-fit" | "nextfit" | "next" => Ok(Strategy::NextFit),
      _ => Err(ConfigError::UnknownStrategy(s.to_owned())),
    }
  }
}

fn fits(
  region: &Region,
  entry: &Entry,
  request: usize,
) -> bool {
  let size = entry.block.size(region);
  log::trace!("checking block at {:#x} with size {size}", entry.block.offset);
  size >= request
}

fn first_fit(
  list: &FreeList,
  region: &Region,
  request: usize,
) -> Option<Entry> {
  list.iter(region).find(|entry| fits(region, entry, request))
}

fn best_fit(
  list: &FreeList,
  region: &Region,
  request: usize,
) -> Option<Entry> {
  let mut best: Option<(Entry, usize)> = None;

  for entry in list.iter(region).filter(|entry| fits(region, entry, request)) {
    let leftover = entry.block.size(region) - request;
    if best.is_none_or(|(_, smallest)| leftover < smallest) {
      best = Some((entry, leftover));
    }
  }

  best.map(|(entry, _)| entry)
}

fn worst_fit(
  list: &FreeList,
  region: &Region,
  request: usize,
) -> Option<Entry> {
  let mut worst: Option<(Entry, usize)> = None;

  for entry in list.iter(region).filter(|entry| fits(region, entry, request)) {
    let leftover = entry.block.size(region) - request;
    if worst.is_none_or(|(_, largest)| leftover > largest) {
      worst = Some((entry, leftover));
    }
  }

  worst.map(|(entry, _)| entry)
}

/// Scans from the free block holding `cursor` (or the first one past it)
/// to the tail, then wraps to the head and stops on reaching the starting
/// block again.
fn next_fit(
  list: &FreeList,
  region: &Region,
  request: usize,
  cursor: Option<usize>,
) -> Option<Entry> {
  let start = cursor.filter(|&offset| offset < region.len()).unwrap_or(0);

  let mut walk = list.iter(region);
  let Some(resume) = walk.by_ref().find(|entry| entry.block.end(region) > start) else {
    return first_fit(list, region, request);
  };

  let wrapped = list.iter(region).take_while(|entry| entry.block != resume.block);

  iter::once(resume)
    .chain(walk)
    .chain(wrapped)
    .find(|entry| fits(region, entry, request))
}
