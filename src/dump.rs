use std::{fmt, slice};

/// One free block as reported by [`FitAllocator::dump`](crate::FitAllocator::dump).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// 1-based position in the free list.
  pub index: usize,
  /// Payload bytes, excluding the header.
  pub size: usize,
  /// Address of the block header.
  pub address: usize,
}

/// Snapshot of the free list in traversal order.
///
/// The `Display` impl renders it as a table:
///
/// ```text
/// Memory Dump:
/// -------------------------------------------------
/// | Block Number | Block Size | Block Address     |
/// -------------------------------------------------
/// | 1           | 4088       | 0x7f5e3c1b2000    |
/// -------------------------------------------------
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dump {
  blocks: Vec<BlockInfo>,
}

impl Dump {
  pub fn new(blocks: Vec<BlockInfo>) -> Self {
    Self { blocks }
  }

  pub fn blocks(&self) -> &[BlockInfo] {
    &self.blocks
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn iter(&self) -> slice::Iter<'_, BlockInfo> {
    self.blocks.iter()
  }

  /// Sum of all free payload sizes.
  pub fn free_bytes(&self) -> usize {
    self.blocks.iter().map(|block| block.size).sum()
  }
}

impl<'a> IntoIterator for &'a Dump {
  type Item = &'a BlockInfo;
  type IntoIter = slice::Iter<'a, BlockInfo>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl IntoIterator for Dump {
  type Item = BlockInfo;
  type IntoIter = std::vec::IntoIter<BlockInfo>;

  fn into_iter(self) -> Self::IntoIter {
    self.blocks.into_iter()
  }
}

const RULE: &str = "-------------------------------------------------";

impl fmt::Display for Dump {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory Dump:")?;
    writeln!(f, "{RULE}")?;
    writeln!(f, "| Block Number | Block Size | Block Address     |")?;
    writeln!(f, "{RULE}")?;

    for block in &self.blocks {
      let address = format!("{:#x}", block.address);
      writeln!(f, "| {:<12}| {:<11}| {:<18}|", block.index, block.size, address)?;
    }

    write!(f, "{RULE}")
  }
}
