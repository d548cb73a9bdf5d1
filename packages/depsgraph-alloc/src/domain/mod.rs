//! Domain types for tagged allocation
//!
//! A block is identified by an opaque [`BlockHandle`]; every block carries the
//! static name it was requested under so that leaks can be reported per kind.

use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// Opaque handle of one tagged block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(u64);

impl BlockHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Named, trackable allocation service
///
/// Implementations must be shareable between threads: independent graphs built
/// in parallel talk to the same service.
pub trait MemoryTagService: Send + Sync {
    /// Record a block of `size` bytes under `name`
    fn allocate_tagged(&self, size: usize, name: &'static str) -> Result<BlockHandle>;

    /// Release a block previously returned by [`allocate_tagged`](Self::allocate_tagged)
    fn free(&self, handle: BlockHandle);
}

/// Unfreed blocks sharing one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakEntry {
    pub name: &'static str,
    pub blocks: usize,
    pub bytes: usize,
}

/// Snapshot of every block still allocated, grouped by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeakReport {
    /// Sorted by name
    pub entries: Vec<LeakEntry>,
}

impl LeakReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_blocks(&self) -> usize {
        self.entries.iter().map(|e| e.blocks).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.bytes).sum()
    }

    /// Lookup by block name
    pub fn entry(&self, name: &str) -> Option<&LeakEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no leaked blocks");
        }
        writeln!(
            f,
            "{} leaked blocks, {} bytes:",
            self.total_blocks(),
            self.total_bytes()
        )?;
        for entry in &self.entries {
            writeln!(
                f,
                "  {:<40} {:>6} blocks {:>10} bytes",
                entry.name, entry.blocks, entry.bytes
            )?;
        }
        Ok(())
    }
}
