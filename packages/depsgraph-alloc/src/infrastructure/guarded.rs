//! Guarded allocator: a concurrent ledger of tagged blocks
//!
//! Keeps running totals with atomics and the per-block record in a `DashMap`,
//! so independent graph builds on different threads can share one instance.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, error, warn};

use crate::domain::{BlockHandle, LeakEntry, LeakReport, MemoryTagService};
use crate::error::{AllocError, Result};

#[derive(Debug, Clone, Copy)]
struct BlockInfo {
    size: usize,
    name: &'static str,
}

/// Tracked allocator with optional byte budget and fail-on-leak mode
#[derive(Debug)]
pub struct GuardedAllocator {
    blocks: DashMap<u64, BlockInfo>,
    next_handle: AtomicU64,
    in_use: AtomicUsize,
    peak: AtomicUsize,
    limit: Option<usize>,
    fail_on_leak: AtomicBool,
}

impl GuardedAllocator {
    /// Unlimited ledger
    pub fn new() -> Self {
        Self {
            blocks: DashMap::new(),
            next_handle: AtomicU64::new(1),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            limit: None,
            fail_on_leak: AtomicBool::new(false),
        }
    }

    /// Ledger that refuses to grow past `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        let mut alloc = Self::new();
        alloc.limit = Some(limit);
        alloc
    }

    /// Make [`finish`](Self::finish) fail when blocks remain
    pub fn fail_on_leak(self, enabled: bool) -> Self {
        self.fail_on_leak.store(enabled, Ordering::Relaxed);
        self
    }

    pub fn set_fail_on_leak(&self, enabled: bool) {
        self.fail_on_leak.store(enabled, Ordering::Relaxed);
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently allocated
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest `in_use` value observed since creation or the last reset
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    pub fn reset_peak(&self) {
        self.peak.store(self.in_use(), Ordering::Release);
    }

    /// Number of live blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Group every live block by name
    pub fn leak_report(&self) -> LeakReport {
        let mut grouped: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
        for entry in self.blocks.iter() {
            let slot = grouped.entry(entry.value().name).or_insert((0, 0));
            slot.0 += 1;
            slot.1 += entry.value().size;
        }

        LeakReport {
            entries: grouped
                .into_iter()
                .map(|(name, (blocks, bytes))| LeakEntry {
                    name,
                    blocks,
                    bytes,
                })
                .collect(),
        }
    }

    /// End-of-run check
    ///
    /// Returns the leak report; in fail-on-leak mode a non-empty report turns
    /// into [`AllocError::Leaked`].
    pub fn finish(&self) -> Result<LeakReport> {
        let report = self.leak_report();
        if report.is_empty() {
            return Ok(report);
        }

        warn!(
            blocks = report.total_blocks(),
            bytes = report.total_bytes(),
            "unfreed tagged blocks:\n{}",
            report
        );
        if self.fail_on_leak.load(Ordering::Relaxed) {
            return Err(AllocError::Leaked {
                blocks: report.total_blocks(),
                bytes: report.total_bytes(),
            });
        }
        Ok(report)
    }

    fn reserve(&self, size: usize) -> Result<usize> {
        let limit = self.limit;
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(size)?;
                match limit {
                    Some(max) if next > max => None,
                    _ => Some(next),
                }
            })
            .map(|previous| previous + size)
            .map_err(|current| AllocError::OutOfMemory {
                requested: size,
                in_use: current,
                limit: limit.unwrap_or(usize::MAX),
            })
    }
}

impl Default for GuardedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTagService for GuardedAllocator {
    fn allocate_tagged(&self, size: usize, name: &'static str) -> Result<BlockHandle> {
        let now_in_use = match self.reserve(size) {
            Ok(total) => total,
            Err(err) => {
                error!(size, name, "{}", err);
                return Err(err);
            }
        };
        self.peak.fetch_max(now_in_use, Ordering::AcqRel);

        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.blocks.insert(raw, BlockInfo { size, name });
        Ok(BlockHandle::new(raw))
    }

    fn free(&self, handle: BlockHandle) {
        match self.blocks.remove(&handle.raw()) {
            Some((_, info)) => {
                self.in_use.fetch_sub(info.size, Ordering::AcqRel);
            }
            None => {
                error!(handle = handle.raw(), "free of unknown or already freed block");
            }
        }
    }
}

impl Drop for GuardedAllocator {
    fn drop(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        let report = self.leak_report();
        error!(
            blocks = report.total_blocks(),
            bytes = report.total_bytes(),
            "allocator dropped with live blocks:\n{}",
            report
        );
        debug!("peak memory: {} bytes", self.peak());
    }
}
