//! Tagged memory ledger for the dependency graph
//!
//! Every node, component, operation and relation the graph creates is
//! registered here under a stable name. Leaks are reported per name; in
//! fail-on-leak mode they turn into an error for CI runs.
//!
//! ## Usage
//!
//! ```rust
//! use depsgraph_alloc::{GuardedAllocator, MemoryTagService};
//!
//! let alloc = GuardedAllocator::with_limit(1 << 20).fail_on_leak(true);
//! let block = alloc.allocate_tagged(64, "depsgraph id node").unwrap();
//! alloc.free(block);
//! assert!(alloc.finish().is_ok());
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::{BlockHandle, LeakEntry, LeakReport, MemoryTagService};
pub use error::{AllocError, Result};
pub use infrastructure::GuardedAllocator;
