//! Error types for depsgraph-alloc

use thiserror::Error;

/// Allocation ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The configured byte budget would be exceeded
    #[error("Out of memory: requested {requested} bytes with {in_use} in use (limit {limit})")]
    OutOfMemory {
        requested: usize,
        in_use: usize,
        limit: usize,
    },

    /// Blocks were still allocated when the ledger was finished in fail-on-leak mode
    #[error("Memory leak detected: {blocks} blocks, {bytes} bytes not freed")]
    Leaked { blocks: usize, bytes: usize },
}

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, AllocError>;
