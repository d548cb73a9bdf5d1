//! Flush and evaluation
//!
//! Entry tags are flushed along relations, then due operations run their
//! payloads in schedule order and all update bits are cleared.

pub mod evaluator;
pub mod flush;

pub use evaluator::{EvalStats, Evaluator};
pub use flush::{clear_update_flags, flush_updates, FlushStats};
