//! Update tagging
//!
//! Tags land on operations as `NEEDS_UPDATE | DIRECTLY_MODIFIED` and are
//! recorded as entry tags; the evaluator flushes them along relations.

pub mod recalc;
pub mod tag;

pub use recalc::Recalc;
pub use tag::{tag_id, tag_operation, tag_time_source};
