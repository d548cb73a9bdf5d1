pub mod context;
pub mod stats;

pub use context::BuildContext;
pub use stats::{BuildStats, BuildStep};
