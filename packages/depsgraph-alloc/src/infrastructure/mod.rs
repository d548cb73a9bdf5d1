//! Allocator implementations

pub mod guarded;

pub use guarded::GuardedAllocator;
