//! Builder map feature: the dedup cache guarding every expansion step

pub mod map;
pub mod tags;

pub use map::BuilderMap;
pub use tags::BuildTags;
