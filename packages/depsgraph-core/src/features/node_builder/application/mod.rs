mod builder;
mod datablocks;
mod object;
mod scene;

pub use builder::NodeBuilder;
