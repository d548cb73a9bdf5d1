mod builder;
mod object;
mod scene;

pub use builder::RelationBuilder;
