//! Node registry domain: node kinds, keys and relations

pub mod keys;
pub mod nodes;
pub mod relation;

pub use keys::*;
pub use nodes::*;
pub use relation::*;
