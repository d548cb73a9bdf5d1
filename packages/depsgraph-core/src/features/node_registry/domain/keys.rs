//! Node handles and identifying keys

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::models::{EntityId, NodeType, OpCode};

/// Handle of an [`IdNode`](super::IdNode) inside one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdNodeId(pub u32);

/// Handle of a component: owning ID node plus slot inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    pub id_node: IdNodeId,
    pub slot: u32,
}

/// Handle of an [`OperationNode`](super::OperationNode) inside one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u32);

/// Handle of a [`Relation`](super::Relation) inside one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(pub u32);

macro_rules! impl_index {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                #[inline]
                pub fn index(&self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

impl_index!(IdNodeId, OperationId, RelationId);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// Identifies a component within its ID node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentKey {
    pub node_type: NodeType,
    /// Empty for whole-ID components
    pub name: String,
}

impl ComponentKey {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            name: String::new(),
        }
    }

    pub fn named(node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            node_type,
            name: name.into(),
        }
    }
}

/// Identifies an operation within its component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub opcode: OpCode,
    pub name: String,
    /// Disambiguates operations sharing opcode and name (driver array index)
    pub name_tag: i32,
}

impl OperationKey {
    pub fn new(opcode: OpCode) -> Self {
        Self {
            opcode,
            name: String::new(),
            name_tag: -1,
        }
    }

    pub fn named(opcode: OpCode, name: impl Into<String>, name_tag: i32) -> Self {
        Self {
            opcode,
            name: name.into(),
            name_tag,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.opcode)
        } else if self.name_tag >= 0 {
            write!(f, "{}({}[{}])", self.opcode, self.name, self.name_tag)
        } else {
            write!(f, "{}({})", self.opcode, self.name)
        }
    }
}

/// Graph-independent address of an operation
///
/// Survives a full rebuild: after the nodes are recreated the same key finds
/// the new operation again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersistentOperationKey {
    pub entity: EntityId,
    pub component: ComponentKey,
    pub operation: OperationKey,
}
