//! ID, component, operation and time-source nodes

use ahash::AHashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use super::keys::{ComponentId, ComponentKey, IdNodeId, OperationId, OperationKey, RelationId};
use crate::shared::models::{EntityId, IdType, LinkedState, NodeType};
use depsgraph_alloc::BlockHandle;

/// Memory tag names used for every graph allocation
pub mod alloc_tags {
    pub const ID_NODE: &str = "depsgraph id node";
    pub const COMPONENT_NODE: &str = "depsgraph component node";
    pub const OPERATION_NODE: &str = "depsgraph operation node";
    pub const RELATION: &str = "depsgraph relation";
    pub const TIME_SOURCE: &str = "depsgraph time source";
}

// ============================================================
// ID node
// ============================================================

/// One entity in the graph
#[derive(Debug)]
pub struct IdNode {
    pub entity: EntityId,
    pub id_type: IdType,
    pub name: String,
    linked_state: LinkedState,
    pub is_directly_visible: bool,
    /// Reached through a view layer base
    pub has_base: bool,
    /// Collection objects and children were visited, not only the collection
    pub is_collection_fully_expanded: bool,
    /// Set by update flush when a user edit reached this entity
    pub is_user_modified: bool,
    pub(crate) components: Vec<ComponentNode>,
    pub(crate) block: BlockHandle,
}

impl IdNode {
    pub(crate) fn new(entity: EntityId, id_type: IdType, name: String, block: BlockHandle) -> Self {
        Self {
            entity,
            id_type,
            name,
            linked_state: LinkedState::Indirectly,
            is_directly_visible: false,
            has_base: false,
            is_collection_fully_expanded: false,
            is_user_modified: false,
            components: Vec::new(),
            block,
        }
    }

    pub fn linked_state(&self) -> LinkedState {
        self.linked_state
    }

    /// Raise the linked state; a weaker state is ignored
    pub fn upgrade_linked_state(&mut self, state: LinkedState) {
        self.linked_state = self.linked_state.upgrade(state);
    }

    pub fn components(&self) -> &[ComponentNode] {
        &self.components
    }

    pub fn find_component(&self, node_type: NodeType, name: &str) -> Option<&ComponentNode> {
        self.components
            .iter()
            .find(|c| c.key.node_type == node_type && c.key.name == name)
    }

    pub(crate) fn component_slot(&self, node_type: NodeType, name: &str) -> Option<u32> {
        self.components
            .iter()
            .position(|c| c.key.node_type == node_type && c.key.name == name)
            .map(|slot| slot as u32)
    }
}

// ============================================================
// Component node
// ============================================================

/// One coherent aspect of an entity's evaluation
#[derive(Debug)]
pub struct ComponentNode {
    pub key: ComponentKey,
    pub(crate) id: ComponentId,
    pub(crate) operations: Vec<OperationId>,
    pub(crate) operations_map: AHashMap<OperationKey, OperationId>,
    pub(crate) entry_operation: Option<OperationId>,
    pub(crate) exit_operation: Option<OperationId>,
    pub(crate) block: BlockHandle,
}

impl ComponentNode {
    pub(crate) fn new(key: ComponentKey, id: ComponentId, block: BlockHandle) -> Self {
        Self {
            key,
            id,
            operations: Vec::new(),
            operations_map: AHashMap::new(),
            entry_operation: None,
            exit_operation: None,
            block,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.key.node_type
    }

    pub fn owner(&self) -> IdNodeId {
        self.id.id_node
    }

    /// Operations in creation order
    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    pub fn find_operation(&self, key: &OperationKey) -> Option<OperationId> {
        self.operations_map.get(key).copied()
    }

    /// Explicit entry, or the only operation of a single-operation component
    pub fn entry_operation(&self) -> Option<OperationId> {
        self.entry_operation.or_else(|| self.single_operation())
    }

    /// Explicit exit, or the only operation of a single-operation component
    pub fn exit_operation(&self) -> Option<OperationId> {
        self.exit_operation.or_else(|| self.single_operation())
    }

    pub fn has_explicit_entry(&self) -> bool {
        self.entry_operation.is_some()
    }

    pub fn has_explicit_exit(&self) -> bool {
        self.exit_operation.is_some()
    }

    fn single_operation(&self) -> Option<OperationId> {
        match self.operations.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

// ============================================================
// Operation node
// ============================================================

/// Passed to operation payloads during evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub frame: f32,
    pub entity: EntityId,
    pub operation: OperationId,
}

/// Type-erased work attached to an operation
pub type EvalCallback = Arc<dyn Fn(&EvalContext) + Send + Sync>;

/// Operation state bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OperationFlags(u32);

impl OperationFlags {
    pub const NONE: OperationFlags = OperationFlags(0);
    /// Needs evaluation in the next update
    pub const NEEDS_UPDATE: OperationFlags = OperationFlags(1 << 0);
    /// Tagged explicitly, not only reached by flush
    pub const DIRECTLY_MODIFIED: OperationFlags = OperationFlags(1 << 1);
    /// Tag came from a user edit
    pub const USER_MODIFIED: OperationFlags = OperationFlags(1 << 2);
    /// Kept even if nothing depends on it
    pub const PINNED: OperationFlags = OperationFlags(1 << 3);

    /// Bits propagated along relations during flush
    pub const FLUSH: OperationFlags = OperationFlags(1 << 2);

    #[inline]
    pub fn contains(&self, other: OperationFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: OperationFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: OperationFlags) {
        self.0 &= !other.0;
    }

    #[inline]
    pub fn intersection(&self, other: OperationFlags) -> OperationFlags {
        OperationFlags(self.0 & other.0)
    }
}

impl BitOr for OperationFlags {
    type Output = OperationFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        OperationFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for OperationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Smallest evaluable unit
pub struct OperationNode {
    pub key: OperationKey,
    pub(crate) owner: ComponentId,
    pub(crate) entity: EntityId,
    pub(crate) component_type: NodeType,
    pub(crate) payload: Option<EvalCallback>,
    pub flags: OperationFlags,
    pub(crate) inlinks: Vec<RelationId>,
    pub(crate) outlinks: Vec<RelationId>,
    pub(crate) block: BlockHandle,
}

impl OperationNode {
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn component_type(&self) -> NodeType {
        self.component_type
    }

    pub fn payload(&self) -> Option<&EvalCallback> {
        self.payload.as_ref()
    }

    pub fn inlinks(&self) -> &[RelationId] {
        &self.inlinks
    }

    pub fn outlinks(&self) -> &[RelationId] {
        &self.outlinks
    }

    pub fn needs_update(&self) -> bool {
        self.flags.contains(OperationFlags::NEEDS_UPDATE)
    }

    pub fn is_pinned(&self) -> bool {
        self.flags.contains(OperationFlags::PINNED)
    }
}

impl fmt::Debug for OperationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationNode")
            .field("key", &self.key)
            .field("entity", &self.entity)
            .field("component_type", &self.component_type)
            .field("has_payload", &self.payload.is_some())
            .field("flags", &self.flags)
            .field("inlinks", &self.inlinks.len())
            .field("outlinks", &self.outlinks.len())
            .finish()
    }
}

// ============================================================
// Time source
// ============================================================

/// The single frame-change source shared by the whole graph
#[derive(Debug)]
pub struct TimeSource {
    pub tagged_for_update: bool,
    pub(crate) outlinks: Vec<RelationId>,
    pub(crate) block: BlockHandle,
}

impl TimeSource {
    pub fn outlinks(&self) -> &[RelationId] {
        &self.outlinks
    }
}
