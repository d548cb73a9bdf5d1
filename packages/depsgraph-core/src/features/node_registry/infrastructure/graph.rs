//! Graph container: owns every node and relation of one dependency graph
//!
//! Lookup-or-create for ID, component and operation nodes keyed by entity
//! handle and node keys. Every node and relation is registered with the
//! memory tag service and released again on [`Graph::clear_all_nodes`] or drop.

use ahash::AHashMap;
use std::mem::size_of;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::features::node_registry::domain::{
    alloc_tags, ComponentId, ComponentKey, ComponentNode, EvalCallback, IdNode, IdNodeId,
    OperationFlags, OperationId, OperationKey, OperationNode, PersistentOperationKey, Relation,
    RelationFlags, RelationId, RelationSource, TimeSource,
};
use crate::shared::models::{EntityId, EvaluationMode, IdType, NodeType};
use depsgraph_alloc::{BlockHandle, MemoryTagService};

/// Where an update tag came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    UserEdit,
    Time,
    Relations,
}

pub struct Graph {
    mode: EvaluationMode,
    alloc: Arc<dyn MemoryTagService>,
    id_nodes: Vec<IdNode>,
    id_hash: AHashMap<EntityId, IdNodeId>,
    operations: Vec<OperationNode>,
    relations: Vec<Relation>,
    time_source: Option<TimeSource>,
    entry_tags: Vec<OperationId>,
}

impl Graph {
    pub fn new(mode: EvaluationMode, alloc: Arc<dyn MemoryTagService>) -> Self {
        Self {
            mode,
            alloc,
            id_nodes: Vec::new(),
            id_hash: AHashMap::new(),
            operations: Vec::new(),
            relations: Vec::new(),
            time_source: None,
            entry_tags: Vec::new(),
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn allocator(&self) -> &Arc<dyn MemoryTagService> {
        &self.alloc
    }

    fn allocate<T>(&self, name: &'static str) -> Result<BlockHandle> {
        Ok(self.alloc.allocate_tagged(size_of::<T>(), name)?)
    }

    // ============================================================
    // ID nodes
    // ============================================================

    /// Existing node for `entity`, or a new one in `Indirectly` state
    pub fn add_id_node(&mut self, entity: EntityId, id_type: IdType, name: &str) -> Result<IdNodeId> {
        if let Some(&existing) = self.id_hash.get(&entity) {
            return Ok(existing);
        }
        let block = self.allocate::<IdNode>(alloc_tags::ID_NODE)?;
        let id = IdNodeId(self.id_nodes.len() as u32);
        self.id_nodes
            .push(IdNode::new(entity, id_type, name.to_string(), block));
        self.id_hash.insert(entity, id);
        Ok(id)
    }

    pub fn find_id_node(&self, entity: EntityId) -> Option<IdNodeId> {
        self.id_hash.get(&entity).copied()
    }

    pub fn id_node(&self, id: IdNodeId) -> &IdNode {
        &self.id_nodes[id.index()]
    }

    pub fn id_node_mut(&mut self, id: IdNodeId) -> &mut IdNode {
        &mut self.id_nodes[id.index()]
    }

    pub fn id_node_for(&self, entity: EntityId) -> Option<&IdNode> {
        self.find_id_node(entity).map(|id| self.id_node(id))
    }

    /// ID nodes in creation order
    pub fn id_nodes(&self) -> &[IdNode] {
        &self.id_nodes
    }

    // ============================================================
    // Time source
    // ============================================================

    /// The shared time source; created on first call
    pub fn add_time_source(&mut self) -> Result<()> {
        if self.time_source.is_none() {
            let block = self.allocate::<TimeSource>(alloc_tags::TIME_SOURCE)?;
            self.time_source = Some(TimeSource {
                tagged_for_update: false,
                outlinks: Vec::new(),
                block,
            });
        }
        Ok(())
    }

    pub fn time_source(&self) -> Option<&TimeSource> {
        self.time_source.as_ref()
    }

    pub fn time_source_mut(&mut self) -> Option<&mut TimeSource> {
        self.time_source.as_mut()
    }

    // ============================================================
    // Components
    // ============================================================

    /// Existing component of `id_node` with this type and name, or a new one
    pub fn add_component_node(
        &mut self,
        id_node: IdNodeId,
        node_type: NodeType,
        name: &str,
    ) -> Result<ComponentId> {
        if let Some(slot) = self.id_node(id_node).component_slot(node_type, name) {
            return Ok(ComponentId { id_node, slot });
        }
        let block = self.allocate::<ComponentNode>(alloc_tags::COMPONENT_NODE)?;
        let node = self.id_node_mut(id_node);
        let id = ComponentId {
            id_node,
            slot: node.components.len() as u32,
        };
        node.components.push(ComponentNode::new(
            ComponentKey::named(node_type, name),
            id,
            block,
        ));
        Ok(id)
    }

    pub fn find_component(
        &self,
        id_node: IdNodeId,
        node_type: NodeType,
        name: &str,
    ) -> Option<ComponentId> {
        self.id_node(id_node)
            .component_slot(node_type, name)
            .map(|slot| ComponentId { id_node, slot })
    }

    pub fn component(&self, id: ComponentId) -> &ComponentNode {
        &self.id_node(id.id_node).components[id.slot as usize]
    }

    fn component_mut(&mut self, id: ComponentId) -> &mut ComponentNode {
        &mut self.id_node_mut(id.id_node).components[id.slot as usize]
    }

    // ============================================================
    // Operations
    // ============================================================

    /// Existing operation with `key` in `component`, or a new one
    ///
    /// `payload` is attached only when the operation is created; it never
    /// replaces the payload of an existing operation.
    pub fn add_operation_node(
        &mut self,
        component: ComponentId,
        key: OperationKey,
        payload: Option<EvalCallback>,
    ) -> Result<OperationId> {
        if let Some(existing) = self.component(component).find_operation(&key) {
            if payload.is_some() {
                debug!(operation = %key, "operation already exists, keeping its payload");
            }
            return Ok(existing);
        }

        let block = self.allocate::<OperationNode>(alloc_tags::OPERATION_NODE)?;
        let id = OperationId(self.operations.len() as u32);
        let (entity, component_type) = {
            let owner = self.id_node(component.id_node);
            (owner.entity, self.component(component).node_type())
        };
        self.operations.push(OperationNode {
            key: key.clone(),
            owner: component,
            entity,
            component_type,
            payload,
            flags: OperationFlags::NONE,
            inlinks: Vec::new(),
            outlinks: Vec::new(),
            block,
        });

        let comp = self.component_mut(component);
        comp.operations.push(id);
        comp.operations_map.insert(key, id);
        Ok(id)
    }

    pub fn find_operation(&self, component: ComponentId, key: &OperationKey) -> Option<OperationId> {
        self.component(component).find_operation(key)
    }

    /// Lookup by entity, component and operation key
    pub fn find_operation_node(
        &self,
        entity: EntityId,
        node_type: NodeType,
        component_name: &str,
        key: &OperationKey,
    ) -> Option<OperationId> {
        let id_node = self.find_id_node(entity)?;
        let component = self.find_component(id_node, node_type, component_name)?;
        self.find_operation(component, key)
    }

    pub fn has_operation_node(
        &self,
        entity: EntityId,
        node_type: NodeType,
        component_name: &str,
        key: &OperationKey,
    ) -> bool {
        self.find_operation_node(entity, node_type, component_name, key)
            .is_some()
    }

    /// Find-or-create an operation without payload under an existing ID node
    pub fn ensure_operation_node(
        &mut self,
        id_node: IdNodeId,
        node_type: NodeType,
        component_name: &str,
        key: OperationKey,
    ) -> Result<OperationId> {
        let component = self.add_component_node(id_node, node_type, component_name)?;
        self.add_operation_node(component, key, None)
    }

    pub fn operation(&self, id: OperationId) -> &OperationNode {
        &self.operations[id.index()]
    }

    pub fn operation_mut(&mut self, id: OperationId) -> &mut OperationNode {
        &mut self.operations[id.index()]
    }

    /// Operations in creation order
    pub fn operations(&self) -> &[OperationNode] {
        &self.operations
    }

    pub fn operation_ids(&self) -> impl Iterator<Item = OperationId> + '_ {
        (0..self.operations.len() as u32).map(OperationId)
    }

    /// Mark `op` as the explicit entry of its component
    pub fn set_entry_operation(&mut self, op: OperationId) {
        let owner = self.operation(op).owner;
        let comp = self.component_mut(owner);
        debug_assert!(
            comp.entry_operation.map_or(true, |current| current == op),
            "component {:?} already has a different entry operation",
            comp.key
        );
        comp.entry_operation = Some(op);
    }

    /// Mark `op` as the explicit exit of its component
    pub fn set_exit_operation(&mut self, op: OperationId) {
        let owner = self.operation(op).owner;
        let comp = self.component_mut(owner);
        debug_assert!(
            comp.exit_operation.map_or(true, |current| current == op),
            "component {:?} already has a different exit operation",
            comp.key
        );
        comp.exit_operation = Some(op);
    }

    pub fn persistent_key(&self, op: OperationId) -> PersistentOperationKey {
        let node = self.operation(op);
        PersistentOperationKey {
            entity: node.entity,
            component: self.component(node.owner).key.clone(),
            operation: node.key.clone(),
        }
    }

    /// `entity/component/operation`, for logs and dumps
    pub fn operation_label(&self, op: OperationId) -> String {
        let node = self.operation(op);
        let component = self.component(node.owner);
        let owner = &self.id_node(node.owner.id_node).name;
        if component.key.name.is_empty() {
            format!("{}/{}/{}", owner, component.key.node_type, node.key)
        } else {
            format!(
                "{}/{}[{}]/{}",
                owner, component.key.node_type, component.key.name, node.key
            )
        }
    }

    pub fn find_persistent(&self, key: &PersistentOperationKey) -> Option<OperationId> {
        self.find_operation_node(
            key.entity,
            key.component.node_type,
            &key.component.name,
            &key.operation,
        )
    }

    // ============================================================
    // Relations
    // ============================================================

    /// Add `from -> to`
    ///
    /// With [`RelationFlags::CHECK_BEFORE_ADD`] an existing relation with the
    /// same endpoints and name is returned instead of adding a duplicate.
    pub fn add_relation(
        &mut self,
        from: RelationSource,
        to: OperationId,
        name: &str,
        flags: RelationFlags,
    ) -> Result<RelationId> {
        if flags.contains(RelationFlags::CHECK_BEFORE_ADD) {
            if let Some(existing) = self.find_relation(from, to, name) {
                return Ok(existing);
            }
        }

        let block = self.allocate::<Relation>(alloc_tags::RELATION)?;
        let id = RelationId(self.relations.len() as u32);
        self.relations.push(Relation {
            from,
            to,
            name: name.to_string(),
            flags,
            block,
        });

        match from {
            RelationSource::TimeSource => match self.time_source.as_mut() {
                Some(time) => time.outlinks.push(id),
                None => warn!(relation = name, "relation from missing time source"),
            },
            RelationSource::Operation(op) => self.operation_mut(op).outlinks.push(id),
        }
        self.operation_mut(to).inlinks.push(id);
        Ok(id)
    }

    pub fn find_relation(&self, from: RelationSource, to: OperationId, name: &str) -> Option<RelationId> {
        self.operation(to)
            .inlinks
            .iter()
            .copied()
            .find(|rel| {
                let rel = self.relation(*rel);
                rel.from == from && rel.name == name
            })
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relations[id.index()]
    }

    pub fn relation_mut(&mut self, id: RelationId) -> &mut Relation {
        &mut self.relations[id.index()]
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    // ============================================================
    // Update tags
    // ============================================================

    /// Tag `op` for update; the first tag makes it an entry point of the flush
    pub fn tag_operation_update(&mut self, op: OperationId, source: UpdateSource) {
        let node = self.operation_mut(op);
        let was_tagged = node.flags.contains(OperationFlags::NEEDS_UPDATE);
        node.flags
            .insert(OperationFlags::NEEDS_UPDATE | OperationFlags::DIRECTLY_MODIFIED);
        if source == UpdateSource::UserEdit {
            node.flags.insert(OperationFlags::USER_MODIFIED);
        }
        if !was_tagged {
            self.entry_tags.push(op);
        }
    }

    pub fn entry_tags(&self) -> &[OperationId] {
        &self.entry_tags
    }

    pub fn clear_entry_tags(&mut self) {
        self.entry_tags.clear();
        if let Some(time) = self.time_source.as_mut() {
            time.tagged_for_update = false;
        }
    }

    // ============================================================
    // Teardown
    // ============================================================

    /// Drop every node and relation and release their blocks
    pub fn clear_all_nodes(&mut self) {
        for relation in self.relations.drain(..) {
            self.alloc.free(relation.block);
        }
        for op in self.operations.drain(..) {
            self.alloc.free(op.block);
        }
        for id_node in self.id_nodes.drain(..) {
            for comp in &id_node.components {
                self.alloc.free(comp.block);
            }
            self.alloc.free(id_node.block);
        }
        if let Some(time) = self.time_source.take() {
            self.alloc.free(time.block);
        }
        self.id_hash.clear();
        self.entry_tags.clear();
    }

    /// Drop every relation, keeping nodes; used before relations are rebuilt
    pub fn clear_relations(&mut self) {
        for relation in self.relations.drain(..) {
            self.alloc.free(relation.block);
        }
        for op in &mut self.operations {
            op.inlinks.clear();
            op.outlinks.clear();
        }
        if let Some(time) = self.time_source.as_mut() {
            time.outlinks.clear();
        }
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        self.clear_all_nodes();
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("mode", &self.mode)
            .field("id_nodes", &self.id_nodes.len())
            .field("operations", &self.operations.len())
            .field("relations", &self.relations.len())
            .field("has_time_source", &self.time_source.is_some())
            .finish()
    }
}
