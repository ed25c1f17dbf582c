use crate::internal::transfer::node::DataNodeRef;
use crate::{Map, NodeId};
use parking_lot::RwLock;

/// Handles of peer nodes, looked up by id during delegation.
#[derive(Default)]
pub struct NodeDirectory {
    nodes: RwLock<Map<NodeId, DataNodeRef>>,
}

impl NodeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node: DataNodeRef) {
        let node_id = node.id();
        log::debug!("Node {} registered as {node_id}", node.name());
        if self.nodes.write().insert(node_id, node).is_some() {
            log::warn!("Node {node_id} was already registered; handle replaced");
        }
    }

    pub fn get(&self, node_id: NodeId) -> Option<DataNodeRef> {
        self.nodes.read().get(&node_id).cloned()
    }

    pub fn remove(&self, node_id: NodeId) -> Option<DataNodeRef> {
        self.nodes.write().remove(&node_id)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.read().contains_key(&node_id)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
