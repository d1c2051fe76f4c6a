use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{
    conflicting_keys, ItemGroup, MemoryError, MemoryGroup, MemoryItem, MemoryProperty,
    MemoryResult,
};

/// Ordered, key-disjoint layers of memory groups, bottom first.
///
/// A layer is admitted only if none of its keys is already on the stack, so a key
/// resolves to exactly one layer. Insertions go to the topmost writable layer.
#[derive(Debug, Default)]
pub struct MemoryStack {
    layers: RwLock<Vec<Arc<dyn MemoryGroup>>>,
}

impl MemoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_checked(&self, layer: Arc<dyn MemoryGroup>) -> MemoryResult<()> {
        let mut layers = self.layers.write();
        let conflicts = conflicting_keys(&layers, &*layer);
        if !conflicts.is_empty() {
            return Err(MemoryError::LayerConflict { keys: conflicts });
        }
        layers.push(layer);
        debug!(depth = layers.len(), "Pushed memory layer");
        Ok(())
    }

    /// Pushes `layer` if its keys are disjoint from the stack's; the stack is unchanged otherwise.
    pub fn push(&self, layer: Arc<dyn MemoryGroup>) -> bool {
        match self.push_checked(layer) {
            Ok(()) => true,
            Err(e) => {
                warn!("Rejected memory layer: {}", e);
                false
            }
        }
    }

    /// Pushes an empty, insertable layer and returns it.
    pub fn push_empty(&self) -> Arc<ItemGroup> {
        let layer = Arc::new(ItemGroup::new());
        self.layers.write().push(layer.clone());
        layer
    }

    pub fn pop(&self) -> Option<Arc<dyn MemoryGroup>> {
        self.layers.write().pop()
    }

    pub fn depth(&self) -> usize {
        self.layers.read().len()
    }

    pub fn layers(&self) -> Vec<Arc<dyn MemoryGroup>> {
        self.layers.read().clone()
    }

    pub fn writable_layer(&self) -> Option<Arc<dyn MemoryGroup>> {
        self.layers
            .read()
            .iter()
            .rev()
            .find(|layer| layer.is_writable())
            .cloned()
    }
}

impl MemoryGroup for MemoryStack {
    fn get(&self, key: &str) -> Option<Arc<MemoryItem>> {
        self.layers().iter().rev().find_map(|layer| layer.get(key))
    }

    fn keys(&self) -> Vec<MemoryProperty> {
        self.layers().iter().flat_map(|layer| layer.keys()).collect()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.layers().iter().any(|layer| layer.contains_key(key))
    }

    fn is_writable(&self) -> bool {
        self.writable_layer().is_some()
    }

    fn add(&self, item: Arc<MemoryItem>) -> MemoryResult<bool> {
        if self.contains_key(item.key()) {
            return Ok(false);
        }
        self.writable_layer()
            .ok_or(MemoryError::ReadOnlyGroup)?
            .add(item)
    }
}
