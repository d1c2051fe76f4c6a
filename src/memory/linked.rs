use std::sync::Arc;

use super::{can_link, MemoryError, MemoryGroup, MemoryItem, MemoryProperty, MemoryResult};

/// Several groups viewed as one namespace. Lookups take the first group holding the key.
#[derive(Debug, Clone, Default)]
pub struct LinkedMemoryGroup {
    groups: Vec<Arc<dyn MemoryGroup>>,
}

impl LinkedMemoryGroup {
    pub fn new(groups: Vec<Arc<dyn MemoryGroup>>) -> Self {
        Self { groups }
    }

    /// Links `groups`, failing if any key appears in more than one of them.
    pub fn checked(groups: Vec<Arc<dyn MemoryGroup>>) -> MemoryResult<Self> {
        if !can_link(&groups) {
            let mut keys: Vec<String> = groups.iter().flat_map(|g| g.key_names()).collect();
            keys.sort();
            let mut duplicates: Vec<String> = keys
                .windows(2)
                .filter(|w| w[0] == w[1])
                .map(|w| w[0].clone())
                .collect();
            duplicates.dedup();
            return Err(MemoryError::LayerConflict { keys: duplicates });
        }
        Ok(Self::new(groups))
    }

    pub fn groups(&self) -> &[Arc<dyn MemoryGroup>] {
        &self.groups
    }
}

impl MemoryGroup for LinkedMemoryGroup {
    fn get(&self, key: &str) -> Option<Arc<MemoryItem>> {
        self.groups.iter().find_map(|g| g.get(key))
    }

    fn keys(&self) -> Vec<MemoryProperty> {
        self.groups.iter().flat_map(|g| g.keys()).collect()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.groups.iter().any(|g| g.contains_key(key))
    }
}

/// Linked group with one constituent designated as the insertion target.
#[derive(Debug, Clone)]
pub struct WritableLinkedMemoryGroup {
    linked: LinkedMemoryGroup,
    write_group: Arc<dyn MemoryGroup>,
}

impl WritableLinkedMemoryGroup {
    /// `write_group` is linked after `groups` and must accept insertions.
    pub fn new(
        groups: Vec<Arc<dyn MemoryGroup>>,
        write_group: Arc<dyn MemoryGroup>,
    ) -> MemoryResult<Self> {
        if !write_group.is_writable() {
            return Err(MemoryError::ReadOnlyGroup);
        }
        let mut all = groups;
        all.push(write_group.clone());
        Ok(Self {
            linked: LinkedMemoryGroup::new(all),
            write_group,
        })
    }

    pub fn write_group(&self) -> &Arc<dyn MemoryGroup> {
        &self.write_group
    }
}

impl MemoryGroup for WritableLinkedMemoryGroup {
    fn get(&self, key: &str) -> Option<Arc<MemoryItem>> {
        self.linked.get(key)
    }

    fn keys(&self) -> Vec<MemoryProperty> {
        self.linked.keys()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.linked.contains_key(key)
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn add(&self, item: Arc<MemoryItem>) -> MemoryResult<bool> {
        if self.linked.contains_key(item.key()) {
            return Ok(false);
        }
        self.write_group.add(item)
    }
}
