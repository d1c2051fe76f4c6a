use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{MemoryError, MemoryItem, MemoryProperty, MemoryResult};
use crate::object::Object;

/// Keyed collection of memory items.
///
/// `set` expects the key to exist: an absent key is [`MemoryError::KeyNotFound`], a
/// property without the writable flag is [`MemoryError::NotWritable`], and a value
/// whose type does not satisfy the property's type is `Ok(false)`.
pub trait MemoryGroup: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<Arc<MemoryItem>>;

    fn keys(&self) -> Vec<MemoryProperty>;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn key_names(&self) -> Vec<String> {
        self.keys().into_iter().map(|p| p.key().to_string()).collect()
    }

    fn set(&self, key: &str, value: Object) -> MemoryResult<bool> {
        let item = self.get(key).ok_or_else(|| MemoryError::KeyNotFound {
            key: key.to_string(),
        })?;
        if !item.property().is_writable() {
            return Err(MemoryError::NotWritable {
                key: key.to_string(),
            });
        }
        Ok(item.set(value))
    }

    /// Whether [`MemoryGroup::add`] can ever succeed on this group.
    fn is_writable(&self) -> bool {
        false
    }

    /// Inserts a new item. `Ok(false)` if the key already exists; never overwrites.
    fn add(&self, _item: Arc<MemoryItem>) -> MemoryResult<bool> {
        Err(MemoryError::ReadOnlyGroup)
    }
}

#[derive(Debug)]
pub struct ItemGroup {
    items: DashMap<String, Arc<MemoryItem>>,
    insertable: bool,
}

impl Default for ItemGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemGroup {
    /// Empty group that accepts insertions.
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            insertable: true,
        }
    }

    /// Group with one empty item per property and no further insertions.
    pub fn fixed(properties: impl IntoIterator<Item = MemoryProperty>) -> Self {
        Self::from_items(
            properties
                .into_iter()
                .map(|p| Arc::new(MemoryItem::new(p))),
            false,
        )
    }

    pub fn from_items(items: impl IntoIterator<Item = Arc<MemoryItem>>, insertable: bool) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.key().to_string(), item))
            .collect();
        Self { items, insertable }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl MemoryGroup for ItemGroup {
    fn get(&self, key: &str) -> Option<Arc<MemoryItem>> {
        self.items.get(key).map(|entry| entry.value().clone())
    }

    fn keys(&self) -> Vec<MemoryProperty> {
        self.items
            .iter()
            .map(|entry| entry.value().property().clone())
            .collect()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    fn is_writable(&self) -> bool {
        self.insertable
    }

    fn add(&self, item: Arc<MemoryItem>) -> MemoryResult<bool> {
        if !self.insertable {
            return Err(MemoryError::ReadOnlyGroup);
        }
        match self.items.entry(item.key().to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(item);
                Ok(true)
            }
        }
    }
}
