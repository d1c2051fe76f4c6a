use parking_lot::RwLock;

use super::MemoryProperty;
use crate::object::Object;

/// One storage cell bound to a [`MemoryProperty`].
#[derive(Debug)]
pub struct MemoryItem {
    property: MemoryProperty,
    value: RwLock<Option<Object>>,
}

impl MemoryItem {
    pub fn new(property: MemoryProperty) -> Self {
        Self {
            property,
            value: RwLock::new(None),
        }
    }

    pub fn property(&self) -> &MemoryProperty {
        &self.property
    }

    pub fn key(&self) -> &str {
        self.property.key()
    }

    pub fn value(&self) -> Option<Object> {
        self.value.read().clone()
    }

    pub fn has_value(&self) -> bool {
        self.value.read().is_some()
    }

    /// Stores `value` if its type satisfies the property's type; returns false and
    /// leaves the cell untouched otherwise. Flags are enforced by the owning group.
    pub fn set(&self, value: Object) -> bool {
        if !value.is(self.property.type_ref()) {
            return false;
        }
        *self.value.write() = Some(value);
        true
    }

    pub fn clear(&self) {
        *self.value.write() = None;
    }
}
