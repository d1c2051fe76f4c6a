//! Db Memory Model
//!
//! Typed, flagged storage locations and the ways they are composed:
//!
//! - [`MemoryProperty`]: `(key, type, flags)` naming one location.
//! - [`MemoryItem`]: one cell holding at most one [`Object`](crate::object::Object).
//! - [`MemoryGroup`]: keyed collection of items; [`ItemGroup`] is the plain one.
//! - [`LinkedMemoryGroup`] / [`WritableLinkedMemoryGroup`]: several groups seen as one.
//! - [`MemoryStack`]: key-disjoint layers forming one resolution scope.
//! - [`MemoryPathExt`]: dot-delimited path access through objects' public groups.
//!
//! Inside groups and stacks an item is found by key alone. A stack never admits a
//! layer sharing a key with any existing layer, so a key resolves to at most one item.

mod error;
mod group;
mod item;
mod linked;
mod path;
mod property;
mod stack;

use std::collections::HashSet;
use std::sync::Arc;

pub use error::{MemoryError, MemoryResult};
pub use group::{ItemGroup, MemoryGroup};
pub use item::MemoryItem;
pub use linked::{LinkedMemoryGroup, WritableLinkedMemoryGroup};
pub use path::MemoryPathExt;
pub use property::{MemoryProperty, PropertyFlags};
pub use stack::MemoryStack;

/// Stack key holding a thread's returned value. No property, input or ambient
/// item may use it.
pub const RETURN_KEY: &str = "return";

/// Keys of `candidate` already present in any of `existing`, sorted.
pub fn conflicting_keys(
    existing: &[Arc<dyn MemoryGroup>],
    candidate: &dyn MemoryGroup,
) -> Vec<String> {
    let taken: HashSet<String> = existing.iter().flat_map(|g| g.key_names()).collect();
    let mut conflicts: Vec<String> = candidate
        .key_names()
        .into_iter()
        .filter(|k| taken.contains(k))
        .collect();
    conflicts.sort();
    conflicts.dedup();
    conflicts
}

/// True if no key appears in more than one of `groups`.
pub fn can_link(groups: &[Arc<dyn MemoryGroup>]) -> bool {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flat_map(|g| g.key_names())
        .all(|key| seen.insert(key))
}
