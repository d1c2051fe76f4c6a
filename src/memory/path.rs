use std::sync::Arc;

use super::{MemoryError, MemoryGroup, MemoryItem, MemoryResult};
use crate::object::Object;

/// Dot-delimited path access over any memory group.
///
/// The first segment is looked up in the group itself; each later segment in the
/// public memory (public instance and static properties) of the object held by the
/// previous segment's item. Private state is never reachable past the first segment.
pub trait MemoryPathExt: MemoryGroup {
    fn resolve_path(&self, path: &str) -> MemoryResult<Arc<MemoryItem>> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(MemoryError::InvalidPath {
                path: path.to_string(),
            });
        }
        let (first, rest) = segments.split_first().ok_or_else(|| MemoryError::InvalidPath {
            path: path.to_string(),
        })?;

        let mut item = self.get(first).ok_or_else(|| MemoryError::KeyNotFound {
            key: first.to_string(),
        })?;
        for segment in rest {
            let holder = read_object(&item, path)?;
            item = holder.public_memory().get(segment).ok_or_else(|| MemoryError::KeyNotFound {
                key: segment.to_string(),
            })?;
        }
        Ok(item)
    }

    /// Value at `path`; `Ok(None)` if the final item is empty.
    fn read_path(&self, path: &str) -> MemoryResult<Option<Object>> {
        let item = self.resolve_path(path)?;
        if !item.property().is_readable() {
            return Err(MemoryError::NotReadable {
                key: item.key().to_string(),
            });
        }
        Ok(item.value())
    }

    fn get_path(&self, path: &str) -> Option<Object> {
        self.read_path(path).ok().flatten()
    }

    fn contains_path(&self, path: &str) -> bool {
        self.resolve_path(path).is_ok()
    }

    fn set_path(&self, path: &str, value: Object) -> MemoryResult<bool> {
        match path.rsplit_once('.') {
            None => self.set(path, value),
            Some((head, last)) => {
                let item = self.resolve_path(head)?;
                let holder = read_object(&item, path)?;
                holder.public_memory().set(last, value)
            }
        }
    }
}

impl<T: MemoryGroup + ?Sized> MemoryPathExt for T {}

fn read_object(item: &MemoryItem, path: &str) -> MemoryResult<Object> {
    if !item.property().is_readable() {
        return Err(MemoryError::NotReadable {
            key: item.key().to_string(),
        });
    }
    item.value().ok_or_else(|| MemoryError::NullReference {
        path: path.to_string(),
        segment: item.key().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;

    #[test]
    fn test_nested_get_and_set() {
        let fx = Fixture::new();
        let owner = fx.instance(fx.person);
        let pet = fx.instance(fx.dog);
        assert_eq!(owner.set("pet", pet.clone()), Ok(true));

        let memory = owner.memory();
        assert!(memory.contains_path("pet.name"));
        assert!(memory.get_path("pet.name").is_none());

        assert_eq!(memory.set_path("pet.name", fx.string_value("Rex")), Ok(true));
        let name = memory.get_path("pet.name").unwrap();
        assert_eq!(*name.get_bound::<String>().unwrap().unwrap(), "Rex");
        assert!(pet.get_path("name").is_some());
    }

    #[test]
    fn test_private_not_reachable_past_first_segment() {
        let fx = Fixture::new();
        let owner = fx.instance(fx.person);
        let friend = fx.instance(fx.person);
        owner.set("friend", friend).unwrap();

        let memory = owner.memory();
        assert!(memory.contains_path("secret"));
        assert!(!memory.contains_path("friend.secret"));
        assert_eq!(
            memory.set_path("friend.secret", fx.string_value("x")),
            Err(MemoryError::KeyNotFound {
                key: "secret".to_string()
            })
        );
    }

    #[test]
    fn test_null_reference() {
        let fx = Fixture::new();
        let owner = fx.instance(fx.person);
        assert_eq!(
            owner.memory().read_path("pet.name").unwrap_err(),
            MemoryError::NullReference {
                path: "pet.name".to_string(),
                segment: "pet".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_path() {
        let fx = Fixture::new();
        let owner = fx.instance(fx.person);
        assert!(matches!(
            owner.memory().resolve_path("pet..name"),
            Err(MemoryError::InvalidPath { .. })
        ));
        assert!(!owner.memory().contains_path(""));
    }

    #[test]
    fn test_unreadable_intermediate() {
        let fx = Fixture::new();
        let owner = fx.instance(fx.person);
        assert_eq!(
            owner.memory().read_path("hidden.name").unwrap_err(),
            MemoryError::NotReadable {
                key: "hidden".to_string()
            }
        );
    }

    #[test]
    fn test_public_static_reachable_through_path() {
        let fx = Fixture::new();
        let owner = fx.instance(fx.person);
        let friend = fx.instance(fx.person);
        owner.set("friend", friend).unwrap();

        let memory = owner.memory();
        assert!(memory.contains_path("friend.population"));
        assert_eq!(
            memory.set_path("friend.population", fx.int_value(12)),
            Ok(true)
        );
        let population = memory.get_path("population").unwrap();
        assert_eq!(*population.get_bound::<i64>().unwrap().unwrap(), 12);
    }
}
