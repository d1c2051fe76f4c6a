//! Named permissions and the required/optional permission sets that gate
//! every command a thread runs.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named permission. Two capabilities are the same capability if their names match;
/// display name and description are presentation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

impl Capability {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
        }
    }

    /// Capability whose display name is its name and which has no description.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
        }
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Error, Clone)]
pub enum CapabilityError {
    #[error("Thread {thread} does not have the required capabilities to execute command; missing: {}", join_names(.missing))]
    Denied {
        thread: String,
        missing: Vec<Capability>,
    },
}

fn join_names(capabilities: &[Capability]) -> String {
    capabilities
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Required and optional capabilities of a command, script or thread.
///
/// Held internally as sets, so there are no duplicates but there is no order either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesCollection {
    #[serde(default)]
    required: HashSet<Capability>,
    #[serde(default)]
    optional: HashSet<Capability>,
}

impl From<Capability> for CapabilitiesCollection {
    fn from(capability: Capability) -> Self {
        Self::new(vec![capability], vec![])
    }
}

impl From<Vec<Capability>> for CapabilitiesCollection {
    fn from(capabilities: Vec<Capability>) -> Self {
        Self::new(capabilities, vec![])
    }
}

impl CapabilitiesCollection {
    pub fn new(
        required: impl IntoIterator<Item = Capability>,
        optional: impl IntoIterator<Item = Capability>,
    ) -> Self {
        let required: HashSet<Capability> = required.into_iter().collect();
        let optional = optional
            .into_iter()
            .filter(|c| !required.contains(c))
            .collect();
        Self { required, optional }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn require(mut self, capability: Capability) -> Self {
        self.optional.remove(&capability);
        self.required.insert(capability);
        self
    }

    pub fn allow(mut self, capability: Capability) -> Self {
        if !self.required.contains(&capability) {
            self.optional.insert(capability);
        }
        self
    }

    pub fn required(&self) -> &HashSet<Capability> {
        &self.required
    }

    pub fn optional(&self) -> &HashSet<Capability> {
        &self.optional
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }

    /// True if every capability `other` requires is required (granted) here.
    pub fn can_access(&self, other: &CapabilitiesCollection) -> bool {
        other.required.iter().all(|c| self.required.contains(c))
    }

    /// Required capabilities of `other` that this collection does not grant, sorted by name.
    pub fn missing(&self, other: &CapabilitiesCollection) -> Vec<Capability> {
        let mut missing: Vec<Capability> = other
            .required
            .iter()
            .filter(|c| !self.required.contains(c))
            .cloned()
            .collect();
        missing.sort_by(|a, b| a.name.cmp(&b.name));
        missing
    }

    /// Fails with [`CapabilityError::Denied`] naming `thread` if `other` needs
    /// anything not granted here.
    pub fn check(
        &self,
        other: &CapabilitiesCollection,
        thread: &str,
    ) -> Result<(), CapabilityError> {
        let missing = self.missing(other);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CapabilityError::Denied {
                thread: thread.to_string(),
                missing,
            })
        }
    }

    pub fn union(&self, other: &CapabilitiesCollection) -> CapabilitiesCollection {
        Self::merge([self, other])
    }

    /// Required sets are unioned; optional sets are unioned minus anything already required.
    pub fn merge<'a, I>(collections: I) -> CapabilitiesCollection
    where
        I: IntoIterator<Item = &'a CapabilitiesCollection>,
    {
        let mut required = HashSet::new();
        let mut optional = HashSet::new();
        for collection in collections {
            required.extend(collection.required.iter().cloned());
            optional.extend(collection.optional.iter().cloned());
        }
        optional.retain(|c| !required.contains(c));
        Self { required, optional }
    }
}

impl fmt::Display for CapabilitiesCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.required.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        write!(f, "{}", names.join(", "))
    }
}

/// Anything whose execution is gated by capabilities.
pub trait Capable {
    fn required_capabilities(&self) -> CapabilitiesCollection;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn network() -> Capability {
        Capability::new("network", "Network", "Open outbound connections")
    }

    fn storage() -> Capability {
        Capability::named("storage")
    }

    #[test]
    fn test_capability_equality_by_name() {
        let a = Capability::new("network", "Network", "one description");
        let b = Capability::new("network", "Internet", "another description");
        assert_eq!(a, b);
        assert_ne!(a, storage());
    }

    #[test]
    fn test_can_access() {
        let granted = CapabilitiesCollection::from(vec![network(), storage()]);
        assert!(granted.can_access(&CapabilitiesCollection::from(network())));
        assert!(granted.can_access(&CapabilitiesCollection::empty()));

        let granted = CapabilitiesCollection::from(network());
        let required = CapabilitiesCollection::from(vec![network(), storage()]);
        assert!(!granted.can_access(&required));
        assert_eq!(granted.missing(&required), vec![storage()]);
    }

    #[test]
    fn test_optional_does_not_grant() {
        let granted = CapabilitiesCollection::empty().allow(network());
        assert!(!granted.can_access(&CapabilitiesCollection::from(network())));
    }

    #[test]
    fn test_merge_removes_required_from_optional() {
        let a = CapabilitiesCollection::empty().require(network()).allow(storage());
        let b = CapabilitiesCollection::empty().require(storage());
        let merged = a.union(&b);
        assert_eq!(merged.required().len(), 2);
        assert!(merged.optional().is_empty());
    }

    #[test]
    fn test_check_reports_thread() {
        let err = CapabilitiesCollection::empty()
            .check(&CapabilitiesCollection::from(network()), "main")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Thread main does not have the required capabilities to execute command; missing: network"
        );
    }

    #[test]
    fn test_deserialize_collection() {
        let json = r#"{ "required": [{ "name": "network" }] }"#;
        let collection: CapabilitiesCollection = serde_json::from_str(json).unwrap();
        assert!(collection.can_access(&CapabilitiesCollection::from(network())));
        assert!(collection.optional().is_empty());
    }

    fn arb_collection() -> impl Strategy<Value = CapabilitiesCollection> {
        proptest::collection::vec("[a-e]", 0..5)
            .prop_map(|names| {
                CapabilitiesCollection::from(
                    names.into_iter().map(Capability::named).collect::<Vec<_>>(),
                )
            })
    }

    proptest! {
        #[test]
        fn prop_can_access_reflexive(a in arb_collection()) {
            prop_assert!(a.can_access(&a));
        }

        #[test]
        fn prop_union_grants_both(a in arb_collection(), b in arb_collection()) {
            let merged = a.union(&b);
            prop_assert!(merged.can_access(&a));
            prop_assert!(merged.can_access(&b));
        }
    }
}
