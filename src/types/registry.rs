use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::{
    ContractDecl, DataContract, DataType, TypeDecl, TypeDef, TypeError, TypeRef, TypeResult,
    Visibility,
};
use crate::memory::{ItemGroup, MemoryProperty, PropertyFlags, RETURN_KEY};
use crate::namespace::Namespace;

/// Arena of every type and contract known to a runtime.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDef>,
    names: HashMap<Namespace, TypeRef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, type_ref: TypeRef) -> TypeResult<&TypeDef> {
        self.types
            .get(type_ref.index())
            .ok_or(TypeError::UnknownType(type_ref))
    }

    pub fn concrete(&self, type_ref: TypeRef) -> TypeResult<&DataType> {
        match self.get(type_ref)? {
            TypeDef::Concrete(data_type) => Ok(data_type),
            TypeDef::Pending(name) => Err(TypeError::PendingType(name.clone())),
            TypeDef::Contract(contract) => Err(TypeError::NotConcrete {
                name: contract.name().clone(),
            }),
        }
    }

    pub fn contract(&self, type_ref: TypeRef) -> TypeResult<&DataContract> {
        match self.get(type_ref)? {
            TypeDef::Contract(contract) => Ok(contract),
            TypeDef::Pending(name) => Err(TypeError::PendingType(name.clone())),
            TypeDef::Concrete(data_type) => Err(TypeError::NotContract {
                name: data_type.name().clone(),
            }),
        }
    }

    pub fn lookup(&self, name: &Namespace) -> Option<TypeRef> {
        self.names.get(name).copied()
    }

    /// Looks a type up by its dotted name, e.g. `"Core.String"`.
    pub fn resolve(&self, name: &str) -> TypeResult<TypeRef> {
        let namespace: Namespace = name.parse()?;
        self.lookup(&namespace)
            .ok_or_else(|| TypeError::UnknownTypeName(name.to_string()))
    }

    /// Display name for diagnostics; never fails.
    pub fn name_of(&self, type_ref: TypeRef) -> String {
        self.get(type_ref)
            .map(|def| def.name().to_string())
            .unwrap_or_else(|_| format!("<unknown {}>", type_ref))
    }

    /// Builds a property whose type is looked up by name.
    pub fn property(
        &self,
        key: &str,
        type_name: &str,
        flags: PropertyFlags,
    ) -> TypeResult<MemoryProperty> {
        let type_ref = self
            .resolve(type_name)
            .map_err(|_| TypeError::MissingPropertyType {
                key: key.to_string(),
                type_name: type_name.to_string(),
            })?;
        Ok(MemoryProperty::with_flags(key, type_ref, flags))
    }

    /// Reserves a reference for a type that will be defined later, so properties
    /// may already refer to it. Declaring an already declared name returns the
    /// same reference.
    pub fn declare(&mut self, name: Namespace) -> TypeResult<TypeRef> {
        if let Some(existing) = self.lookup(&name) {
            return match self.get(existing)? {
                TypeDef::Pending(_) => Ok(existing),
                _ => Err(TypeError::DuplicateTypeName(name)),
            };
        }
        self.insert(TypeDef::Pending(name))
    }

    pub fn define_type(&mut self, decl: TypeDecl) -> TypeResult<TypeRef> {
        let slot = self.slot_for(&decl.name)?;

        let parent = match decl.parent {
            Some(parent) => Some(self.concrete(parent)?),
            None => None,
        };
        for contract in &decl.contracts {
            self.contract(*contract)?;
        }
        for property in decl.public.iter().chain(&decl.private) {
            if property.key() == RETURN_KEY {
                return Err(TypeError::ReservedKey {
                    type_name: decl.name,
                    key: RETURN_KEY.to_string(),
                });
            }
            self.get(property.type_ref())?;
        }

        let mut public: Vec<MemoryProperty> = parent
            .map(|p| p.public_properties().to_vec())
            .unwrap_or_default();
        let mut private: Vec<MemoryProperty> = parent
            .map(|p| p.private_properties().to_vec())
            .unwrap_or_default();
        public.extend(decl.public.iter().cloned());
        private.extend(decl.private.iter().cloned());

        let duplicates = duplicate_keys(public.iter().chain(&private));
        if !duplicates.is_empty() {
            return Err(TypeError::DuplicateProperty {
                type_name: decl.name,
                keys: duplicates,
            });
        }

        let mut unfulfilled = Vec::new();
        let mut missing = Vec::new();
        for contract in &decl.contracts {
            let required = self.contract_properties(*contract)?;
            let absent: Vec<String> = required
                .iter()
                .filter(|p| !public.contains(p))
                .map(|p| p.key().to_string())
                .collect();
            if !absent.is_empty() {
                unfulfilled.push(self.get(*contract)?.name().clone());
                missing.extend(absent);
            }
        }
        if !unfulfilled.is_empty() {
            return Err(TypeError::UnfulfilledContract {
                type_name: decl.name,
                contracts: unfulfilled,
                missing,
            });
        }

        let statics = |declared: &[MemoryProperty]| {
            Arc::new(ItemGroup::fixed(
                declared.iter().filter(|p| p.flags().is_static).cloned(),
            ))
        };
        let public_statics = statics(&decl.public);
        let private_statics = statics(&decl.private);

        debug!(
            type_name = %decl.name,
            public = public.len(),
            private = private.len(),
            "Defined type"
        );
        let data_type = DataType {
            name: decl.name,
            binding: decl.binding,
            parent: decl.parent,
            contracts: decl.contracts,
            public,
            private,
            public_statics,
            private_statics,
        };
        self.fill(slot, TypeDef::Concrete(data_type))
    }

    pub fn define_contract(&mut self, decl: ContractDecl) -> TypeResult<TypeRef> {
        let slot = self.slot_for(&decl.name)?;

        if let Some(private) = decl
            .properties
            .iter()
            .find(|p| p.visibility == Visibility::Private)
        {
            return Err(TypeError::PrivateContractProperty {
                contract: decl.name,
                key: private.property.key().to_string(),
            });
        }
        for parent in &decl.parents {
            self.contract(*parent)?;
        }
        for declared in &decl.properties {
            self.get(declared.property.type_ref())?;
        }

        debug!(contract = %decl.name, "Defined contract");
        let contract = DataContract {
            name: decl.name,
            properties: decl.properties.into_iter().map(|p| p.property).collect(),
            parents: decl.parents,
        };
        self.fill(slot, TypeDef::Contract(contract))
    }

    /// Every property a contract requires, including those of its parent contracts.
    pub fn contract_properties(&self, contract: TypeRef) -> TypeResult<Vec<MemoryProperty>> {
        let mut properties = Vec::new();
        let mut visited = HashSet::new();
        self.collect_contract_properties(contract, &mut properties, &mut visited)?;
        Ok(properties)
    }

    fn collect_contract_properties(
        &self,
        contract: TypeRef,
        properties: &mut Vec<MemoryProperty>,
        visited: &mut HashSet<TypeRef>,
    ) -> TypeResult<()> {
        if !visited.insert(contract) {
            return Ok(());
        }
        let def = self.contract(contract)?;
        for property in def.own_properties() {
            if !properties.contains(property) {
                properties.push(property.clone());
            }
        }
        for parent in def.parents() {
            self.collect_contract_properties(*parent, properties, visited)?;
        }
        Ok(())
    }

    /// Whether a value of type `this` may be used where `other` is expected.
    ///
    /// Reflexive; a concrete type is its parent chain and every contract it supports
    /// (transitively); a contract is every contract it extends (transitively).
    pub fn is(&self, this: TypeRef, other: TypeRef) -> bool {
        if this == other {
            return true;
        }
        match self.types.get(this.index()) {
            Some(TypeDef::Concrete(data_type)) => {
                data_type.contracts().iter().any(|c| self.is(*c, other))
                    || data_type.parent().is_some_and(|p| self.is(p, other))
            }
            Some(TypeDef::Contract(contract)) => {
                contract.parents().iter().any(|p| self.is(*p, other))
            }
            _ => false,
        }
    }

    /// Static groups of a type and its ancestors, own type first; public before
    /// private within each type.
    pub fn static_groups(&self, type_ref: TypeRef) -> Vec<Arc<ItemGroup>> {
        self.ancestry(type_ref)
            .flat_map(|t| [t.public_statics().clone(), t.private_statics().clone()])
            .collect()
    }

    /// Public static groups of a type and its ancestors, own type first.
    pub fn public_static_groups(&self, type_ref: TypeRef) -> Vec<Arc<ItemGroup>> {
        self.ancestry(type_ref)
            .map(|t| t.public_statics().clone())
            .collect()
    }

    fn ancestry(&self, type_ref: TypeRef) -> impl Iterator<Item = &DataType> + '_ {
        std::iter::successors(self.concrete(type_ref).ok(), move |t| {
            t.parent().and_then(|p| self.concrete(p).ok())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeRef, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .filter_map(|(index, def)| TypeRef::from_index(index).ok().map(|t| (t, def)))
    }

    /// Existing pending slot for `name`, or `None` if the name is free.
    fn slot_for(&self, name: &Namespace) -> TypeResult<Option<TypeRef>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(existing) => match self.get(existing)? {
                TypeDef::Pending(_) => Ok(Some(existing)),
                _ => Err(TypeError::DuplicateTypeName(name.clone())),
            },
        }
    }

    fn fill(&mut self, slot: Option<TypeRef>, def: TypeDef) -> TypeResult<TypeRef> {
        match slot {
            Some(type_ref) => {
                self.types[type_ref.index()] = def;
                Ok(type_ref)
            }
            None => self.insert(def),
        }
    }

    fn insert(&mut self, def: TypeDef) -> TypeResult<TypeRef> {
        let type_ref = TypeRef::from_index(self.types.len())?;
        self.names.insert(def.name().clone(), type_ref);
        self.types.push(def);
        Ok(type_ref)
    }
}

fn duplicate_keys<'a>(properties: impl Iterator<Item = &'a MemoryProperty>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for property in properties {
        if !seen.insert(property.key()) && !duplicates.iter().any(|d| d == property.key()) {
            duplicates.push(property.key().to_string());
        }
    }
    duplicates
}
