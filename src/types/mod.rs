//! Db Type System
//!
//! Concrete types (single parent, supported contracts, public and private
//! properties) and contracts (public property requirements, multiple parents).
//!
//! Types live in a [`TypeRegistry`] arena and refer to each other through
//! [`TypeRef`] indices, never through owning references, so inheritance links and
//! property types can form any graph without ownership cycles. The registry is
//! filled by the build layer and then shared read-only behind an `Arc`.
//!
//! # Invariants
//!
//! - No two properties of a concrete type's combined effective property set share a key.
//! - Every property of a supported contract (including the contract's own parents)
//!   is exposed as an identical public property of the supporting type.
//! - A contract never declares a private property.
//!
//! Violations are construction errors ([`TypeError`]); the type is never registered.

mod error;
mod registry;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::memory::{ItemGroup, MemoryProperty};
use crate::namespace::Namespace;

pub use error::{TypeError, TypeResult};
pub use registry::TypeRegistry;

/// Stable index of a type or contract inside its [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(u32);

impl TypeRef {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Reference for arena slot `index`; fails once the arena outgrows `u32`.
    pub(crate) fn from_index(index: usize) -> TypeResult<Self> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| TypeError::RegistryFull { index })
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host type that objects of a concrete type may carry as their native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBinding {
    type_id: TypeId,
    type_name: &'static str,
}

impl NativeBinding {
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn accepts<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredProperty {
    pub property: MemoryProperty,
    pub visibility: Visibility,
}

#[derive(Debug, strum::Display)]
pub enum TypeDef {
    /// Reserved by [`TypeRegistry::declare`], not yet defined.
    Pending(Namespace),
    Concrete(DataType),
    Contract(DataContract),
}

impl TypeDef {
    pub fn name(&self) -> &Namespace {
        match self {
            TypeDef::Pending(name) => name,
            TypeDef::Concrete(data_type) => &data_type.name,
            TypeDef::Contract(contract) => &contract.name,
        }
    }

    pub fn as_concrete(&self) -> Option<&DataType> {
        match self {
            TypeDef::Concrete(data_type) => Some(data_type),
            _ => None,
        }
    }

    pub fn as_contract(&self) -> Option<&DataContract> {
        match self {
            TypeDef::Contract(contract) => Some(contract),
            _ => None,
        }
    }
}

/// An instantiable type. Property lists are the effective ones: the parent's
/// properties first, then the ones this type declares.
#[derive(Debug)]
pub struct DataType {
    name: Namespace,
    binding: Option<NativeBinding>,
    parent: Option<TypeRef>,
    contracts: Vec<TypeRef>,
    public: Vec<MemoryProperty>,
    private: Vec<MemoryProperty>,
    public_statics: Arc<ItemGroup>,
    private_statics: Arc<ItemGroup>,
}

impl DataType {
    pub fn name(&self) -> &Namespace {
        &self.name
    }

    pub fn parent(&self) -> Option<TypeRef> {
        self.parent
    }

    pub fn contracts(&self) -> &[TypeRef] {
        &self.contracts
    }

    pub fn public_properties(&self) -> &[MemoryProperty] {
        &self.public
    }

    pub fn private_properties(&self) -> &[MemoryProperty] {
        &self.private
    }

    /// Shared storage for the public static properties this type itself declares.
    pub fn public_statics(&self) -> &Arc<ItemGroup> {
        &self.public_statics
    }

    pub fn private_statics(&self) -> &Arc<ItemGroup> {
        &self.private_statics
    }

    pub fn binding(&self) -> Option<NativeBinding> {
        self.binding
    }

    pub fn has_binding(&self) -> bool {
        self.binding.is_some()
    }

    pub fn is_bound_type<T: Any>(&self) -> bool {
        self.binding.is_some_and(|b| b.accepts::<T>())
    }
}

#[derive(Debug)]
pub struct DataContract {
    name: Namespace,
    properties: Vec<MemoryProperty>,
    parents: Vec<TypeRef>,
}

impl DataContract {
    pub fn name(&self) -> &Namespace {
        &self.name
    }

    /// Properties declared by this contract itself, not its parents.
    pub fn own_properties(&self) -> &[MemoryProperty] {
        &self.properties
    }

    pub fn parents(&self) -> &[TypeRef] {
        &self.parents
    }
}

/// Input to [`TypeRegistry::define_type`].
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Namespace,
    pub binding: Option<NativeBinding>,
    pub public: Vec<MemoryProperty>,
    pub private: Vec<MemoryProperty>,
    pub contracts: Vec<TypeRef>,
    pub parent: Option<TypeRef>,
}

impl TypeDecl {
    pub fn new(name: Namespace) -> Self {
        Self {
            name,
            binding: None,
            public: Vec::new(),
            private: Vec::new(),
            contracts: Vec::new(),
            parent: None,
        }
    }

    pub fn bind<T: Any>(mut self) -> Self {
        self.binding = Some(NativeBinding::of::<T>());
        self
    }

    pub fn parent(mut self, parent: TypeRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn supports(mut self, contract: TypeRef) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn public(mut self, property: MemoryProperty) -> Self {
        self.public.push(property);
        self
    }

    pub fn private(mut self, property: MemoryProperty) -> Self {
        self.private.push(property);
        self
    }
}

/// Input to [`TypeRegistry::define_contract`].
#[derive(Debug, Clone)]
pub struct ContractDecl {
    pub name: Namespace,
    pub properties: Vec<DeclaredProperty>,
    pub parents: Vec<TypeRef>,
}

impl ContractDecl {
    pub fn new(name: Namespace) -> Self {
        Self {
            name,
            properties: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn property(mut self, property: MemoryProperty) -> Self {
        self.properties.push(DeclaredProperty {
            property,
            visibility: Visibility::Public,
        });
        self
    }

    /// Declares a private property; the build layer passes these through so that
    /// definition can reject them.
    pub fn private(mut self, property: MemoryProperty) -> Self {
        self.properties.push(DeclaredProperty {
            property,
            visibility: Visibility::Private,
        });
        self
    }

    pub fn extends(mut self, parent: TypeRef) -> Self {
        self.parents.push(parent);
        self
    }
}
