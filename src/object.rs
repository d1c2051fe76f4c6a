//! Runtime instances of concrete types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::memory::{
    ItemGroup, LinkedMemoryGroup, MemoryGroup, MemoryItem, MemoryProperty, MemoryResult,
};
use crate::namespace::Namespace;
use crate::types::{NativeBinding, TypeRef, TypeRegistry, TypeResult};

pub type Object = Arc<DataObject>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Type {type_name} has no native binding")]
    NotBindable { type_name: Namespace },

    #[error("Type {type_name} binds {declared}, not {requested}")]
    Mismatch {
        type_name: Namespace,
        requested: &'static str,
        declared: &'static str,
    },
}

pub type BindingResult<T> = Result<T, BindingError>;

/// One instance of a concrete type.
///
/// Public and private groups are built once from the type's effective property lists;
/// static properties live on the type and are only linked in by [`DataObject::memory`].
pub struct DataObject {
    type_ref: TypeRef,
    type_name: Namespace,
    binding: Option<NativeBinding>,
    types: Arc<TypeRegistry>,
    public: Arc<ItemGroup>,
    private: Arc<ItemGroup>,
    bound: RwLock<Option<Arc<dyn Any + Send + Sync>>>,
}

impl DataObject {
    pub fn new(types: &Arc<TypeRegistry>, type_ref: TypeRef) -> TypeResult<Object> {
        let data_type = types.concrete(type_ref)?;
        let instance = |properties: &[MemoryProperty]| {
            ItemGroup::fixed(
                properties
                    .iter()
                    .filter(|p| !p.flags().is_static)
                    .cloned(),
            )
        };
        Ok(Arc::new(Self {
            type_ref,
            type_name: data_type.name().clone(),
            binding: data_type.binding(),
            types: types.clone(),
            public: Arc::new(instance(data_type.public_properties())),
            private: Arc::new(instance(data_type.private_properties())),
            bound: RwLock::new(None),
        }))
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn type_name(&self) -> &Namespace {
        &self.type_name
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    pub fn is(&self, other: TypeRef) -> bool {
        self.types.is(self.type_ref, other)
    }

    pub fn public(&self) -> &Arc<ItemGroup> {
        &self.public
    }

    pub fn private(&self) -> &Arc<ItemGroup> {
        &self.private
    }

    /// What code outside this object can see: public instance properties, then the
    /// public static groups of its type and each ancestor.
    pub fn public_memory(&self) -> LinkedMemoryGroup {
        let mut groups: Vec<Arc<dyn MemoryGroup>> = vec![self.public.clone()];
        groups.extend(
            self.types
                .public_static_groups(self.type_ref)
                .into_iter()
                .map(|g| g as Arc<dyn MemoryGroup>),
        );
        LinkedMemoryGroup::new(groups)
    }

    /// Everything code running on this object can see: public, private, then the
    /// static groups of its type and each ancestor.
    pub fn memory(&self) -> LinkedMemoryGroup {
        let mut groups: Vec<Arc<dyn MemoryGroup>> =
            vec![self.public.clone(), self.private.clone()];
        groups.extend(
            self.types
                .static_groups(self.type_ref)
                .into_iter()
                .map(|g| g as Arc<dyn MemoryGroup>),
        );
        LinkedMemoryGroup::new(groups)
    }

    pub fn get_bound<T: Any + Send + Sync>(&self) -> BindingResult<Option<Arc<T>>> {
        self.check_binding::<T>()?;
        match self.bound.read().clone() {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(Some)
                .map_err(|_| self.mismatch::<T>()),
        }
    }

    pub fn set_bound<T: Any + Send + Sync>(&self, value: T) -> BindingResult<()> {
        self.set_bound_arc(Arc::new(value))
    }

    pub fn set_bound_arc<T: Any + Send + Sync>(&self, value: Arc<T>) -> BindingResult<()> {
        self.check_binding::<T>()?;
        *self.bound.write() = Some(value as Arc<dyn Any + Send + Sync>);
        Ok(())
    }

    pub fn has_bound(&self) -> bool {
        self.bound.read().is_some()
    }

    fn check_binding<T: Any>(&self) -> BindingResult<()> {
        let binding = self.binding.ok_or_else(|| BindingError::NotBindable {
            type_name: self.type_name.clone(),
        })?;
        if binding.accepts::<T>() {
            Ok(())
        } else {
            Err(self.mismatch::<T>())
        }
    }

    fn mismatch<T: Any>(&self) -> BindingError {
        BindingError::Mismatch {
            type_name: self.type_name.clone(),
            requested: std::any::type_name::<T>(),
            declared: self
                .binding
                .map(|b| b.type_name())
                .unwrap_or("nothing"),
        }
    }
}

/// An object seen from outside is its [`DataObject::public_memory`].
impl MemoryGroup for DataObject {
    fn get(&self, key: &str) -> Option<Arc<MemoryItem>> {
        self.public_memory().get(key)
    }

    fn keys(&self) -> Vec<MemoryProperty> {
        self.public_memory().keys()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.public_memory().contains_key(key)
    }

    fn set(&self, key: &str, value: Object) -> MemoryResult<bool> {
        self.public_memory().set(key, value)
    }
}

impl fmt::Debug for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataObject")
            .field("type", &self.type_name)
            .field("public", &self.public.key_names())
            .field("bound", &self.has_bound())
            .finish()
    }
}
