use thiserror::Error;

use super::TypeRef;
use crate::namespace::{Namespace, NamespaceError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Unknown type reference {0}")]
    UnknownType(TypeRef),

    #[error("Unknown type name {0}")]
    UnknownTypeName(String),

    #[error("Type {0} is already defined")]
    DuplicateTypeName(Namespace),

    #[error("Type {0} is declared but has not been defined")]
    PendingType(Namespace),

    #[error("{name} is not a concrete type")]
    NotConcrete { name: Namespace },

    #[error("{name} is not a contract")]
    NotContract { name: Namespace },

    #[error("One or more property keys are used more than once in the same enclosing type {type_name}: {}", .keys.join(","))]
    DuplicateProperty {
        type_name: Namespace,
        keys: Vec<String>,
    },

    #[error("One or more contracts are missing required properties on type {type_name}: {} (missing: {})", join_names(.contracts), .missing.join(","))]
    UnfulfilledContract {
        type_name: Namespace,
        contracts: Vec<Namespace>,
        missing: Vec<String>,
    },

    #[error("Contract {contract} declares private property {key}; contract properties must be public")]
    PrivateContractProperty { contract: Namespace, key: String },

    #[error("Property {key} requires a type, but no type named {type_name} exists")]
    MissingPropertyType { key: String, type_name: String },

    #[error("Type {type_name} declares property {key}, which is a reserved key")]
    ReservedKey { type_name: Namespace, key: String },

    #[error("Type registry is full; slot {index} does not fit a type reference")]
    RegistryFull { index: usize },

    #[error("Invalid type name: {0}")]
    Namespace(#[from] NamespaceError),
}

pub type TypeResult<T> = Result<T, TypeError>;

fn join_names(names: &[Namespace]) -> String {
    names
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
