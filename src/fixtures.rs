//! Shared type registry and helpers for unit tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{CapabilitiesCollection, Capability};
use crate::memory::{MemoryProperty, PropertyFlags};
use crate::namespace::Namespace;
use crate::object::{DataObject, Object};
use crate::script::{CommandError, CommandResult, NativeOperation, Script, Thread};
use crate::types::{ContractDecl, TypeDecl, TypeRef, TypeRegistry};

fn ns(name: &str) -> Namespace {
    name.parse().unwrap()
}

pub(crate) struct Fixture {
    pub types: Arc<TypeRegistry>,
    pub string: TypeRef,
    pub int: TypeRef,
    pub script: TypeRef,
    pub named: TypeRef,
    pub animal: TypeRef,
    pub dog: TypeRef,
    pub person: TypeRef,
}

impl Fixture {
    pub fn new() -> Self {
        let mut types = TypeRegistry::new();
        let string = types
            .define_type(TypeDecl::new(ns("Core.String")).bind::<String>())
            .unwrap();
        let int = types
            .define_type(TypeDecl::new(ns("Core.Int")).bind::<i64>())
            .unwrap();
        let script = types
            .define_type(TypeDecl::new(ns("Core.Script")).bind::<Script>())
            .unwrap();
        let named = types
            .define_contract(
                ContractDecl::new(ns("Animals.Named"))
                    .property(MemoryProperty::new("name", string)),
            )
            .unwrap();
        let animal = types
            .define_type(
                TypeDecl::new(ns("Animals.Animal")).public(MemoryProperty::new("name", string)),
            )
            .unwrap();
        let dog = types
            .define_type(TypeDecl::new(ns("Animals.Dog")).parent(animal).supports(named))
            .unwrap();

        let person = types.declare(ns("People.Person")).unwrap();
        let hidden = PropertyFlags {
            readable: false,
            ..PropertyFlags::default()
        };
        types
            .define_type(
                TypeDecl::new(ns("People.Person"))
                    .public(MemoryProperty::new("name", string))
                    .public(MemoryProperty::new("pet", animal))
                    .public(MemoryProperty::new("friend", person))
                    .public(MemoryProperty::with_flags("hidden", person, hidden))
                    .public(MemoryProperty::with_flags(
                        "population",
                        int,
                        PropertyFlags::default().with_static(),
                    ))
                    .private(MemoryProperty::new("secret", string)),
            )
            .unwrap();

        Self {
            types: Arc::new(types),
            string,
            int,
            script,
            named,
            animal,
            dog,
            person,
        }
    }

    pub fn instance(&self, type_ref: TypeRef) -> Object {
        DataObject::new(&self.types, type_ref).unwrap()
    }

    pub fn int_value(&self, value: i64) -> Object {
        let object = self.instance(self.int);
        object.set_bound(value).unwrap();
        object
    }

    pub fn string_value(&self, value: &str) -> Object {
        let object = self.instance(self.string);
        object.set_bound(value.to_string()).unwrap();
        object
    }

    pub fn script_object(&self, script: Script) -> Object {
        let carrier = self.instance(self.script);
        carrier.set_bound(script).unwrap();
        carrier
    }
}

/// Adds `Core.Int` arguments.
#[derive(Debug)]
pub(crate) struct Sum;

#[async_trait]
impl NativeOperation for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    async fn invoke(
        &self,
        me: &Object,
        _thread: &Thread,
        args: Vec<Option<Object>>,
    ) -> CommandResult<Option<Object>> {
        let mut total = 0_i64;
        for arg in args.into_iter().flatten() {
            total += *arg
                .get_bound::<i64>()?
                .ok_or_else(|| CommandError::native("sum", "unset operand"))?;
        }
        let types = me.types();
        let int = types
            .resolve("Core.Int")
            .map_err(|e| CommandError::native("sum", e.to_string()))?;
        let result =
            DataObject::new(types, int).map_err(|e| CommandError::native("sum", e.to_string()))?;
        result.set_bound(total)?;
        Ok(Some(result))
    }
}

/// Native operation that requires `network` and does nothing.
#[derive(Debug)]
pub(crate) struct Ping;

#[async_trait]
impl NativeOperation for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    fn required_capabilities(&self) -> CapabilitiesCollection {
        CapabilitiesCollection::from(Capability::named("network"))
    }

    async fn invoke(
        &self,
        _me: &Object,
        _thread: &Thread,
        _args: Vec<Option<Object>>,
    ) -> CommandResult<Option<Object>> {
        Ok(None)
    }
}
