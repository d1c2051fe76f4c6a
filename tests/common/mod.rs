#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use dblang::memory::MemoryProperty;
use dblang::object::DataObject;
use dblang::script::{CommandError, CommandResult, NativeOperation, Script, Thread};
use dblang::types::{TypeDecl, TypeRegistry};
use dblang::{Namespace, Object, Runtime, RuntimeConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn ns(name: &str) -> Namespace {
    name.parse().unwrap()
}

/// `Core.String`, `Core.Int`, `Core.Script`, plus `App.Counter` with a public
/// `count: Core.Int` and a private `log: Core.String`.
pub fn core_types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    let string = types
        .define_type(TypeDecl::new(ns("Core.String")).bind::<String>())
        .unwrap();
    let int = types
        .define_type(TypeDecl::new(ns("Core.Int")).bind::<i64>())
        .unwrap();
    types
        .define_type(TypeDecl::new(ns("Core.Script")).bind::<Script>())
        .unwrap();
    types
        .define_type(
            TypeDecl::new(ns("App.Counter"))
                .public(MemoryProperty::new("count", int))
                .private(MemoryProperty::new("log", string)),
        )
        .unwrap();
    types
}

pub fn runtime() -> Runtime {
    Runtime::new(core_types(), RuntimeConfig::default())
}

pub fn int(runtime: &Runtime, value: i64) -> Object {
    runtime.value("Core.Int", value).unwrap()
}

pub fn int_of(object: &Object) -> i64 {
    *object.get_bound::<i64>().unwrap().unwrap()
}

/// Adds its `Core.Int` arguments.
#[derive(Debug)]
pub struct Sum;

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
        let mut total = 0;
        for arg in args {
            let arg = arg.ok_or_else(|| CommandError::native("sum", "missing operand"))?;
            total += *arg
                .get_bound::<i64>()?
                .ok_or_else(|| CommandError::native("sum", "unset operand"))?;
        }
        let int = me
            .types()
            .resolve("Core.Int")
            .map_err(|e| CommandError::native("sum", e.to_string()))?;
        let result = DataObject::new(me.types(), int)
            .map_err(|e| CommandError::native("sum", e.to_string()))?;
        result.set_bound(total)?;
        Ok(Some(result))
    }
}

pub fn sum() -> Arc<dyn NativeOperation> {
    Arc::new(Sum)
}
