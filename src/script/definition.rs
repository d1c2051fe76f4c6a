use std::sync::{Arc, Weak};

use tracing::debug;
use uuid::Uuid;

use super::{
    Command, CommandError, CommandResult, InputError, PointerStatus, ScriptError, ScriptResult,
    Thread, ThreadContext,
};
use crate::capability::{CapabilitiesCollection, Capable};
use crate::memory::{ItemGroup, MemoryItem, MemoryProperty, PropertyFlags, RETURN_KEY};
use crate::namespace::Namespace;
use crate::object::{BindingError, DataObject, Object};
use crate::types::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInput {
    pub key: String,
    pub type_ref: TypeRef,
}

impl ScriptInput {
    pub fn new(key: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            key: key.into(),
            type_ref,
        }
    }
}

/// Name, return type and ordered inputs of a script.
#[derive(Debug, Clone)]
pub struct ScriptInfo {
    pub name: Namespace,
    pub return_type: Option<TypeRef>,
    pub inputs: Vec<ScriptInput>,
}

impl ScriptInfo {
    pub fn new(name: Namespace) -> Self {
        Self {
            name,
            return_type: None,
            inputs: Vec::new(),
        }
    }

    pub fn returns(mut self, type_ref: TypeRef) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn input(mut self, key: impl Into<String>, type_ref: TypeRef) -> Self {
        self.inputs.push(ScriptInput::new(key, type_ref));
        self
    }

    /// Name for one invocation's thread.
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.name.dotted(), Uuid::new_v4().simple())
    }

    /// One scoped item per declared input, filled from `inputs` in order.
    pub fn create_memory_from_inputs(&self, inputs: Vec<Object>) -> ScriptResult<ItemGroup> {
        if let Some(reserved) = self.inputs.iter().find(|i| i.key == RETURN_KEY) {
            return Err(InputError::ReservedKey {
                script: self.name.clone(),
                key: reserved.key.clone(),
            }
            .into());
        }
        if inputs.len() != self.inputs.len() {
            return Err(InputError::Arity {
                script: self.name.clone(),
                expected: self.inputs.len(),
                actual: inputs.len(),
            }
            .into());
        }
        let mut items = Vec::with_capacity(inputs.len());
        for (declared, value) in self.inputs.iter().zip(inputs) {
            let property = MemoryProperty::with_flags(
                declared.key.as_str(),
                declared.type_ref,
                PropertyFlags::default().with_scoped(),
            );
            let item = MemoryItem::new(property);
            if !item.set(value.clone()) {
                return Err(InputError::TypeMismatch {
                    script: self.name.clone(),
                    key: declared.key.clone(),
                    expected: value.types().name_of(declared.type_ref),
                    actual: value.type_name().to_string(),
                }
                .into());
            }
            items.push(Arc::new(item));
        }
        Ok(ItemGroup::from_items(items, false))
    }
}

/// A command list bound to the object it runs on.
///
/// The parent is held weakly: the object carrying a script is usually reachable
/// from the parent's own properties.
#[derive(Debug)]
pub struct Script {
    parent: Weak<DataObject>,
    info: ScriptInfo,
    commands: Arc<[Command]>,
    additional: CapabilitiesCollection,
}

impl Script {
    pub fn new(parent: &Object, info: ScriptInfo, commands: Vec<Command>) -> Self {
        Self {
            parent: Arc::downgrade(parent),
            info,
            commands: commands.into(),
            additional: CapabilitiesCollection::empty(),
        }
    }

    /// Declares capabilities beyond those its commands require.
    pub fn with_capabilities(mut self, additional: CapabilitiesCollection) -> Self {
        self.additional = additional;
        self
    }

    /// The script carried by `carrier`. A type with no binding, or an empty script
    /// binding, is not callable; a binding to another host type is a binding error.
    pub fn bound_to(carrier: &Object) -> CommandResult<Arc<Script>> {
        let not_callable = || CommandError::NotCallable {
            type_name: carrier.type_name().clone(),
        };
        match carrier.get_bound::<Script>() {
            Ok(Some(script)) => Ok(script),
            Ok(None) | Err(BindingError::NotBindable { .. }) => Err(not_callable()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn info(&self) -> &ScriptInfo {
        &self.info
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn parent(&self) -> Option<Object> {
        self.parent.upgrade()
    }

    /// Top-level invocation in a default context.
    pub async fn call(
        &self,
        inputs: Vec<Object>,
        granted: CapabilitiesCollection,
    ) -> ScriptResult<Option<Object>> {
        self.call_in(ThreadContext::default(), inputs, granted).await
    }

    pub async fn call_in(
        &self,
        context: ThreadContext,
        inputs: Vec<Object>,
        granted: CapabilitiesCollection,
    ) -> ScriptResult<Option<Object>> {
        let me = self.parent().ok_or_else(|| ScriptError::Detached {
            script: self.info.name.clone(),
        })?;
        let input_memory = self.info.create_memory_from_inputs(inputs)?;

        let thread = Thread::new(self.info.unique_id(), granted, self.commands.clone(), context);
        thread
            .build_stack(&me, Arc::new(input_memory))
            .map_err(|source| ScriptError::Memory {
                thread: thread.name().to_string(),
                source,
            })?;

        debug!(
            thread = %thread.name(),
            depth = thread.context().depth(),
            "Calling script {}",
            self.info.name
        );
        thread.run(&me).await.map_err(|e| match e {
            CommandError::Capability(denied) => ScriptError::Capability(denied),
            source => ScriptError::Faulted {
                thread: thread.name().to_string(),
                source,
            },
        })?;

        let result = match thread.status() {
            PointerStatus::Returned => thread.return_value(),
            _ => None,
        };
        if let (Some(expected), Some(value)) = (self.info.return_type, &result) {
            if !value.is(expected) {
                return Err(ScriptError::ReturnType {
                    script: self.info.name.clone(),
                    expected: value.types().name_of(expected),
                    actual: value.type_name().to_string(),
                });
            }
        }
        Ok(result)
    }
}

impl Capable for Script {
    fn required_capabilities(&self) -> CapabilitiesCollection {
        let mut all: Vec<CapabilitiesCollection> = self
            .commands
            .iter()
            .map(|c| c.required_capabilities())
            .collect();
        all.push(self.additional.clone());
        CapabilitiesCollection::merge(&all)
    }
}
