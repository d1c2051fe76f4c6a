//! Host-facing entry point: instantiates objects, binds scripts and invokes them
//! under the configured grant and timeout.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::capability::CapabilitiesCollection;
use crate::config::RuntimeConfig;
use crate::memory::MemoryGroup;
use crate::namespace::Namespace;
use crate::object::{DataObject, Object};
use crate::script::{Script, ThreadContext};
use crate::types::{TypeRef, TypeRegistry};
use crate::{Error, InternalResult};

pub struct Runtime {
    types: Arc<TypeRegistry>,
    config: Arc<RuntimeConfig>,
    ambient: Option<Arc<dyn MemoryGroup>>,
    scripts: DashMap<Namespace, Object>,
}

impl Runtime {
    pub fn new(types: TypeRegistry, config: RuntimeConfig) -> Self {
        Self {
            types: Arc::new(types),
            config: Arc::new(config),
            ambient: None,
            scripts: DashMap::new(),
        }
    }

    /// Memory visible at the bottom of every thread's stack.
    pub fn with_ambient(mut self, ambient: Arc<dyn MemoryGroup>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn context(&self) -> ThreadContext {
        let context = ThreadContext::new(self.config.clone());
        match &self.ambient {
            Some(ambient) => context.with_ambient(ambient.clone()),
            None => context,
        }
    }

    pub fn type_ref(&self, type_name: &str) -> InternalResult<TypeRef> {
        Ok(self.types.resolve(type_name)?)
    }

    pub fn instantiate(&self, type_name: &str) -> InternalResult<Object> {
        self.instantiate_ref(self.type_ref(type_name)?)
    }

    pub fn instantiate_ref(&self, type_ref: TypeRef) -> InternalResult<Object> {
        Ok(DataObject::new(&self.types, type_ref)?)
    }

    /// New object of `type_name` carrying `value` as its native value.
    pub fn value<T: Any + Send + Sync>(&self, type_name: &str, value: T) -> InternalResult<Object> {
        let object = self.instantiate(type_name)?;
        object.set_bound(value)?;
        Ok(object)
    }

    /// Wraps `script` in a new object of `carrier_type` and registers it under the
    /// script's name. A later binding with the same name replaces the earlier one.
    pub fn bind_script(&self, carrier_type: &str, script: Script) -> InternalResult<Object> {
        let name = script.info().name.clone();
        let carrier = self.value(carrier_type, script)?;
        debug!(script = %name, "Bound script");
        self.scripts.insert(name, carrier.clone());
        Ok(carrier)
    }

    pub fn script(&self, name: &str) -> InternalResult<Object> {
        let name: Namespace = name.parse()?;
        self.scripts
            .get(&name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::Config(format!("No script named {}", name)))
    }

    pub async fn invoke_named(
        &self,
        name: &str,
        inputs: Vec<Object>,
        grant: Option<CapabilitiesCollection>,
    ) -> InternalResult<Option<Object>> {
        let carrier = self.script(name)?;
        self.invoke(&carrier, inputs, grant).await
    }

    /// Calls the script carried by `carrier` as a top-level invocation.
    ///
    /// Without an explicit `grant` the configured default grant applies. A
    /// configured call timeout bounds the whole call, nested calls included.
    pub async fn invoke(
        &self,
        carrier: &Object,
        inputs: Vec<Object>,
        grant: Option<CapabilitiesCollection>,
    ) -> InternalResult<Option<Object>> {
        let script = Script::bound_to(carrier)?;
        let granted = grant.unwrap_or_else(|| self.config.default_grant.clone());
        let name = script.info().name.clone();
        info!(script = %name, granted = %granted, "Invoking script");

        let call = script.call_in(self.context(), inputs, granted);
        let result = match self.config.call_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| Error::Timeout {
                    script: name.clone(),
                    timeout,
                })??,
            None => call.await?,
        };
        debug!(script = %name, returned = result.is_some(), "Script finished");
        Ok(result)
    }
}
