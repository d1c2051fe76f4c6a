use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, debug_span, warn, Instrument};

use super::{Command, CommandError, CommandPointer, CommandResult, PointerStatus, RETURN_KEY};
use crate::capability::{CapabilitiesCollection, Capable};
use crate::config::RuntimeConfig;
use crate::memory::{
    ItemGroup, MemoryError, MemoryGroup, MemoryItem, MemoryProperty, MemoryResult, MemoryStack,
};
use crate::object::Object;

/// Ambient state a thread runs in, handed down explicitly from caller to callee.
#[derive(Debug, Clone)]
pub struct ThreadContext {
    ambient: Option<Arc<dyn MemoryGroup>>,
    config: Arc<RuntimeConfig>,
    depth: usize,
}

impl Default for ThreadContext {
    fn default() -> Self {
        Self::new(Arc::new(RuntimeConfig::default()))
    }
}

impl ThreadContext {
    pub fn new(config: Arc<RuntimeConfig>) -> Self {
        Self {
            ambient: None,
            config,
            depth: 0,
        }
    }

    pub fn with_ambient(mut self, ambient: Arc<dyn MemoryGroup>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    pub fn ambient(&self) -> Option<&Arc<dyn MemoryGroup>> {
        self.ambient.as_ref()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for a nested script call one level deeper.
    pub fn child(&self) -> CommandResult<Self> {
        let depth = self.depth + 1;
        if depth > self.config.max_call_depth {
            return Err(CommandError::CallDepthExceeded {
                depth,
                max: self.config.max_call_depth,
            });
        }
        Ok(Self {
            ambient: self.ambient.clone(),
            config: self.config.clone(),
            depth,
        })
    }
}

/// One live execution of a script's command list.
pub struct Thread {
    name: String,
    capabilities: CapabilitiesCollection,
    pointer: Mutex<CommandPointer>,
    commands: Arc<[Command]>,
    context: ThreadContext,
    stack: MemoryStack,
    scratch: Mutex<Option<Arc<ItemGroup>>>,
}

impl Thread {
    pub fn new(
        name: impl Into<String>,
        capabilities: CapabilitiesCollection,
        commands: Arc<[Command]>,
        context: ThreadContext,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            pointer: Mutex::new(CommandPointer::new(commands.len())),
            commands,
            context,
            stack: MemoryStack::new(),
            scratch: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &CapabilitiesCollection {
        &self.capabilities
    }

    pub fn context(&self) -> &ThreadContext {
        &self.context
    }

    pub fn stack(&self) -> &MemoryStack {
        &self.stack
    }

    pub fn status(&self) -> PointerStatus {
        self.pointer.lock().status()
    }

    /// Lays out the stack, bottom to top: ambient context, the object's memory,
    /// the inputs, and an empty scratch layer for locals and the return slot.
    ///
    /// No layer below the scratch layer may hold the return key.
    pub fn build_stack(&self, me: &Object, inputs: Arc<dyn MemoryGroup>) -> MemoryResult<()> {
        let memory: Arc<dyn MemoryGroup> = Arc::new(me.memory());
        let layers = self
            .context
            .ambient()
            .cloned()
            .into_iter()
            .chain([memory, inputs]);
        for layer in layers {
            if layer.contains_key(RETURN_KEY) {
                return Err(MemoryError::ReservedKey {
                    key: RETURN_KEY.to_string(),
                });
            }
            self.stack.push_checked(layer)?;
        }
        *self.scratch.lock() = Some(self.stack.push_empty());
        Ok(())
    }

    /// Stores `value` in the return slot of the scratch layer and stops the thread.
    /// An absent value leaves no slot.
    pub fn set_return(&self, value: Option<Object>) -> CommandResult<()> {
        if let Some(value) = value {
            let scratch = self.scratch.lock().clone().ok_or(MemoryError::ReadOnlyGroup)?;
            let item = MemoryItem::new(MemoryProperty::new(RETURN_KEY, value.type_ref()));
            if !item.set(value) {
                return Err(CommandError::SetRejected {
                    path: RETURN_KEY.to_string(),
                });
            }
            if !scratch.add(Arc::new(item))? {
                return Err(MemoryError::DuplicateKey {
                    key: RETURN_KEY.to_string(),
                }
                .into());
            }
        }
        self.pointer.lock().mark_returned();
        Ok(())
    }

    /// Value of the return slot; never read from any layer but the scratch layer.
    pub fn return_value(&self) -> Option<Object> {
        self.scratch
            .lock()
            .as_ref()
            .and_then(|scratch| scratch.get(RETURN_KEY))
            .and_then(|item| item.value())
    }

    /// Runs commands in order until the pointer reaches a terminal state.
    ///
    /// Each command's required capabilities are checked before it runs; a denial
    /// faults the thread without running the command.
    pub async fn run(&self, me: &Object) -> CommandResult<()> {
        let span = debug_span!("thread", name = %self.name);
        async {
            debug!(commands = self.commands.len(), "Thread started");
            loop {
                let index = {
                    let pointer = self.pointer.lock();
                    if pointer.is_stopped() {
                        break;
                    }
                    pointer.index()
                };
                let Some(command) = self.commands.get(index) else {
                    break;
                };

                let required = command.required_capabilities();
                if let Err(e) = self.capabilities.check(&required, &self.name) {
                    warn!("Capability check failed: {}", e);
                    self.pointer.lock().fault();
                    return Err(CommandError::from(e));
                }

                if let Err(e) = command.execute(me, self).await {
                    debug!("Thread faulted at command {}: {}", index, e);
                    self.pointer.lock().fault();
                    return Err(e);
                }
                self.pointer.lock().advance();
            }
            debug!(status = %self.status(), "Thread stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities.to_string())
            .field("pointer", &*self.pointer.lock())
            .field("depth", &self.context.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::fixtures::Fixture;
    use crate::memory::{ItemGroup, MemoryPathExt};

    fn thread(commands: Vec<Command>, granted: CapabilitiesCollection) -> Thread {
        Thread::new("test", granted, commands.into(), ThreadContext::default())
    }

    #[tokio::test]
    async fn test_empty_thread_completes() {
        let fx = Fixture::new();
        let me = fx.instance(fx.person);
        let thread = thread(vec![], CapabilitiesCollection::empty());
        thread.build_stack(&me, Arc::new(ItemGroup::new())).unwrap();
        thread.run(&me).await.unwrap();
        assert_eq!(thread.status(), PointerStatus::Completed);
    }

    #[tokio::test]
    async fn test_stack_layout() {
        let fx = Fixture::new();
        let me = fx.instance(fx.person);
        let ambient = Arc::new(ItemGroup::fixed(vec![MemoryProperty::new("config", fx.string)]));
        let context = ThreadContext::default().with_ambient(ambient);
        let thread = Thread::new(
            "t",
            CapabilitiesCollection::empty(),
            Vec::<Command>::new().into(),
            context,
        );
        let inputs = Arc::new(ItemGroup::fixed(vec![MemoryProperty::new("a", fx.int)]));

        thread.build_stack(&me, inputs).unwrap();
        assert_eq!(thread.stack().depth(), 4);
        assert!(thread.stack().contains_key("config"));
        assert!(thread.stack().contains_key("secret"));
        assert!(thread.stack().contains_key("a"));
        assert!(thread.stack().is_writable());
    }

    #[tokio::test]
    async fn test_input_shadowing_object_key_rejected() {
        let fx = Fixture::new();
        let me = fx.instance(fx.person);
        let thread = thread(vec![], CapabilitiesCollection::empty());
        let inputs = Arc::new(ItemGroup::fixed(vec![MemoryProperty::new("name", fx.string)]));
        assert!(matches!(
            thread.build_stack(&me, inputs),
            Err(crate::memory::MemoryError::LayerConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_ambient_return_key_rejected() {
        let fx = Fixture::new();
        let me = fx.instance(fx.person);
        let ambient = Arc::new(ItemGroup::fixed(vec![MemoryProperty::new(RETURN_KEY, fx.int)]));
        let thread = Thread::new(
            "t",
            CapabilitiesCollection::empty(),
            Vec::<Command>::new().into(),
            ThreadContext::default().with_ambient(ambient),
        );
        assert_eq!(
            thread.build_stack(&me, Arc::new(ItemGroup::new())),
            Err(MemoryError::ReservedKey {
                key: "return".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_return_before_stack_is_built() {
        let fx = Fixture::new();
        let thread = thread(vec![], CapabilitiesCollection::empty());
        assert!(matches!(
            thread.set_return(Some(fx.int_value(1))),
            Err(CommandError::Memory(MemoryError::ReadOnlyGroup))
        ));
        assert!(thread.return_value().is_none());
    }

    #[tokio::test]
    async fn test_denied_command_never_runs() {
        let fx = Fixture::new();
        let me = fx.instance(fx.person);
        let thread = thread(
            vec![
                Command::set("name", Command::value(fx.string_value("before"))),
                Command::set("name", Command::value(fx.string_value("after")))
                    .requires(Capability::named("network")),
            ],
            CapabilitiesCollection::empty(),
        );
        thread.build_stack(&me, Arc::new(ItemGroup::new())).unwrap();

        let err = thread.run(&me).await.unwrap_err();
        assert!(matches!(err, CommandError::Capability(_)));
        assert_eq!(thread.status(), PointerStatus::Faulted);
        let name = me.get_path("name").unwrap();
        assert_eq!(*name.get_bound::<String>().unwrap().unwrap(), "before");
    }

    #[tokio::test]
    async fn test_return_stops_thread() {
        let fx = Fixture::new();
        let me = fx.instance(fx.person);
        let thread = thread(
            vec![
                Command::return_value(Command::value(fx.int_value(1))),
                Command::throw(None),
            ],
            CapabilitiesCollection::empty(),
        );
        thread.build_stack(&me, Arc::new(ItemGroup::new())).unwrap();
        thread.run(&me).await.unwrap();
        assert_eq!(thread.status(), PointerStatus::Returned);
        let value = thread.return_value().unwrap();
        assert_eq!(*value.get_bound::<i64>().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_call_depth_limit() {
        let config = RuntimeConfig {
            max_call_depth: 1,
            ..RuntimeConfig::default()
        };
        let context = ThreadContext::new(Arc::new(config));
        let child = context.child().unwrap();
        assert_eq!(child.depth(), 1);
        assert!(matches!(
            child.child(),
            Err(CommandError::CallDepthExceeded { depth: 2, max: 1 })
        ));
    }
}
