use std::fmt;
use std::sync::Arc;

use async_recursion::async_recursion;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use super::{CommandError, CommandResult, Script, Thread};
use crate::capability::{CapabilitiesCollection, Capability, Capable};
use crate::memory::{
    MemoryError, MemoryGroup, MemoryItem, MemoryPathExt, MemoryProperty, PropertyFlags,
    RETURN_KEY,
};
use crate::object::Object;
use crate::types::TypeRef;

/// Host behavior callable from a script through a NATIVE command.
#[async_trait]
pub trait NativeOperation: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Added to the requirement of every command that invokes this operation.
    fn required_capabilities(&self) -> CapabilitiesCollection {
        CapabilitiesCollection::empty()
    }

    async fn invoke(
        &self,
        me: &Object,
        thread: &Thread,
        args: Vec<Option<Object>>,
    ) -> CommandResult<Option<Object>>;
}

#[derive(Debug, Clone, strum::Display)]
pub enum CommandKind {
    #[strum(serialize = "THIS")]
    This,
    #[strum(serialize = "VALUE")]
    Value(Object),
    #[strum(serialize = "GET")]
    Get(String),
    #[strum(serialize = "GET_OF")]
    GetOf { target: Box<Command>, path: String },
    #[strum(serialize = "SET")]
    Set { path: String, value: Box<Command> },
    #[strum(serialize = "ADD")]
    Add { key: String, type_ref: TypeRef },
    #[strum(serialize = "RETURN")]
    Return(Option<Box<Command>>),
    #[strum(serialize = "SCRIPT")]
    Script {
        target: Box<Command>,
        inputs: Vec<Command>,
    },
    #[strum(serialize = "TRY")]
    TryCatch {
        body: Box<Command>,
        handler: Box<Command>,
    },
    #[strum(serialize = "THROW")]
    Throw(Option<Box<Command>>),
    #[strum(serialize = "NATIVE")]
    Native {
        op: Arc<dyn NativeOperation>,
        args: Vec<Command>,
    },
}

/// A capability-gated operation run on behalf of a thread.
#[derive(Debug, Clone)]
pub struct Command {
    kind: CommandKind,
    capabilities: CapabilitiesCollection,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            capabilities: CapabilitiesCollection::empty(),
        }
    }

    pub fn this() -> Self {
        Self::new(CommandKind::This)
    }

    pub fn value(object: Object) -> Self {
        Self::new(CommandKind::Value(object))
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(CommandKind::Get(path.into()))
    }

    pub fn get_of(target: Command, path: impl Into<String>) -> Self {
        Self::new(CommandKind::GetOf {
            target: Box::new(target),
            path: path.into(),
        })
    }

    pub fn set(path: impl Into<String>, value: Command) -> Self {
        Self::new(CommandKind::Set {
            path: path.into(),
            value: Box::new(value),
        })
    }

    pub fn add(key: impl Into<String>, type_ref: TypeRef) -> Self {
        Self::new(CommandKind::Add {
            key: key.into(),
            type_ref,
        })
    }

    pub fn return_value(value: Command) -> Self {
        Self::new(CommandKind::Return(Some(Box::new(value))))
    }

    pub fn return_none() -> Self {
        Self::new(CommandKind::Return(None))
    }

    /// Calls the script carried by the object `target` yields, with one input per command.
    pub fn script(target: Command, inputs: Vec<Command>) -> Self {
        Self::new(CommandKind::Script {
            target: Box::new(target),
            inputs,
        })
    }

    pub fn try_catch(body: Command, handler: Command) -> Self {
        Self::new(CommandKind::TryCatch {
            body: Box::new(body),
            handler: Box::new(handler),
        })
    }

    pub fn throw(value: Option<Command>) -> Self {
        Self::new(CommandKind::Throw(value.map(Box::new)))
    }

    pub fn native(op: Arc<dyn NativeOperation>, args: Vec<Command>) -> Self {
        Self::new(CommandKind::Native { op, args })
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.capabilities = self.capabilities.require(capability);
        self
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    fn children(&self) -> Vec<&Command> {
        match &self.kind {
            CommandKind::This
            | CommandKind::Value(_)
            | CommandKind::Get(_)
            | CommandKind::Add { .. } => vec![],
            CommandKind::GetOf { target, .. } => vec![&**target],
            CommandKind::Set { value, .. } => vec![&**value],
            CommandKind::Return(value) | CommandKind::Throw(value) => {
                value.iter().map(|c| &**c).collect()
            }
            CommandKind::Script { target, inputs } => {
                std::iter::once(&**target).chain(inputs.iter()).collect()
            }
            CommandKind::TryCatch { body, handler } => vec![&**body, &**handler],
            CommandKind::Native { args, .. } => args.iter().collect(),
        }
    }

    #[async_recursion]
    pub async fn execute(&self, me: &Object, thread: &Thread) -> CommandResult<Option<Object>> {
        debug!(command = %self.kind, "Executing command");
        match &self.kind {
            CommandKind::This => Ok(Some(me.clone())),
            CommandKind::Value(object) => Ok(Some(object.clone())),
            CommandKind::Get(path) => Ok(thread.stack().read_path(path)?),
            CommandKind::GetOf { target, path } => {
                let object = require(target.execute(me, thread).await?, "GET_OF target")?;
                Ok(object.read_path(path)?)
            }
            CommandKind::Set { path, value } => {
                let value = require(value.execute(me, thread).await?, "SET value")?;
                if thread.stack().set_path(path, value)? {
                    Ok(None)
                } else {
                    Err(CommandError::SetRejected { path: path.clone() })
                }
            }
            CommandKind::Add { key, type_ref } => {
                if key == RETURN_KEY {
                    return Err(CommandError::ReservedKey { key: key.clone() });
                }
                let property = MemoryProperty::with_flags(
                    key.as_str(),
                    *type_ref,
                    PropertyFlags::default().with_scoped(),
                );
                if thread.stack().add(Arc::new(MemoryItem::new(property)))? {
                    Ok(None)
                } else {
                    Err(MemoryError::DuplicateKey { key: key.clone() }.into())
                }
            }
            CommandKind::Return(value) => {
                let value = match value {
                    Some(command) => command.execute(me, thread).await?,
                    None => None,
                };
                thread.set_return(value)?;
                Ok(None)
            }
            CommandKind::Script { target, inputs } => {
                let carrier = require(target.execute(me, thread).await?, "SCRIPT target")?;
                let script = Script::bound_to(&carrier)?;
                let args = evaluate_all(inputs, me, thread)
                    .await?
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| require(value, &format!("SCRIPT input {}", i)))
                    .collect::<CommandResult<Vec<_>>>()?;
                let context = thread.context().child()?;
                Ok(script
                    .call_in(context, args, thread.capabilities().clone())
                    .await?)
            }
            CommandKind::TryCatch { body, handler } => match body.execute(me, thread).await {
                Ok(_) => Ok(None),
                Err(e) if e.is_catchable() => {
                    debug!("Exception caught: {}", e);
                    handler.execute(me, thread).await?;
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            CommandKind::Throw(value) => {
                let value = match value {
                    Some(command) => command.execute(me, thread).await?,
                    None => None,
                };
                Err(CommandError::Thrown {
                    thread: thread.name().to_string(),
                    value,
                })
            }
            CommandKind::Native { op, args } => {
                let args = evaluate_all(args, me, thread).await?;
                op.invoke(me, thread, args).await
            }
        }
    }
}

impl Capable for Command {
    /// Own requirement, every nested command's, and a native operation's.
    fn required_capabilities(&self) -> CapabilitiesCollection {
        let mut all = vec![self.capabilities.clone()];
        all.extend(self.children().into_iter().map(|c| c.required_capabilities()));
        if let CommandKind::Native { op, .. } = &self.kind {
            all.push(op.required_capabilities());
        }
        CapabilitiesCollection::merge(&all)
    }
}

fn require(value: Option<Object>, context: &str) -> CommandResult<Object> {
    value.ok_or_else(|| CommandError::AbsentValue {
        context: context.to_string(),
    })
}

/// Evaluates independent commands, concurrently unless the runtime is configured otherwise.
async fn evaluate_all(
    commands: &[Command],
    me: &Object,
    thread: &Thread,
) -> CommandResult<Vec<Option<Object>>> {
    if thread.context().config().parallel_inputs {
        join_all(commands.iter().map(|c| c.execute(me, thread)))
            .await
            .into_iter()
            .collect()
    } else {
        let mut values = Vec::with_capacity(commands.len());
        for command in commands {
            values.push(command.execute(me, thread).await?);
        }
        Ok(values)
    }
}
