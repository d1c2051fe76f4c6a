use thiserror::Error;

use crate::capability::CapabilityError;
use crate::memory::MemoryError;
use crate::namespace::Namespace;
use crate::object::{BindingError, Object};

#[derive(Error, Debug, Clone)]
pub enum CommandError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Exception thrown on thread {thread}")]
    Thrown {
        thread: String,
        value: Option<Object>,
    },

    #[error("Script call failed: {0}")]
    Script(Box<ScriptError>),

    #[error("{context} produced no value")]
    AbsentValue { context: String },

    #[error("Object of type {type_name} carries no script")]
    NotCallable { type_name: Namespace },

    #[error("Value rejected by {path}: type mismatch")]
    SetRejected { path: String },

    #[error("Key {key} is reserved")]
    ReservedKey { key: String },

    #[error("Call depth {depth} exceeds the maximum of {max}")]
    CallDepthExceeded { depth: usize, max: usize },

    #[error("Native operation {name} failed: {message}")]
    Native { name: String, message: String },
}

impl CommandError {
    /// Capability failures are authorization defects and never reach a CATCH,
    /// including ones raised inside a nested script call.
    pub fn is_catchable(&self) -> bool {
        match self {
            CommandError::Capability(_) => false,
            CommandError::Script(inner) => inner.is_catchable(),
            _ => true,
        }
    }

    pub fn native(name: impl Into<String>, message: impl Into<String>) -> Self {
        CommandError::Native {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<ScriptError> for CommandError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Capability(e) => CommandError::Capability(e),
            other => CommandError::Script(Box::new(other)),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Script {script} takes {expected} inputs, got {actual}")]
    Arity {
        script: Namespace,
        expected: usize,
        actual: usize,
    },

    #[error("Input {key} of script {script} expects {expected}, got {actual}")]
    TypeMismatch {
        script: Namespace,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("Script {script} declares input {key}, which is a reserved key")]
    ReservedKey { script: Namespace, key: String },
}

#[derive(Error, Debug, Clone)]
pub enum ScriptError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Thread {thread} faulted: {source}")]
    Faulted {
        thread: String,
        #[source]
        source: CommandError,
    },

    #[error("Script {script} returned {actual}, expected {expected}")]
    ReturnType {
        script: Namespace,
        expected: String,
        actual: String,
    },

    #[error("Script {script} outlived its parent object")]
    Detached { script: Namespace },

    #[error("Thread {thread} could not build its memory: {source}")]
    Memory {
        thread: String,
        #[source]
        source: MemoryError,
    },
}

impl ScriptError {
    pub fn is_catchable(&self) -> bool {
        match self {
            ScriptError::Capability(_) => false,
            ScriptError::Faulted { source, .. } => source.is_catchable(),
            _ => true,
        }
    }

    /// Object attached to the exception that faulted the call, following nested calls.
    pub fn diagnostic(&self) -> Option<&Object> {
        match self {
            ScriptError::Faulted { source, .. } => match source {
                CommandError::Thrown { value, .. } => value.as_ref(),
                CommandError::Script(inner) => inner.diagnostic(),
                _ => None,
            },
            _ => None,
        }
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
