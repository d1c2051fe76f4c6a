use std::time::Duration;

use thiserror::Error;

use crate::capability::CapabilityError;
use crate::memory::MemoryError;
use crate::namespace::{Namespace, NamespaceError};
use crate::object::BindingError;
use crate::script::{CommandError, ScriptError};
use crate::types::TypeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Type error: {0}")]
    Type(#[from] TypeError),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Namespace error: {0}")]
    Namespace(#[from] NamespaceError),

    #[error("Config error: {0}")]
    Config(String),
    #[error("Script {script} timed out after {timeout:?}")]
    Timeout { script: Namespace, timeout: Duration },
}

pub type InternalResult<T> = Result<T, Error>;
