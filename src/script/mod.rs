//! Db Command Execution Engine
//!
//! A [`Script`] is a command list bound to an owning object. Calling it creates a
//! [`Thread`] with a fresh memory stack (ambient context, the object's memory, the
//! inputs, a scratch layer) and runs the commands in order until the
//! [`CommandPointer`] reaches a terminal state.
//!
//! Commands are a closed set ([`CommandKind`]); host behavior enters through
//! [`NativeOperation`]. Every command carries the capabilities it requires, and a
//! thread checks them, aggregated over nested commands, before running it.
//!
//! Runtime failures ([`CommandError`]) can be caught by TRY; capability failures cannot.

mod command;
mod definition;
mod error;
mod pointer;
mod thread;

pub use crate::memory::RETURN_KEY;
pub use command::{Command, CommandKind, NativeOperation};
pub use definition::{Script, ScriptInfo, ScriptInput};
pub use error::{CommandError, CommandResult, InputError, ScriptError, ScriptResult};
pub use pointer::{CommandPointer, PointerStatus};
pub use thread::{Thread, ThreadContext};
