//! # dblang: runtime core of the Db scripting language
//!
//! Db is a small, statically resolved, capability-secured scripting language. This
//! crate is its runtime core; parsing and building happen elsewhere and hand over
//! fully resolved types and command lists.
//!
//! ## Components, leaf first
//!
//! - Capability model ([`capability`]): named permissions and required/optional sets.
//! - Type system ([`types`]): concrete types with single inheritance and contracts
//!   with multiple inheritance, held in an arena ([`types::TypeRegistry`]).
//! - Memory model ([`memory`]): typed, flagged items in groups and key-disjoint stacks,
//!   addressable by dotted paths.
//! - Objects ([`object`]): instances of concrete types, optionally carrying a native value.
//! - Execution engine ([`script`]): commands, scripts and the threads that run them.
//! - Host facade ([`runtime`]) and its settings ([`config`]).
//!
//! ## Flow of a call
//!
//! ```text
//! Runtime::invoke → Script::call_in → Thread::build_stack → Thread::run → Command::execute
//! ```
//!
//! A thread checks each command's capabilities before running it. Runtime failures
//! can be caught by TRY; capability failures end the thread.

pub mod capability;
pub mod config;
pub mod error;
pub mod memory;
pub mod namespace;
pub mod object;
pub mod runtime;
pub mod script;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-exports
pub use capability::{CapabilitiesCollection, Capability, Capable};
pub use config::RuntimeConfig;
pub use error::*;
pub use namespace::Namespace;
pub use object::{DataObject, Object};
pub use runtime::Runtime;

#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
