//! Embedded interpreter bridge for the r2dec decompiler scripts.
//!
//! The decompiler is a JavaScript bundle. This crate runs it inside a QuickJS
//! interpreter, one fresh interpreter per invocation, and lets it call back
//! into the disassembly host:
//!
//! - [`Dispatcher`] routes `pdw` command lines to sessions, the usage text,
//!   the bundle update, or the host's decompiler-identity query.
//! - [`Session`] owns one interpreter for the span of an invocation and
//!   attaches the host to a [`HostLink`](pdw_host::HostLink) for exactly that
//!   span.
//! - [`ScriptLocator`] reads script text beneath the script root.
//! - [`FatalErrorTrap`] reports engine faults and applies the configured
//!   [`FatalPolicy`](pdw_config::FatalPolicy).
//!
//! Scripts see `r2cmd`, `___internal_load`, `___internal_require` and a
//! `console` object; see [`bridge`].

mod args;
pub mod bridge;
mod dispatch;
mod error;
mod fatal;
mod locator;
mod session;

pub use args::InvocationArgs;
pub use dispatch::{
    Action, COMMAND_PREFIX, CONFIG_QUERY_PREFIX, Dispatched, Dispatcher, PLUGIN_IDENTIFIER,
    RootPolicy, UPDATE_COMMAND, route, usage,
};
pub use error::{DispatchError, LocateError, SessionError};
pub use fatal::{FatalErrorTrap, NO_MESSAGE};
pub use locator::{
    MAX_MODULE_FILENAME, MODULE_EXTENSION, RootSource, ScriptLocator, ScriptRoot,
    module_file_name,
};
pub use session::{
    BOOTSTRAP_SCRIPT, ENTRY_POINT, ENTRY_SCRIPT, MISSING_ENTRY_POINT, Session, SessionOptions,
    SessionOutcome,
};

#[cfg(test)]
mod tests;
