//! Domain errors raised by the bridge runtime.
//!
//! Locator failures are values the callback surface turns into script-level
//! type errors; session errors cover the few failures that happen before a
//! script can run at all. Script exceptions are never errors here: they are
//! reported through [`SessionOutcome`](crate::SessionOutcome).

use camino::Utf8PathBuf;
use thiserror::Error;

use pdw_host::HostError;

/// Reasons a logical script name could not be turned into text.
///
/// Every variant is a "not found" result from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// Neither the environment, the configuration, nor the home directory
    /// produced a script root.
    #[error("no script root is available; set R2DEC_WASM_HOME")]
    RootUnavailable,

    /// The file is missing, unreadable, empty, or outside the root.
    #[error("'{name}' not found under {root}")]
    NotFound {
        /// Name that was requested, including any appended extension.
        name: String,
        /// Root the name was resolved against.
        root: Utf8PathBuf,
    },

    /// The file exists but is not UTF-8 text.
    #[error("'{name}' under {root} is not valid UTF-8")]
    NotText {
        /// Name that was requested.
        name: String,
        /// Root the name was resolved against.
        root: Utf8PathBuf,
    },

    /// The composed module filename exceeds the documented ceiling.
    #[error("module filename '{name}' is {length} bytes, the limit is {limit}")]
    NameTooLong {
        /// Composed filename.
        name: String,
        /// Its length in bytes.
        length: usize,
        /// Maximum accepted length in bytes.
        limit: usize,
    },
}

/// Failures that prevent a session from running scripts.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The host was already attached to another session.
    #[error("cannot start a session: {0}")]
    Host(#[from] HostError),

    /// The interpreter runtime or context could not be created.
    #[error("failed to create the interpreter: {0}")]
    Engine(#[source] rquickjs::Error),
}

/// Failures raised while dispatching a `pdw` command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The session could not start.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A host-delegated action failed to reach the host.
    #[error("host action failed: {0}")]
    Host(#[source] HostError),
}
