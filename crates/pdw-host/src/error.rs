//! Errors raised while talking to the disassembly host.
//!
//! I/O errors are wrapped in `Arc` so the enum stays `Clone` and small enough
//! for the `result_large_err` lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from host interactions.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// A callback fired while no session had the host attached.
    #[error("no active host session")]
    NoActiveHost,

    /// A session tried to attach while another session held the host.
    #[error("a host session is already active")]
    AlreadyAttached,

    /// The host process could not be started.
    #[error("failed to start host '{program}' on {target}: {source}")]
    Spawn {
        /// Executable that was launched.
        program: String,
        /// Binary the host was asked to open.
        target: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A standard stream of the host process was not captured.
    #[error("host process did not expose its {stream}")]
    MissingStream {
        /// Name of the missing stream.
        stream: &'static str,
    },

    /// Reading from or writing to the host failed.
    #[error("I/O error communicating with the host: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The host closed its output before finishing a reply.
    #[error("host closed the pipe before completing a reply")]
    Closed,
}

impl HostError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io {
            source: Arc::new(source),
        }
    }
}
