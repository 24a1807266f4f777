//! Error types for the command loop.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use pdw_host::HostError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the disassembler: {0}")]
    StartHost(#[source] HostError),
    #[error("lost the disassembler: {0}")]
    Host(#[source] HostError),
    #[error("failed to read commands: {0}")]
    ReadInput(#[source] io::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] io::Error),
}
