//! Policy applied when the embedded interpreter hits an unrecoverable fault.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reaction to a fatal interpreter fault.
///
/// An interpreter that reports an internal fault cannot be trusted to run
/// further script code, nor to be torn down safely. `Abort` terminates the
/// whole process once the diagnostic has been written. `Contain` writes the
/// same diagnostic, abandons the faulted interpreter without destroying it,
/// and fails only the current invocation.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FatalPolicy {
    /// Terminate the process after reporting the fault.
    #[default]
    Abort,
    /// Fail the invocation and keep the host process alive.
    Contain,
}

/// Errors encountered while parsing a [`FatalPolicy`] from text.
pub type FatalPolicyParseError = strum::ParseError;
