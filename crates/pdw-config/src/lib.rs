//! Shared configuration for the `pdw` decompiler bridge.
//!
//! Configuration is layered by `ortho_config`: an optional TOML file named by
//! `--config-path`, then `PDW_*` environment variables, then command-line
//! flags. The resulting [`Config`] carries logging preferences, the script
//! root used when `R2DEC_WASM_HOME` is not set, the disassembler executable
//! used by the command loop, and interpreter resource ceilings.

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod policy;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_R2_BINARY, HOST_DATA_DIR, SCRIPT_BUNDLE_DIR, SCRIPT_ROOT_ENV,
    default_log_filter, default_log_filter_string, default_log_format, default_r2_binary,
    default_script_root, script_root_under,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{FatalPolicy, FatalPolicyParseError};

/// Runtime configuration shared by the command loop and the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PDW")]
pub struct Config {
    /// Tracing filter expression, for example `info` or `pdw_runtime=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Script root used when the environment override is absent.
    pub script_root: Option<Utf8PathBuf>,
    /// Disassembler executable launched by the command loop.
    #[ortho_config(default = default_r2_binary())]
    pub r2_binary: String,
    /// Interpreter heap ceiling in bytes.
    pub memory_limit: Option<usize>,
    /// Interpreter stack ceiling in bytes.
    pub max_stack_size: Option<usize>,
    /// Reaction to unrecoverable interpreter faults.
    #[ortho_config(default = FatalPolicy::Abort)]
    pub fatal_policy: FatalPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            script_root: None,
            r2_binary: default_r2_binary(),
            memory_limit: None,
            max_stack_size: None,
            fatal_policy: FatalPolicy::default(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Configured script root, if any.
    #[must_use]
    pub fn script_root(&self) -> Option<&Utf8Path> {
        self.script_root.as_deref()
    }

    /// Disassembler executable.
    #[must_use]
    pub fn r2_binary(&self) -> &str {
        self.r2_binary.as_str()
    }

    /// Interpreter heap ceiling in bytes.
    #[must_use]
    pub const fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    /// Interpreter stack ceiling in bytes.
    #[must_use]
    pub const fn max_stack_size(&self) -> Option<usize> {
        self.max_stack_size
    }

    /// Reaction to unrecoverable interpreter faults.
    #[must_use]
    pub const fn fatal_policy(&self) -> FatalPolicy {
        self.fatal_policy
    }
}
