use camino::Utf8PathBuf;

use dirs::home_dir;

/// Environment variable that overrides every other script root source.
pub const SCRIPT_ROOT_ENV: &str = "R2DEC_WASM_HOME";

/// Host data directory, relative to the user's home directory.
pub const HOST_DATA_DIR: &str = ".local/share/radare2";

/// Location of the decompiler script bundle beneath the host data directory.
pub const SCRIPT_BUNDLE_DIR: &str = "r2pm/git/r2dec-wasm";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default disassembler executable launched by the command loop.
pub const DEFAULT_R2_BINARY: &str = "r2";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned disassembler executable name.
#[must_use]
pub fn default_r2_binary() -> String {
    DEFAULT_R2_BINARY.to_owned()
}

/// Computes the conventional script root under the user's home directory.
///
/// Returns `None` when the home directory cannot be determined or is not
/// valid UTF-8.
#[must_use]
pub fn default_script_root() -> Option<Utf8PathBuf> {
    let home = home_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())?;
    Some(script_root_under(home))
}

/// Joins the bundle convention onto an arbitrary home directory.
#[must_use]
pub fn script_root_under(home: Utf8PathBuf) -> Utf8PathBuf {
    let mut root = home;
    root.push(HOST_DATA_DIR);
    root.push(SCRIPT_BUNDLE_DIR);
    root
}
