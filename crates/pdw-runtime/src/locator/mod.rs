//! Resolution of logical script names to script text.
//!
//! A [`ScriptLocator`] reads files beneath one [`ScriptRoot`]. The root is
//! chosen once per invocation: `R2DEC_WASM_HOME` when it is set and
//! non-empty, then a configured root, then the bundle directory under the
//! user's home. Nothing is cached; every lookup re-reads storage.
//!
//! Reads go through a `cap-std` directory handle opened on the root, so a
//! name that tries to leave the root (`../`, absolute paths, escaping
//! symlinks) is reported as not found rather than read.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::{debug, warn};

use pdw_config::{SCRIPT_ROOT_ENV, default_script_root};

use crate::error::LocateError;

const LOCATOR_TARGET: &str = "pdw_runtime::locator";

/// Extension appended to module names.
pub const MODULE_EXTENSION: &str = ".js";

/// Longest composed module filename accepted, in bytes.
pub const MAX_MODULE_FILENAME: usize = 255;

/// Where a script root came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    /// The `R2DEC_WASM_HOME` environment variable.
    Environment,
    /// The loaded configuration.
    Configured,
    /// The bundle directory under the home directory.
    Default,
}

/// Directory that logical script names are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRoot {
    path: Utf8PathBuf,
    source: RootSource,
}

impl ScriptRoot {
    /// Uses `path` as the root.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, source: RootSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Resolves the root from the process environment.
    #[must_use]
    pub fn from_environment(configured: Option<&Utf8Path>) -> Option<Self> {
        Self::resolve(env::var_os(SCRIPT_ROOT_ENV), configured, default_script_root())
    }

    /// Picks the root from explicit candidates, highest precedence first.
    ///
    /// An empty or non-UTF-8 override counts as unset.
    #[must_use]
    pub fn resolve(
        override_value: Option<OsString>,
        configured: Option<&Utf8Path>,
        fallback: Option<Utf8PathBuf>,
    ) -> Option<Self> {
        if let Some(path) = override_value.and_then(utf8_override) {
            return Some(Self::new(path, RootSource::Environment));
        }
        if let Some(path) = configured {
            return Some(Self::new(path, RootSource::Configured));
        }
        fallback.map(|path| Self::new(path, RootSource::Default))
    }

    /// Root directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Where the root came from.
    #[must_use]
    pub const fn source(&self) -> RootSource {
        self.source
    }
}

impl fmt::Display for ScriptRoot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, formatter)
    }
}

fn utf8_override(value: OsString) -> Option<Utf8PathBuf> {
    if value.is_empty() {
        return None;
    }
    match Utf8PathBuf::from_path_buf(PathBuf::from(value)) {
        Ok(path) => Some(path),
        Err(path) => {
            warn!(
                target: LOCATOR_TARGET,
                path = %path.display(),
                "ignoring non UTF-8 {SCRIPT_ROOT_ENV}"
            );
            None
        }
    }
}

/// Reads script text beneath an optional root.
#[derive(Debug, Clone)]
pub struct ScriptLocator {
    root: Option<ScriptRoot>,
}

impl ScriptLocator {
    /// Creates a locator for `root`; `None` makes every lookup fail with
    /// [`LocateError::RootUnavailable`].
    #[must_use]
    pub const fn new(root: Option<ScriptRoot>) -> Self {
        Self { root }
    }

    /// Creates a locator whose root is resolved from the environment now.
    #[must_use]
    pub fn from_environment(configured: Option<&Utf8Path>) -> Self {
        Self::new(ScriptRoot::from_environment(configured))
    }

    /// The resolved root, if any.
    #[must_use]
    pub const fn root(&self) -> Option<&ScriptRoot> {
        self.root.as_ref()
    }

    /// Returns the full text of `name`, relative to the root.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::RootUnavailable`] without a root, and
    /// [`LocateError::NotFound`] when the file is missing, empty,
    /// unreadable, or outside the root.
    pub fn load(&self, name: &str) -> Result<String, LocateError> {
        let root = self.root.as_ref().ok_or(LocateError::RootUnavailable)?;
        let not_found = || LocateError::NotFound {
            name: name.to_owned(),
            root: root.path.clone(),
        };

        let bytes = read_beneath(root.path(), name).map_err(|err| {
            debug!(
                target: LOCATOR_TARGET,
                name,
                root = %root,
                error = %err,
                "script lookup failed"
            );
            not_found()
        })?;

        if bytes.is_empty() {
            debug!(target: LOCATOR_TARGET, name, root = %root, "script is empty");
            return Err(not_found());
        }

        String::from_utf8(bytes).map_err(|_| LocateError::NotText {
            name: name.to_owned(),
            root: root.path.clone(),
        })
    }

    /// Resolves a bare module name by appending [`MODULE_EXTENSION`].
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::NameTooLong`] when the composed filename
    /// exceeds [`MAX_MODULE_FILENAME`], otherwise the errors of
    /// [`ScriptLocator::load`].
    pub fn require(&self, module: &str) -> Result<String, LocateError> {
        let file_name = module_file_name(module)?;
        self.load(&file_name)
    }
}

/// Composes the filename a module name resolves to.
///
/// # Errors
///
/// Returns [`LocateError::NameTooLong`] above [`MAX_MODULE_FILENAME`] bytes.
pub fn module_file_name(module: &str) -> Result<String, LocateError> {
    let name = format!("{module}{MODULE_EXTENSION}");
    if name.len() > MAX_MODULE_FILENAME {
        return Err(LocateError::NameTooLong {
            length: name.len(),
            name,
            limit: MAX_MODULE_FILENAME,
        });
    }
    Ok(name)
}

fn read_beneath(root: &Utf8Path, name: &str) -> io::Result<Vec<u8>> {
    let dir = Dir::open_ambient_dir(root, ambient_authority())?;
    dir.read(name)
}
