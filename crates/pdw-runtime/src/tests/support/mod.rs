//! Shared fixtures for runtime tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::Utf8PathBuf;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use pdw_config::SCRIPT_ROOT_ENV;
use pdw_host::{Host, HostError};

use crate::locator::{RootSource, ScriptLocator, ScriptRoot};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises tests that read or write `R2DEC_WASM_HOME`.
pub(crate) fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sets or clears the script root override, restoring it on drop.
pub(crate) struct RootOverride {
    previous: Option<OsString>,
    _guard: MutexGuard<'static, ()>,
}

impl RootOverride {
    pub(crate) fn set(value: &str) -> Self {
        let guard = lock_env();
        let previous = std::env::var_os(SCRIPT_ROOT_ENV);
        unsafe { std::env::set_var(SCRIPT_ROOT_ENV, value) };
        Self {
            previous,
            _guard: guard,
        }
    }

    pub(crate) fn clear() -> Self {
        let guard = lock_env();
        let previous = std::env::var_os(SCRIPT_ROOT_ENV);
        unsafe { std::env::remove_var(SCRIPT_ROOT_ENV) };
        Self {
            previous,
            _guard: guard,
        }
    }

    /// Changes the override while keeping the original value for restore.
    pub(crate) fn update(&self, value: Option<&str>) {
        match value {
            Some(path) => unsafe { std::env::set_var(SCRIPT_ROOT_ENV, path) },
            None => unsafe { std::env::remove_var(SCRIPT_ROOT_ENV) },
        }
    }
}

impl Drop for RootOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(SCRIPT_ROOT_ENV, value) },
            None => unsafe { std::env::remove_var(SCRIPT_ROOT_ENV) },
        }
    }
}

/// Temporary script bundle.
pub(crate) struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub(crate) fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create script dir"),
        }
    }

    pub(crate) fn with(self, name: &str, content: &str) -> Self {
        self.write(name, content);
        self
    }

    pub(crate) fn write(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create script subdirectory");
        }
        fs::write(path, content).expect("write script");
    }

    pub(crate) fn path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    pub(crate) fn root(&self) -> ScriptRoot {
        ScriptRoot::new(self.path(), RootSource::Configured)
    }

    pub(crate) fn locator(&self) -> ScriptLocator {
        ScriptLocator::new(Some(self.root()))
    }
}

/// Host double that records commands and console output.
#[derive(Default)]
pub(crate) struct RecordingHost {
    replies: HashMap<String, String>,
    commands: RefCell<Vec<String>>,
    console: RefCell<String>,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, command: &str, output: &str) -> Self {
        self.replies.insert(command.to_owned(), output.to_owned());
        self
    }

    pub(crate) fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub(crate) fn console(&self) -> String {
        self.console.borrow().clone()
    }

    pub(crate) fn console_lines(&self) -> Vec<String> {
        self.console.borrow().lines().map(str::to_owned).collect()
    }
}

impl Host for RecordingHost {
    fn cmd(&self, command: &str) -> Result<String, HostError> {
        self.commands.borrow_mut().push(command.to_owned());
        Ok(self.replies.get(command).cloned().unwrap_or_default())
    }

    fn print(&self, text: &str) {
        self.console.borrow_mut().push_str(text);
    }
}

/// In-memory writer whose contents stay readable after it is boxed.
#[derive(Clone, Default)]
pub(crate) struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Termination routine for tests; unwinds instead of aborting.
pub(crate) fn unwind_instead_of_abort() -> ! {
    panic!("process terminated by fatal trap");
}

/// Bootstrap that defines a CommonJS-style `require` on top of the bridge.
pub(crate) const BOOTSTRAP: &str = r"
var require = function (name) {
    var module = { exports: {} };
    var body = ___internal_require(name);
    (new Function('module', 'exports', body))(module, module.exports);
    return module.exports;
};
";

/// Entry script that prints its arguments as JSON.
pub(crate) const ECHO_ENTRY: &str = r"
function r2dec_main(args) {
    console.log(JSON.stringify(args));
}
";
