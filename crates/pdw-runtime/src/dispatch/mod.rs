//! Routing of host command lines to decompiler actions.

use std::rc::Rc;

use camino::Utf8PathBuf;
use tracing::{debug, info};

use pdw_config::Config;
use pdw_host::{Host, HostLink, SettingKey};

use crate::args::InvocationArgs;
use crate::error::DispatchError;
use crate::fatal::FatalErrorTrap;
use crate::locator::{ScriptLocator, ScriptRoot};
use crate::session::{Session, SessionOptions, SessionOutcome};

const DISPATCH_TARGET: &str = "pdw_runtime::dispatch";

/// Command prefix claimed by the dispatcher.
pub const COMMAND_PREFIX: &str = "pdw";
/// Host command that installs or upgrades the script bundle.
pub const UPDATE_COMMAND: &str = "!r2pm -ci r2dec-wasm";
/// Prefix of the host's decompiler-identity query.
pub const CONFIG_QUERY_PREFIX: &str = "e cmd.pdc";
/// Answer printed for the identity query.
pub const PLUGIN_IDENTIFIER: &str = "r2dec-wasm";

/// What a command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run the decompiler with these arguments.
    Decompile(InvocationArgs),
    /// Install or upgrade the script bundle through the host.
    Update,
    /// Print the usage text.
    Usage,
    /// Answer the host's decompiler-identity query.
    ConfigQuery,
}

/// Maps a command line to an action, or `None` when the line is not ours.
///
/// Only the first character after `pdw` selects the action.
#[must_use]
pub fn route(line: &str) -> Option<Action> {
    if line.starts_with(CONFIG_QUERY_PREFIX) && line.contains('=') && line.contains('?') {
        return Some(Action::ConfigQuery);
    }
    let rest = line.strip_prefix(COMMAND_PREFIX)?;
    let action = match rest.chars().next() {
        None => Action::Decompile(InvocationArgs::empty()),
        Some(' ') => Action::Decompile(InvocationArgs::parse(rest)),
        Some('a') => Action::Decompile(InvocationArgs::from_tokens(["--all"])),
        Some('i') => Action::Decompile(InvocationArgs::from_tokens(["--issue"])),
        Some('u') => Action::Update,
        Some(_) => Action::Usage,
    };
    Some(action)
}

/// Usage text for the `pdw` command family.
#[must_use]
pub fn usage() -> String {
    let mut text = String::from(
        "Usage: pdw [args] - core plugin for r2dec\n\
         \x20pdw   - decompile current function\n\
         \x20pdw?  - show this help\n\
         \x20pdwa  - decompile all the code segment\n\
         \x20pdwi  - generates the issue data\n\
         \x20pdwu  - install/upgrade r2dec via r2pm\n\
         Evaluable Variables:\n",
    );
    for key in SettingKey::ALL {
        text.push_str(&format!(" {:<11} - {}\n", key.name(), key.description()));
    }
    text.push_str(
        "Environment\n\
         \x20R2DEC_WASM_HOME  defaults to the root directory of the r2dec repo\n",
    );
    text
}

/// Result of dispatching one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// The line is not a `pdw` command; the host should run it.
    NotHandled,
    /// The identity query was answered; the host should still run the line.
    Announced,
    /// The line was fully handled without a session.
    Handled,
    /// A decompiler session ran.
    Session(SessionOutcome),
}

impl Dispatched {
    /// Whether the host should still process the line itself.
    #[must_use]
    pub const fn forwards_to_host(&self) -> bool {
        matches!(self, Self::NotHandled | Self::Announced)
    }
}

/// How sessions find their script root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootPolicy {
    /// Resolve per invocation: environment override, then `configured`, then
    /// the home default.
    Environment {
        /// Root from configuration.
        configured: Option<Utf8PathBuf>,
    },
    /// Always use this root.
    Pinned(ScriptRoot),
}

impl RootPolicy {
    fn locator(&self) -> ScriptLocator {
        match self {
            Self::Environment { configured } => {
                ScriptLocator::from_environment(configured.as_deref())
            }
            Self::Pinned(root) => ScriptLocator::new(Some(root.clone())),
        }
    }
}

/// Entry point for `pdw` command lines.
#[derive(Debug)]
pub struct Dispatcher {
    link: HostLink,
    roots: RootPolicy,
    options: SessionOptions,
    trap: Rc<FatalErrorTrap>,
}

impl Dispatcher {
    /// Creates a dispatcher with its own host link.
    #[must_use]
    pub fn new(options: SessionOptions, roots: RootPolicy) -> Self {
        let trap = Rc::new(FatalErrorTrap::new(options.fatal_policy()));
        Self {
            link: HostLink::new(),
            roots,
            options,
            trap,
        }
    }

    /// Creates a dispatcher from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SessionOptions::from(config),
            RootPolicy::Environment {
                configured: config.script_root.clone(),
            },
        )
    }

    /// Replaces the fatal trap used by sessions.
    #[must_use]
    pub fn with_trap(mut self, trap: FatalErrorTrap) -> Self {
        self.trap = Rc::new(trap);
        self
    }

    /// Link through which session callbacks reach the host.
    #[must_use]
    pub const fn link(&self) -> &HostLink {
        &self.link
    }

    /// Handles one command line.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Session`] when a session cannot start and
    /// [`DispatchError::Host`] when the update command cannot reach the host.
    pub fn dispatch(&self, host: &Rc<dyn Host>, line: &str) -> Result<Dispatched, DispatchError> {
        let Some(action) = route(line) else {
            return Ok(Dispatched::NotHandled);
        };
        debug!(target: DISPATCH_TARGET, line, ?action, "dispatching");
        match action {
            Action::ConfigQuery => {
                host.print(&format!("{PLUGIN_IDENTIFIER}\n"));
                Ok(Dispatched::Announced)
            }
            Action::Usage => {
                host.print(&usage());
                Ok(Dispatched::Handled)
            }
            Action::Update => {
                info!(target: DISPATCH_TARGET, command = UPDATE_COMMAND, "updating scripts");
                let output = host.cmd(UPDATE_COMMAND).map_err(DispatchError::Host)?;
                host.print(&output);
                Ok(Dispatched::Handled)
            }
            Action::Decompile(args) => {
                let session = Session::new(
                    self.link.clone(),
                    self.roots.locator(),
                    self.options.clone(),
                )
                .with_trap(Rc::clone(&self.trap));
                let outcome = session.run(Rc::clone(host), &args)?;
                Ok(Dispatched::Session(outcome))
            }
        }
    }
}
