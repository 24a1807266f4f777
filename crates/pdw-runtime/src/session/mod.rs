//! One decompiler invocation inside a fresh interpreter.
//!
//! A [`Session`] attaches the host, creates a runtime and context, installs
//! the callback surface, evaluates the bootstrap and entry scripts, and calls
//! the entry point with the invocation arguments. The interpreter is dropped
//! when the session ends and the host is detached even if a step fails.
//!
//! Script exceptions are reported to the host console and logged; they never
//! escape [`Session::run`]. Engine faults (a panic unwinding out of the
//! interpreter, or an allocation failure) go to the [`FatalErrorTrap`].

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Runtime, Value};
use tracing::{debug, error, info, warn};

use pdw_config::{Config, FatalPolicy, SCRIPT_ROOT_ENV};
use pdw_host::{Host, HostLink};

use crate::args::InvocationArgs;
use crate::bridge;
use crate::error::SessionError;
use crate::fatal::{FatalErrorTrap, panic_message};
use crate::locator::ScriptLocator;

const SESSION_TARGET: &str = "pdw_runtime::session";

/// Script evaluated first; it usually defines `require`.
pub const BOOTSTRAP_SCRIPT: &str = "require.js";
/// Script that defines the entry point.
pub const ENTRY_SCRIPT: &str = "r2dec-duk.js";
/// Global function invoked with the arguments.
pub const ENTRY_POINT: &str = "r2dec_main";
/// Printed when the entry point is not a function.
pub const MISSING_ENTRY_POINT: &str = "Fatal error. Cannot use R2_HOME_DATADIR.";

/// Script names and engine limits for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    bootstrap: String,
    entry: String,
    entry_point: String,
    memory_limit: Option<usize>,
    max_stack_size: Option<usize>,
    fatal_policy: FatalPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            bootstrap: BOOTSTRAP_SCRIPT.to_owned(),
            entry: ENTRY_SCRIPT.to_owned(),
            entry_point: ENTRY_POINT.to_owned(),
            memory_limit: None,
            max_stack_size: None,
            fatal_policy: FatalPolicy::default(),
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            memory_limit: config.memory_limit,
            max_stack_size: config.max_stack_size,
            fatal_policy: config.fatal_policy,
            ..Self::default()
        }
    }
}

impl SessionOptions {
    /// Sets the heap ceiling in bytes.
    #[must_use]
    pub const fn with_memory_limit(mut self, limit: Option<usize>) -> Self {
        self.memory_limit = limit;
        self
    }

    /// Sets the stack ceiling in bytes.
    #[must_use]
    pub const fn with_max_stack_size(mut self, size: Option<usize>) -> Self {
        self.max_stack_size = size;
        self
    }

    /// Sets the reaction to engine faults.
    #[must_use]
    pub const fn with_fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.fatal_policy = policy;
        self
    }

    /// Reaction to engine faults.
    #[must_use]
    pub const fn fatal_policy(&self) -> FatalPolicy {
        self.fatal_policy
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The entry point ran to completion.
    Completed,
    /// No entry point function was defined; the user was told how to fix
    /// the script root.
    EntryPointMissing,
    /// The entry point, or the lookup of it, threw.
    ScriptFailed {
        /// Rendered exception.
        message: String,
    },
    /// The engine faulted and the fault was contained.
    Faulted {
        /// Fault description.
        message: String,
    },
}

/// Runs decompiler scripts against an attached host.
#[derive(Debug)]
pub struct Session {
    link: HostLink,
    locator: Rc<ScriptLocator>,
    options: SessionOptions,
    trap: Rc<FatalErrorTrap>,
}

impl Session {
    /// Creates a session reading scripts through `locator`.
    #[must_use]
    pub fn new(link: HostLink, locator: ScriptLocator, options: SessionOptions) -> Self {
        let trap = Rc::new(FatalErrorTrap::new(options.fatal_policy));
        Self {
            link,
            locator: Rc::new(locator),
            options,
            trap,
        }
    }

    /// Replaces the fatal trap.
    #[must_use]
    pub fn with_trap(mut self, trap: Rc<FatalErrorTrap>) -> Self {
        self.trap = trap;
        self
    }

    /// Runs one invocation with `host` attached.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Host`] when another session holds the link
    /// and [`SessionError::Engine`] when the interpreter cannot be created.
    pub fn run(
        &self,
        host: Rc<dyn Host>,
        args: &InvocationArgs,
    ) -> Result<SessionOutcome, SessionError> {
        let _attached = self.link.attach(host)?;
        let runtime = Runtime::new().map_err(SessionError::Engine)?;
        if let Some(limit) = self.options.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(size) = self.options.max_stack_size {
            runtime.set_max_stack_size(size);
        }
        let context = Context::full(&runtime).map_err(SessionError::Engine)?;
        debug!(
            target: SESSION_TARGET,
            args = ?args.as_slice(),
            root = ?self.locator.root().map(ToString::to_string),
            "session started"
        );

        let driven = panic::catch_unwind(AssertUnwindSafe(|| {
            context.with(|ctx| self.drive(&ctx, args))
        }));
        let outcome = match driven {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => self.fault(err.to_string(), context, runtime),
            Err(payload) => {
                let message = panic_message(payload.as_ref())
                    .unwrap_or_else(|| String::from("interpreter panicked"));
                self.fault(message, context, runtime)
            }
        };
        debug!(target: SESSION_TARGET, ?outcome, "session finished");
        Ok(outcome)
    }

    fn drive<'js>(
        &self,
        ctx: &Ctx<'js>,
        args: &InvocationArgs,
    ) -> rquickjs::Result<SessionOutcome> {
        bridge::install(ctx, &self.link, &self.locator)?;
        self.evaluate(ctx, &self.options.bootstrap)?;
        self.evaluate(ctx, &self.options.entry)?;

        let lookup = ctx
            .globals()
            .get::<_, Value<'js>>(self.options.entry_point.as_str())
            .catch(ctx);
        let entry_point = match lookup {
            Ok(value) => value,
            Err(caught) => {
                let message = self.script_error(&self.options.entry_point, caught)?;
                return Ok(SessionOutcome::ScriptFailed { message });
            }
        };
        let Some(main) = entry_point.as_function() else {
            warn!(
                target: SESSION_TARGET,
                entry_point = %self.options.entry_point,
                "entry point is not defined"
            );
            self.print(&format!(
                "{MISSING_ENTRY_POINT}\nSet {SCRIPT_ROOT_ENV} to the r2dec-wasm checkout.\n"
            ));
            return Ok(SessionOutcome::EntryPointMissing);
        };

        match main.call::<_, ()>((args.as_slice().to_vec(),)).catch(ctx) {
            Ok(()) => Ok(SessionOutcome::Completed),
            Err(caught) => {
                let message = self.script_error(&self.options.entry_point, caught)?;
                Ok(SessionOutcome::ScriptFailed { message })
            }
        }
    }

    // A missing script is skipped; an exception is reported and tolerated.
    fn evaluate(&self, ctx: &Ctx<'_>, name: &str) -> rquickjs::Result<()> {
        let source = match self.locator.load(name) {
            Ok(source) => source,
            Err(err) => {
                info!(target: SESSION_TARGET, script = name, error = %err, "script skipped");
                return Ok(());
            }
        };
        if let Err(caught) = ctx.eval::<(), _>(source).catch(ctx) {
            self.script_error(name, caught)?;
        }
        Ok(())
    }

    // Allocation failures are engine faults, everything else is the script's.
    fn script_error(&self, stage: &str, caught: CaughtError<'_>) -> rquickjs::Result<String> {
        if let CaughtError::Error(rquickjs::Error::Allocation) = caught {
            return Err(rquickjs::Error::Allocation);
        }
        let message = caught.to_string();
        error!(target: SESSION_TARGET, stage, error = %message, "script raised an exception");
        self.print(&format!("{}\n", message.trim_end()));
        Ok(message)
    }

    fn fault(&self, message: String, context: Context, runtime: Runtime) -> SessionOutcome {
        self.trap.trip(Some(&message));
        // Contained: the faulted engine is abandoned without running its
        // destructors.
        mem::forget(context);
        mem::forget(runtime);
        SessionOutcome::Faulted { message }
    }

    fn print(&self, text: &str) {
        if let Err(err) = self.link.print(text) {
            warn!(target: SESSION_TARGET, error = %err, "console output dropped");
        }
    }
}
