//! Native functions exposed to scripts.
//!
//! [`install`] binds the host command function, the two script loaders and a
//! `console` object into the global namespace of a context. Every function
//! holds a clone of the session's [`HostLink`], so it reaches whichever host
//! is attached when it is called and fails cleanly when none is.

use std::rc::Rc;

use rquickjs::convert::Coerced;
use rquickjs::function::{Opt, Rest};
use rquickjs::{Ctx, Exception, Function, Object, Value};
use tracing::{debug, trace, warn};

use pdw_host::{HostError, HostLink};

use crate::error::LocateError;
use crate::locator::{ScriptLocator, module_file_name};

const BRIDGE_TARGET: &str = "pdw_runtime::bridge";

/// Runs a host command and returns its output.
pub const HOST_COMMAND: &str = "r2cmd";
/// Returns the text of a script named relative to the root.
pub const LOAD_FUNCTION: &str = "___internal_load";
/// Returns the text of a module, appending `.js` to its name.
pub const REQUIRE_FUNCTION: &str = "___internal_require";
/// Global object carrying the console methods.
pub const CONSOLE_OBJECT: &str = "console";

const CONSOLE_METHODS: [&str; 6] = ["log", "info", "warn", "error", "debug", "trace"];

#[derive(Debug, Clone, Copy)]
enum Lookup {
    Direct,
    Module,
}

impl Lookup {
    const fn function(self) -> &'static str {
        match self {
            Self::Direct => LOAD_FUNCTION,
            Self::Module => REQUIRE_FUNCTION,
        }
    }

    fn resolve(self, locator: &ScriptLocator, name: &str) -> Result<String, LocateError> {
        match self {
            Self::Direct => locator.load(name),
            Self::Module => locator.require(name),
        }
    }

    // Name shown to the user; modules are reported with their extension.
    fn shown_name(self, name: &str) -> String {
        match self {
            Self::Direct => name.to_owned(),
            Self::Module => module_file_name(name).unwrap_or_else(|_| format!("{name}.js")),
        }
    }
}

/// Registers the callback surface into the globals of `ctx`.
///
/// # Errors
///
/// Returns the engine error if a function or object cannot be created.
pub fn install<'js>(
    ctx: &Ctx<'js>,
    link: &HostLink,
    locator: &Rc<ScriptLocator>,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    globals.set(HOST_COMMAND, host_command(ctx, link.clone())?)?;
    globals.set(
        LOAD_FUNCTION,
        lookup(ctx, link.clone(), Rc::clone(locator), Lookup::Direct)?,
    )?;
    globals.set(
        REQUIRE_FUNCTION,
        lookup(ctx, link.clone(), Rc::clone(locator), Lookup::Module)?,
    )?;
    globals.set(CONSOLE_OBJECT, console(ctx, link)?)?;
    debug!(target: BRIDGE_TARGET, "callback surface installed");
    Ok(())
}

fn host_command<'js>(ctx: &Ctx<'js>, link: HostLink) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, command: Opt<Value<'js>>| -> rquickjs::Result<String> {
            let command = string_argument(&ctx, HOST_COMMAND, command)?;
            trace!(target: BRIDGE_TARGET, command = %command, "host command");
            link.cmd(&command)
                .map_err(|err| host_failure(&ctx, HOST_COMMAND, &err))
        },
    )?
    .with_name(HOST_COMMAND)
}

fn lookup<'js>(
    ctx: &Ctx<'js>,
    link: HostLink,
    locator: Rc<ScriptLocator>,
    form: Lookup,
) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, name: Opt<Value<'js>>| -> rquickjs::Result<String> {
            let name = string_argument(&ctx, form.function(), name)?;
            form.resolve(&locator, &name).map_err(|err| {
                debug!(
                    target: BRIDGE_TARGET,
                    function = form.function(),
                    name = %name,
                    error = %err,
                    "script lookup failed"
                );
                let shown = form.shown_name(&name);
                if let Err(print_err) = link.print(&format!("Error: '{shown}' not found.\n")) {
                    warn!(target: BRIDGE_TARGET, error = %print_err, "lookup diagnostic dropped");
                }
                Exception::throw_type(&ctx, &format!("{}: {err}", form.function()))
            })
        },
    )?
    .with_name(form.function())
}

fn console<'js>(ctx: &Ctx<'js>, link: &HostLink) -> rquickjs::Result<Object<'js>> {
    let console = Object::new(ctx.clone())?;
    for method in CONSOLE_METHODS {
        let link = link.clone();
        let print = Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, parts: Rest<Coerced<String>>| -> rquickjs::Result<()> {
                let line = join_line(parts.0.into_iter().map(|part| part.0));
                link.print(&line)
                    .map_err(|err| host_failure(&ctx, CONSOLE_OBJECT, &err))
            },
        )?
        .with_name(method)?;
        console.set(method, print)?;
    }
    Ok(console)
}

/// Joins console arguments with single spaces and terminates the line.
pub(crate) fn join_line(parts: impl IntoIterator<Item = String>) -> String {
    let mut line = parts.into_iter().collect::<Vec<_>>().join(" ");
    line.push('\n');
    line
}

fn string_argument<'js>(
    ctx: &Ctx<'js>,
    function: &str,
    value: Opt<Value<'js>>,
) -> rquickjs::Result<String> {
    match value.0.as_ref().and_then(Value::as_string) {
        Some(text) => text.to_string(),
        None => Err(Exception::throw_type(
            ctx,
            &format!("{function}: expected a string argument"),
        )),
    }
}

fn host_failure(ctx: &Ctx<'_>, function: &str, err: &HostError) -> rquickjs::Error {
    warn!(target: BRIDGE_TARGET, function, error = %err, "host unavailable");
    Exception::throw_internal(ctx, &format!("{function}: {err}"))
}
