//! Last-resort handling for unrecoverable interpreter faults.
//!
//! A fault is a panic unwinding out of the interpreter or an allocation
//! failure reported by the engine. Script exceptions never reach the trap.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::process;

use tracing::error;

use pdw_config::FatalPolicy;

const FATAL_TARGET: &str = "pdw_runtime::fatal";

/// Text written when a fault carries no message.
pub const NO_MESSAGE: &str = "no message";

/// Writes the fatal diagnostic and then applies the configured policy.
pub struct FatalErrorTrap {
    policy: FatalPolicy,
    sink: RefCell<Box<dyn Write>>,
    terminate: fn() -> !,
}

impl FatalErrorTrap {
    /// Trap that reports to stderr and aborts under [`FatalPolicy::Abort`].
    #[must_use]
    pub fn new(policy: FatalPolicy) -> Self {
        Self::with_sink(policy, Box::new(io::stderr()), process::abort)
    }

    /// Trap with an explicit diagnostic sink and termination routine.
    #[must_use]
    pub fn with_sink(policy: FatalPolicy, sink: Box<dyn Write>, terminate: fn() -> !) -> Self {
        Self {
            policy,
            sink: RefCell::new(sink),
            terminate,
        }
    }

    /// Writes `*** FATAL ERROR: <message>` and flushes the sink.
    pub fn report(&self, message: Option<&str>) {
        let message = message
            .map(str::trim_end)
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_MESSAGE);
        error!(target: FATAL_TARGET, policy = %self.policy, message, "interpreter fault");

        let mut sink = self.sink.borrow_mut();
        let written = writeln!(sink, "*** FATAL ERROR: {message}").and_then(|()| sink.flush());
        if let Err(err) = written {
            error!(target: FATAL_TARGET, error = %err, "failed to write fatal diagnostic");
        }
    }

    /// Reports the fault, then terminates under [`FatalPolicy::Abort`].
    ///
    /// Returns only under [`FatalPolicy::Contain`].
    pub fn trip(&self, message: Option<&str>) {
        self.report(message);
        if self.policy == FatalPolicy::Abort {
            (self.terminate)();
        }
    }
}

impl fmt::Debug for FatalErrorTrap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FatalErrorTrap")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Extracts the message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

#[cfg(test)]
mod tests;
