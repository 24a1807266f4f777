//! Session-scoped access to the host from interpreter callbacks.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::Host;
use crate::error::HostError;

/// Tracing target for host link lifecycle events.
const LINK_TARGET: &str = "pdw_host::link";

type Slot = Rc<RefCell<Option<Rc<dyn Host>>>>;

/// Shared handle through which callbacks reach the host of the active
/// session.
///
/// Clones share one slot. The slot is filled by [`HostLink::attach`] and
/// emptied when the returned [`AttachedHost`] drops, so a callback that
/// outlives its session sees [`HostError::NoActiveHost`] instead of a stale
/// host.
#[derive(Clone, Default)]
pub struct HostLink {
    slot: Slot,
}

impl HostLink {
    /// Creates a detached link.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a host for the lifetime of the returned guard.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyAttached`] if another guard is live.
    pub fn attach(&self, host: Rc<dyn Host>) -> Result<AttachedHost, HostError> {
        let mut slot = self.slot.borrow_mut();
        if slot.is_some() {
            return Err(HostError::AlreadyAttached);
        }
        *slot = Some(host);
        debug!(target: LINK_TARGET, "host attached");
        Ok(AttachedHost {
            slot: Rc::clone(&self.slot),
        })
    }

    /// Reports whether a session currently holds the host.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Runs a host command through the attached host.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NoActiveHost`] when detached, or the host's own
    /// transport error.
    pub fn cmd(&self, command: &str) -> Result<String, HostError> {
        self.current()?.cmd(command)
    }

    /// Prints to the attached host's console.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NoActiveHost`] when detached.
    pub fn print(&self, text: &str) -> Result<(), HostError> {
        self.current()?.print(text);
        Ok(())
    }

    // The slot borrow ends before the host runs, so a host that re-enters
    // the link does not trip the `RefCell`.
    fn current(&self) -> Result<Rc<dyn Host>, HostError> {
        self.slot.borrow().clone().ok_or(HostError::NoActiveHost)
    }
}

impl fmt::Debug for HostLink {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HostLink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Guard that keeps a host attached to a [`HostLink`].
///
/// Dropping the guard detaches the host on every exit path, including early
/// returns and unwinding.
#[must_use = "the host detaches as soon as the guard is dropped"]
pub struct AttachedHost {
    slot: Slot,
}

impl fmt::Debug for AttachedHost {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("AttachedHost").finish_non_exhaustive()
    }
}

impl Drop for AttachedHost {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.try_borrow_mut() {
            slot.take();
            debug!(target: LINK_TARGET, "host detached");
        }
    }
}

#[cfg(test)]
mod tests;
