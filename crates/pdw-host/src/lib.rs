//! Host-side collaborators for the `pdw` decompiler bridge.
//!
//! The decompiler runs inside an embedded interpreter and reaches back into
//! the disassembler through a [`Host`]. This crate defines that seam and the
//! pieces that sit around it:
//!
//! - [`HostLink`] carries the host into interpreter callbacks for exactly the
//!   lifetime of one session. Callbacks capture a clone of the link when they
//!   are registered; once the session's [`AttachedHost`] guard drops, every
//!   clone observes [`HostError::NoActiveHost`].
//! - [`SettingsOverlay`] answers reads and writes of the plugin's own
//!   settings (`pdw.casts`, `pdw.theme`) for hosts that do not store them.
//! - [`R2Pipe`] drives a disassembler process over the NUL-delimited pipe
//!   protocol.
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use pdw_host::{Host, HostLink, R2Pipe, SettingsOverlay};
//!
//! # fn main() -> Result<(), pdw_host::HostError> {
//! let pipe = R2Pipe::spawn("r2", "/bin/ls".as_ref(), Box::new(std::io::stdout()))?;
//! let host: Rc<dyn Host> = Rc::new(SettingsOverlay::new(pipe));
//! let link = HostLink::new();
//! {
//!     let _attached = link.attach(Rc::clone(&host))?;
//!     let arch = link.cmd("e asm.arch")?;
//!     link.print(&arch)?;
//! }
//! assert!(!link.is_attached());
//! # Ok(()) }
//! ```

mod error;
mod link;
mod pipe;
mod settings;

pub use error::HostError;
pub use link::{AttachedHost, HostLink};
pub use pipe::R2Pipe;
pub use settings::{PluginSettings, SettingKey, SettingsError, SettingsOverlay};

/// The disassembly host as seen by the bridge.
///
/// Implementations execute host commands and own the user-visible console.
/// Both calls are synchronous; the bridge never calls a host from more than
/// one thread.
pub trait Host {
    /// Executes a host command line and returns its textual output.
    ///
    /// Output is returned verbatim, including empty output and any error
    /// text the host itself prints for a failing command.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] only when the host could not be reached at
    /// all, for example when its process pipe is closed.
    fn cmd(&self, command: &str) -> Result<String, HostError>;

    /// Writes text to the host console without adding a line terminator.
    fn print(&self, text: &str);
}

impl<H: Host + ?Sized> Host for Box<H> {
    fn cmd(&self, command: &str) -> Result<String, HostError> {
        (**self).cmd(command)
    }

    fn print(&self, text: &str) {
        (**self).print(text);
    }
}

impl<H: Host + ?Sized> Host for std::rc::Rc<H> {
    fn cmd(&self, command: &str) -> Result<String, HostError> {
        (**self).cmd(command)
    }

    fn print(&self, text: &str) {
        (**self).print(text);
    }
}
