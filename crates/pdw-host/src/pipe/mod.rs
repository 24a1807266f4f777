//! Disassembler host driven over the NUL-delimited pipe protocol.
//!
//! [`R2Pipe`] launches the disassembler with `-q0`, which makes it print a
//! single NUL byte once the binary is loaded and another after the output of
//! every command read from stdin. [`Host::cmd`] writes each line of its
//! command text and reads one NUL-terminated reply per line.

use std::cell::RefCell;
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::Host;
use crate::error::HostError;

/// Tracing target for pipe host operations.
const PIPE_TARGET: &str = "pdw_host::pipe";

/// Grace period granted to the disassembler to exit after `q!`.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Interactive disassembler session reached through its standard streams.
pub struct R2Pipe {
    program: String,
    target: PathBuf,
    child: Child,
    stdin: RefCell<ChildStdin>,
    stdout: RefCell<BufReader<ChildStdout>>,
    console: RefCell<Box<dyn Write>>,
}

impl R2Pipe {
    /// Launches `program -q0 target` and waits until the binary is loaded.
    ///
    /// Text passed to [`Host::print`] is written to `console`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Spawn`] when the process cannot start,
    /// [`HostError::MissingStream`] when a pipe was not captured, and
    /// [`HostError::Closed`] when the process exits before signalling
    /// readiness.
    pub fn spawn(
        program: &str,
        target: &Path,
        console: Box<dyn Write>,
    ) -> Result<Self, HostError> {
        debug!(
            target: PIPE_TARGET,
            program,
            binary = %target.display(),
            "spawning disassembler host"
        );

        let mut child = Command::new(program)
            .arg("-q0")
            .arg(target)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| HostError::Spawn {
                program: program.to_owned(),
                target: target.to_path_buf(),
                source: Arc::new(err),
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(HostError::MissingStream { stream: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(HostError::MissingStream { stream: "stdout" })?;

        let pipe = Self {
            program: program.to_owned(),
            target: target.to_path_buf(),
            child,
            stdin: RefCell::new(stdin),
            stdout: RefCell::new(BufReader::new(stdout)),
            console: RefCell::new(console),
        };

        // The banner before the first NUL carries no command output.
        let banner = pipe.read_reply()?;
        debug!(
            target: PIPE_TARGET,
            banner_bytes = banner.len(),
            "disassembler host ready"
        );
        Ok(pipe)
    }

    /// Binary opened by the host.
    #[must_use]
    pub fn target(&self) -> &Path {
        self.target.as_path()
    }

    fn send(&self, command: &str) -> Result<(), HostError> {
        let mut stdin = self.stdin.borrow_mut();
        stdin
            .write_all(command.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .map_err(HostError::io)
    }

    /// Reads bytes up to the next NUL delimiter.
    fn read_reply(&self) -> Result<String, HostError> {
        let mut buffer = Vec::new();
        let bytes_read = self
            .stdout
            .borrow_mut()
            .read_until(0, &mut buffer)
            .map_err(HostError::io)?;

        if buffer.pop() != Some(0) {
            debug!(target: PIPE_TARGET, bytes_read, "host pipe closed mid-reply");
            return Err(HostError::Closed);
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Waits for the child to exit after `q!`, killing it past the grace
    /// period.
    fn wait_for_exit(&mut self) {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(20);

        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(target: PIPE_TARGET, ?status, "disassembler host exited");
                    return;
                }
                Ok(None) if start.elapsed() <= EXIT_GRACE => {
                    std::thread::sleep(poll_interval);
                }
                Ok(None) => {
                    warn!(
                        target: PIPE_TARGET,
                        program = %self.program,
                        "disassembler host ignored quit, killing process"
                    );
                    drop(self.child.kill());
                    drop(self.child.wait());
                    return;
                }
                Err(err) => {
                    warn!(target: PIPE_TARGET, error = %err, "failed to poll host exit");
                    return;
                }
            }
        }
    }
}

impl Host for R2Pipe {
    fn cmd(&self, command: &str) -> Result<String, HostError> {
        // The host reads one command per line and frames each reply with a
        // NUL, so multi-line text is sent line by line.
        let mut output = String::new();
        for line in command.lines().filter(|line| !line.trim().is_empty()) {
            debug!(target: PIPE_TARGET, command = line, "sending host command");
            self.send(line)?;
            let reply = self.read_reply()?;
            debug!(
                target: PIPE_TARGET,
                command = line,
                output_bytes = reply.len(),
                "host command completed"
            );
            output.push_str(&reply);
        }
        Ok(output)
    }

    fn print(&self, text: &str) {
        let mut console = self.console.borrow_mut();
        if let Err(err) = console
            .write_all(text.as_bytes())
            .and_then(|()| console.flush())
        {
            warn!(target: PIPE_TARGET, error = %err, "failed to write host console");
        }
    }
}

impl Drop for R2Pipe {
    fn drop(&mut self) {
        if let Err(err) = self.send("q!") {
            debug!(target: PIPE_TARGET, error = %err, "host pipe already closed");
        }
        self.wait_for_exit();
    }
}

impl fmt::Debug for R2Pipe {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("R2Pipe")
            .field("program", &self.program)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
