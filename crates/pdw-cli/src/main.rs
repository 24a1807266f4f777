//! Command loop for the r2dec decompiler bridge.
//!
//! The binary delegates to [`pdw_cli::run`], which loads configuration, opens
//! the requested binary in the disassembler, and feeds command lines through
//! the `pdw` dispatcher.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    pdw_cli::run(
        std::env::args_os(),
        io::stdin().lock(),
        &mut stdout,
        &mut stderr,
    )
}
