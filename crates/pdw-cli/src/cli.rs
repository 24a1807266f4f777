//! CLI argument definitions for the `pdw` command loop.

use std::path::PathBuf;

use clap::Parser;

/// Runs r2dec decompiler commands against a radare2 session.
///
/// Configuration flags (`--log-filter`, `--script-root`, ...) must precede
/// the binary.
#[derive(Parser, Debug)]
#[command(name = "pdw", version)]
pub(crate) struct Cli {
    /// Binary to open in the disassembler.
    #[arg(value_name = "BINARY")]
    pub(crate) binary: PathBuf,
    /// Command to run instead of reading standard input; may be repeated.
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    pub(crate) commands: Vec<String>,
}
