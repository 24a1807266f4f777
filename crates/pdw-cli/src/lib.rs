//! Command-loop runtime for the `pdw` binary.
//!
//! The runtime splits configuration flags from the command line, loads
//! configuration, installs telemetry, opens the target binary in a
//! disassembler process, and then feeds command lines through the `pdw`
//! dispatcher. Lines the dispatcher does not claim are run by the
//! disassembler and their output is copied to stdout.
//!
//! Configuration loading and host start-up sit behind traits so tests can
//! drive the loop without a real disassembler.

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use tracing::{info, warn};

use pdw_config::Config;
use pdw_host::{Host, HostError, R2Pipe, SettingsOverlay};
use pdw_runtime::{Dispatched, Dispatcher, SessionOutcome};

mod cli;
mod config;
mod errors;
pub mod telemetry;

use cli::Cli;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use config::{prepare_cli_arguments, split_config_arguments};
pub(crate) use errors::AppError;

const LOOP_TARGET: &str = "pdw_cli";

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `pdw_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--script-root",
    "--r2-binary",
    "--memory-limit",
    "--max-stack-size",
    "--fatal-policy",
];

/// Line that ends an interactive session.
const QUIT_COMMAND: &str = "q";

/// Starts the disassembler host for a binary.
pub(crate) trait HostLauncher {
    fn launch(&self, config: &Config, binary: &Path) -> Result<Rc<dyn Host>, HostError>;
}

/// Launches `r2 -q0` and lets the overlay own the plugin settings.
pub(crate) struct PipeLauncher;

impl HostLauncher for PipeLauncher {
    fn launch(&self, config: &Config, binary: &Path) -> Result<Rc<dyn Host>, HostError> {
        let pipe = R2Pipe::spawn(config.r2_binary(), binary, Box::new(io::stdout()))?;
        Ok(Rc::new(SettingsOverlay::new(pipe)))
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader, H: HostLauncher> {
    stdout: &'a mut W,
    stderr: &'a mut E,
    loader: &'a L,
    launcher: &'a H,
}

impl<W, E, L, H> CliRunner<'_, W, E, L, H>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
    H: HostLauncher,
{
    fn run<I, R>(&mut self, args: I, input: R) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        R: BufRead,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let cli = match Cli::try_parse_from(prepare_cli_arguments(&args, &split)) {
            Ok(cli) => cli,
            Err(error) if !error.use_stderr() => {
                // --help and --version
                let _ = write!(self.stdout, "{error}");
                return ExitCode::SUCCESS;
            }
            Err(error) => return self.fail(&AppError::CliUsage(error)),
        };

        match self.run_loop(&cli, &split.config_arguments, input) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => self.fail(&error),
        }
    }

    fn run_loop<R: BufRead>(
        &mut self,
        cli: &Cli,
        config_arguments: &[OsString],
        input: R,
    ) -> Result<(), AppError> {
        let config = self.loader.load(config_arguments)?;
        telemetry::initialise(&config)?;

        let host = self
            .launcher
            .launch(&config, &cli.binary)
            .map_err(AppError::StartHost)?;
        info!(target: LOOP_TARGET, binary = %cli.binary.display(), "disassembler ready");
        let dispatcher = Dispatcher::from_config(&config);

        if !cli.commands.is_empty() {
            for line in &cli.commands {
                self.execute_line(&dispatcher, &host, line)?;
            }
            return Ok(());
        }

        for line in input.lines() {
            let line = line.map_err(AppError::ReadInput)?;
            let command = line.trim();
            if command == QUIT_COMMAND {
                break;
            }
            if command.is_empty() {
                continue;
            }
            self.execute_line(&dispatcher, &host, command)?;
        }
        Ok(())
    }

    fn execute_line(
        &mut self,
        dispatcher: &Dispatcher,
        host: &Rc<dyn Host>,
        line: &str,
    ) -> Result<(), AppError> {
        let dispatched = match dispatcher.dispatch(host, line) {
            Ok(dispatched) => dispatched,
            Err(error) => {
                warn!(target: LOOP_TARGET, line, error = %error, "pdw command failed");
                let _ = writeln!(self.stderr, "{error}");
                return Ok(());
            }
        };

        if let Dispatched::Session(outcome) = &dispatched {
            if *outcome != SessionOutcome::Completed {
                warn!(target: LOOP_TARGET, line, ?outcome, "decompiler did not complete");
            }
        }

        if dispatched.forwards_to_host() {
            let output = host.cmd(line).map_err(AppError::Host)?;
            self.stdout
                .write_all(output.as_bytes())
                .and_then(|()| self.stdout.flush())
                .map_err(AppError::WriteOutput)?;
        }
        Ok(())
    }

    fn fail(&mut self, error: &AppError) -> ExitCode {
        let _ = writeln!(self.stderr, "{error}");
        ExitCode::FAILURE
    }
}

/// Runs the command loop with the given arguments, input and output.
#[must_use]
pub fn run<I, R, W, E>(args: I, input: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with(args, input, stdout, stderr, &OrthoConfigLoader, &PipeLauncher)
}

pub(crate) fn run_with<I, R, W, E, L, H>(
    args: I,
    input: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
    launcher: &H,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
    H: HostLauncher,
{
    CliRunner {
        stdout,
        stderr,
        loader,
        launcher,
    }
    .run(args, input)
}
