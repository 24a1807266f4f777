//! Configuration loading helpers for the `pdw` command loop.
//!
//! Arguments destined for `ortho_config` are split from the rest so the
//! loader only receives supported flags while `clap` parses the binary and
//! commands.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use pdw_config::Config;

use crate::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration for the command loop.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags (listed in `CONFIG_CLI_FLAGS`) must appear before
    /// the binary. Later occurrences are parsed as command-loop arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

#[derive(Debug, Clone, Copy)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

impl OrthoConfigLoader {
    fn process_config_flag(argument: &OsStr) -> FlagAction {
        let argument_text = argument.to_string_lossy();
        let Some(flag_body) = argument_text.strip_prefix("--") else {
            return FlagAction::Skip;
        };

        let (flag_name, inline_value) = match flag_body.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag_body, false),
        };

        if super::CONFIG_CLI_FLAGS
            .iter()
            .any(|known| known.strip_prefix("--") == Some(flag_name))
        {
            return FlagAction::Include {
                needs_value: !inline_value,
            };
        }

        FlagAction::Skip
    }
}

pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some(program) = args.first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut filtered: Vec<OsString> = vec![program.clone()];
    let mut command_start = 1usize;
    let mut pending_values = 0usize;

    for argument in args.iter().skip(1) {
        if pending_values > 0 {
            filtered.push(argument.clone());
            pending_values -= 1;
            command_start += 1;
            continue;
        }

        match OrthoConfigLoader::process_config_flag(argument.as_os_str()) {
            FlagAction::Include { needs_value } => {
                filtered.push(argument.clone());
                command_start += 1;
                if needs_value {
                    pending_values = 1;
                }
            }
            FlagAction::Skip => break,
        }
    }

    ConfigArgumentSplit {
        config_arguments: filtered,
        command_start,
    }
}

/// Program name followed by everything after the configuration flags.
pub(crate) fn prepare_cli_arguments(
    args: &[OsString],
    split: &ConfigArgumentSplit,
) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.iter().skip(split.command_start))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use rstest::rstest;

    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn inline_value_flags_do_not_need_follow_up_value() {
        let result = OrthoConfigLoader::process_config_flag(OsStr::new("--log-filter=debug"));
        assert!(matches!(result, FlagAction::Include { needs_value: false }));
    }

    #[test]
    fn separate_value_flags_consume_following_argument() {
        let result = OrthoConfigLoader::process_config_flag(OsStr::new("--fatal-policy"));
        assert!(matches!(result, FlagAction::Include { needs_value: true }));
    }

    #[rstest]
    #[case::positional("/bin/ls")]
    #[case::command_flag("--command")]
    #[case::short_flag("-c")]
    #[case::prefix_only("--log")]
    fn other_arguments_stop_the_split(#[case] argument: &str) {
        let result = OrthoConfigLoader::process_config_flag(OsStr::new(argument));
        assert!(matches!(result, FlagAction::Skip));
    }

    #[test]
    fn configuration_flags_are_split_from_the_command_line() {
        let args = os_args(&[
            "pdw",
            "--log-filter",
            "debug",
            "--script-root=/opt/r2dec",
            "/bin/ls",
            "-c",
            "pdw",
            "--log-format",
            "json",
        ]);

        let split = split_config_arguments(&args);

        assert_eq!(
            split.config_arguments,
            os_args(&["pdw", "--log-filter", "debug", "--script-root=/opt/r2dec"])
        );
        assert_eq!(
            prepare_cli_arguments(&args, &split),
            os_args(&["pdw", "/bin/ls", "-c", "pdw", "--log-format", "json"])
        );
    }

    #[test]
    fn empty_arguments_produce_empty_split() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert!(prepare_cli_arguments(&[], &split).is_empty());
    }
}
