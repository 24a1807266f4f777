//! Plugin settings answered on behalf of hosts that do not store them.
//!
//! The decompiler bundle reads its options with ordinary host commands such
//! as `e pdw.casts`. A host that never registered those variables would
//! reject the read, so [`SettingsOverlay`] intercepts `e pdw.*` commands and
//! forwards everything else untouched.

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::Host;
use crate::error::HostError;

const SETTINGS_TARGET: &str = "pdw_host::settings";

/// Plugin option names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    /// `pdw.casts`: show type casts in the pseudo code.
    Casts,
    /// `pdw.theme`: colour theme used by the decompiler.
    Theme,
}

impl SettingKey {
    /// Every plugin option, in help order.
    pub const ALL: [Self; 2] = [Self::Casts, Self::Theme];

    /// Fully qualified variable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Casts => "pdw.casts",
            Self::Theme => "pdw.theme",
        }
    }

    /// One-line description shown in help output.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Casts => "if false, hides all casts in the pseudo code.",
            Self::Theme => "defines the color theme to be used on r2dec.",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == input)
            .ok_or_else(|| SettingsError::UnknownKey {
                key: input.to_owned(),
            })
    }
}

/// Errors raised while reading or writing plugin settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The variable is in the plugin namespace but is not defined.
    #[error("unknown variable '{key}'")]
    UnknownKey {
        /// Variable that was requested.
        key: String,
    },
    /// A boolean option received a value that is not a boolean.
    #[error("invalid value '{value}' for '{key}', expected true or false")]
    InvalidBool {
        /// Variable being assigned.
        key: SettingKey,
        /// Rejected value.
        value: String,
    },
}

/// Current values of the plugin options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSettings {
    casts: bool,
    theme: String,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            casts: false,
            theme: String::from("default"),
        }
    }
}

impl PluginSettings {
    /// Whether casts are shown.
    #[must_use]
    pub const fn casts(&self) -> bool {
        self.casts
    }

    /// Selected colour theme.
    #[must_use]
    pub fn theme(&self) -> &str {
        self.theme.as_str()
    }

    /// Renders a value the way the host prints variables.
    #[must_use]
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::Casts => self.casts.to_string(),
            SettingKey::Theme => self.theme.clone(),
        }
    }

    /// Assigns a value from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBool`] when a boolean option receives
    /// anything other than `true`, `false`, `1`, or `0`.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        match key {
            SettingKey::Casts => {
                self.casts = parse_bool(value).ok_or_else(|| SettingsError::InvalidBool {
                    key,
                    value: value.to_owned(),
                })?;
            }
            SettingKey::Theme => value.clone_into(&mut self.theme),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// A recognised `e pdw.*` command.
#[derive(Debug, PartialEq, Eq)]
enum SettingsCommand<'a> {
    Get(&'a str),
    Set(&'a str, &'a str),
}

impl<'a> SettingsCommand<'a> {
    /// Parses `e pdw.key`, `e pdw.key=value`, and `e pdw.key = value`.
    fn parse(command: &'a str) -> Option<Self> {
        let rest = command.trim().strip_prefix("e ")?.trim_start();
        match rest.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                key.starts_with("pdw.")
                    .then(|| Self::Set(key, value.trim()))
            }
            None => rest.starts_with("pdw.").then_some(Self::Get(rest.trim_end())),
        }
    }
}

/// Host wrapper that owns the plugin settings.
pub struct SettingsOverlay<H> {
    inner: H,
    settings: RefCell<PluginSettings>,
}

impl<H> SettingsOverlay<H> {
    /// Wraps a host with default settings.
    #[must_use]
    pub fn new(inner: H) -> Self {
        Self::with_settings(inner, PluginSettings::default())
    }

    /// Wraps a host with explicit settings.
    #[must_use]
    pub const fn with_settings(inner: H, settings: PluginSettings) -> Self {
        Self {
            inner,
            settings: RefCell::new(settings),
        }
    }

    /// Snapshot of the current settings.
    #[must_use]
    pub fn settings(&self) -> PluginSettings {
        self.settings.borrow().clone()
    }

    /// The wrapped host.
    #[must_use]
    pub const fn inner(&self) -> &H {
        &self.inner
    }

    fn answer(&self, command: &SettingsCommand<'_>) -> Result<String, SettingsError> {
        match *command {
            SettingsCommand::Get(name) => {
                let key: SettingKey = name.parse()?;
                Ok(format!("{}\n", self.settings.borrow().get(key)))
            }
            SettingsCommand::Set(name, value) => {
                let key: SettingKey = name.parse()?;
                self.settings.borrow_mut().set(key, value)?;
                debug!(target: SETTINGS_TARGET, %key, value, "plugin setting updated");
                Ok(String::new())
            }
        }
    }
}

impl<H: Host> Host for SettingsOverlay<H> {
    fn cmd(&self, command: &str) -> Result<String, HostError> {
        let Some(parsed) = SettingsCommand::parse(command) else {
            return self.inner.cmd(command);
        };
        // Setting errors are ordinary command output, the way the host
        // reports a bad `e` assignment.
        Ok(self
            .answer(&parsed)
            .unwrap_or_else(|error| format!("ERROR: {error}\n")))
    }

    fn print(&self, text: &str) {
        self.inner.print(text);
    }
}

impl<H> fmt::Debug for SettingsOverlay<H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SettingsOverlay")
            .field("settings", &self.settings.borrow())
            .finish_non_exhaustive()
    }
}
