//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use herald_framework::{DispatcherConfig, LoadPolicy};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Prefixes, languages and owners.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Where commands are loaded from.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Literal prefix that always addresses the bot.
    #[serde(default = "default_fixed_prefix")]
    pub fixed_prefix: String,

    /// Default prefix; an empty string disables it.
    #[serde(default = "default_global_prefix")]
    pub global_prefix: Option<String>,

    /// Language used when a user has none configured.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// User ids with owner rights.
    #[serde(default)]
    pub owners: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fixed_prefix: default_fixed_prefix(),
            global_prefix: default_global_prefix(),
            default_language: default_language(),
            owners: Vec::new(),
        }
    }
}

impl DispatchConfig {
    /// Converts to the dispatcher's settings.
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            fixed_prefix: self.fixed_prefix.clone(),
            global_prefix: self.global_prefix.clone().filter(|p| !p.is_empty()),
            default_language: self.default_language.clone(),
            owners: self.owners.clone(),
        }
    }
}

fn default_fixed_prefix() -> String {
    "mai".to_string()
}

fn default_global_prefix() -> Option<String> {
    Some("!".to_string())
}

fn default_language() -> String {
    "en-us".to_string()
}

// =============================================================================
// Commands
// =============================================================================

/// Command tree settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Root of the `<group>/<command>` tree.
    #[serde(default = "default_commands_root")]
    pub root: PathBuf,

    /// Names starting with this marker are skipped.
    #[serde(default = "default_exclusion_marker")]
    pub exclusion_marker: String,

    /// What to do when one command fails to load.
    #[serde(default)]
    pub load_policy: LoadPolicy,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            root: default_commands_root(),
            exclusion_marker: default_exclusion_marker(),
            load_policy: LoadPolicy::default(),
        }
    }
}

fn default_commands_root() -> PathBuf {
    PathBuf::from("commands")
}

fn default_exclusion_marker() -> String {
    "_".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lower-case name, as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// The matching `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to compact otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    /// Span lifecycle events.
    #[serde(default)]
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            thread_ids: false,
            file_location: false,
            filters: BTreeMap::new(),
            span_events: SpanEventConfig::default(),
        }
    }
}
