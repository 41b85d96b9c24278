//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic base configuration ([`ConfigLoader::merge`])
//! 3. Profile-specific config file (`herald.{profile}.toml`)
//! 4. Main config file (`herald.toml`)
//! 5. Environment variables (`HERALD_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `HERALD_` prefix with `__` as
//! separator:
//!
//! - `HERALD_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `HERALD_DISPATCH__GLOBAL_PREFIX=?` → `dispatch.global_prefix = "?"`
//! - `HERALD_COMMANDS__LOAD_POLICY=collect-and-report`
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/herald.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::HeraldConfig;
use super::validation::validate_config;

const BASE_FILE: &str = "herald.toml";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the short forms `dev` and `prod`.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `HERALD_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("HERALD_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
#[derive(Debug)]
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("herald"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Replaces the built-in defaults with `config`. Files and the
    /// environment still override it.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<HeraldConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: HeraldConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            commands_root = %config.commands.root.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HeraldConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with HERALD_ prefix");
            figment = figment.merge(Env::prefixed("HERALD_").ignore(&["profile"]).split("__"));
        }

        Ok(figment)
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("herald"));
        }
        paths
    }

    /// Merges the profile file and the base file of the first search path
    /// that has a base file.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let profile_name = format!("herald.{}.toml", self.profile.as_str());

        for search_path in self.resolve_search_paths() {
            let profile_path = search_path.join(&profile_name);
            if profile_path.exists() {
                debug!(path = %profile_path.display(), "Loading profile-specific config");
                figment = figment.merge(Toml::file(&profile_path));
            }

            let base_path = search_path.join(BASE_FILE);
            if base_path.exists() {
                info!(path = %base_path.display(), "Loading configuration file");
                return figment.merge(Toml::file(&base_path));
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<HeraldConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<HeraldConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, LogOutput};
    use herald_framework::LoadPolicy;
    use std::fs;

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config, HeraldConfig::default());
        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.dispatch.fixed_prefix, "mai");
        assert_eq!(config.dispatch.global_prefix.as_deref(), Some("!"));
        assert_eq!(config.commands.exclusion_marker, "_");
    }

    #[test]
    fn test_profile_file_is_overridden_by_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("herald.production.toml"),
            "[dispatch]\nglobal_prefix = \"?\"\nowners = [\"1\"]\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("herald.toml"),
            "[dispatch]\nglobal_prefix = \">\"\n\n[commands]\nload_policy = \"collect-and-report\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .profile("prod")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.dispatch.global_prefix.as_deref(), Some(">"));
        assert_eq!(config.dispatch.owners, vec!["1"]);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.commands.load_policy, LoadPolicy::CollectAndReport);
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[commands]\nroot = \"/srv/commands\"\n\n[logging]\noutput = \"stderr\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new().file(&path).without_env().load().unwrap();
        assert_eq!(config.commands.root, PathBuf::from("/srv/commands"));
        assert_eq!(config.logging.output, LogOutput::Stderr);

        let missing = ConfigLoader::new()
            .file(dir.path().join("nope.toml"))
            .without_env()
            .load();
        assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

        let yaml = dir.path().join("herald.yaml");
        fs::write(&yaml, "dispatch: {}").unwrap();
        let unsupported = ConfigLoader::new().file(&yaml).without_env().load();
        assert!(matches!(unsupported, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("herald.toml"),
            "[dispatch]\nfixed_prefix = \"\"\n",
        )
        .unwrap();

        let result = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_programmatic_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = HeraldConfig::default();
        overrides.dispatch.owners = vec!["42".into()];

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(overrides)
            .load()
            .unwrap();
        assert_eq!(config.dispatch.owners, vec!["42"]);
    }

    #[test]
    fn test_environment_overrides() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: only this test reads HERALD_ variables with the env provider enabled.
        unsafe {
            std::env::set_var("HERALD_DISPATCH__FIXED_PREFIX", "bot");
        }
        let config = ConfigLoader::new().search_path(dir.path()).load();
        unsafe {
            std::env::remove_var("HERALD_DISPATCH__FIXED_PREFIX");
        }
        assert_eq!(config.unwrap().dispatch.fixed_prefix, "bot");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
