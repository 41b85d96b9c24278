//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CommandsConfig, DispatchConfig, HeraldConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_dispatch_config(&config.dispatch)?;
    validate_commands_config(&config.commands)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.fixed_prefix.is_empty() {
        return Err(ConfigError::missing_field("dispatch.fixed_prefix"));
    }

    if dispatch.default_language.trim().is_empty() {
        return Err(ConfigError::missing_field("dispatch.default_language"));
    }

    if dispatch.default_language.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Invalid default language tag: '{}'",
            dispatch.default_language
        )));
    }

    if dispatch.owners.iter().any(|o| o.is_empty()) {
        return Err(ConfigError::validation("Owner ids cannot be empty"));
    }

    Ok(())
}

fn validate_commands_config(commands: &CommandsConfig) -> ConfigResult<()> {
    if commands.exclusion_marker.is_empty() {
        return Err(ConfigError::missing_field("commands.exclusion_marker"));
    }

    if commands.root.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("commands.root"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&HeraldConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_fixed_prefix() {
        let mut config = HeraldConfig::default();
        config.dispatch.fixed_prefix.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "dispatch.fixed_prefix"
        ));
    }

    #[test]
    fn test_validate_empty_global_prefix_is_allowed() {
        let mut config = HeraldConfig::default();
        config.dispatch.global_prefix = Some(String::new());
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.dispatch.to_dispatcher_config().global_prefix, None);
    }

    #[test]
    fn test_validate_language_tag() {
        let mut config = HeraldConfig::default();
        config.dispatch.default_language = "en us".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_exclusion_marker() {
        let mut config = HeraldConfig::default();
        config.commands.exclusion_marker.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = HeraldConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/herald.log"));
        assert!(validate_config(&config).is_ok());
    }
}
