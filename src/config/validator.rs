use crate::config::Config;
use crate::error::{CarchiveError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_search(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CarchiveError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory path cannot be empty",
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.search.default_limit == 0 {
            errors.push(ValidationError::new(
                "search.default_limit",
                "Default limit must be greater than 0",
            ));
        }

        if config.search.max_limit < config.search.default_limit {
            errors.push(ValidationError::new(
                "search.max_limit",
                format!(
                    "Max limit ({}) must not be below default limit ({})",
                    config.search.max_limit, config.search.default_limit
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = PathBuf::new();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_default_limit() {
        let mut config = Config::default();
        config.search.default_limit = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_max_limit_below_default() {
        let mut config = Config::default();
        config.search.default_limit = 50;
        config.search.max_limit = 10;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
