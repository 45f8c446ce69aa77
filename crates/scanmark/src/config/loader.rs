use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.scrub.line_limit < config.scrub.header_lines {
        return Err(ConfigError::Validation {
            message: format!(
                "scrub.line_limit ({}) must not be smaller than scrub.header_lines ({})",
                config.scrub.line_limit, config.scrub.header_lines
            ),
        });
    }

    if config.scrub.replacement.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "scrub.replacement must not be empty".to_string(),
        });
    }

    if config.scrub.min_name_length == 0 {
        return Err(ConfigError::Validation {
            message: "scrub.min_name_length must be at least 1".to_string(),
        });
    }

    if config.retention.days == 0 {
        return Err(ConfigError::Validation {
            message: "retention.days must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "names_directory": "/data/names",
            "jobs_directory": "/data/jobs"
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.names_directory, "/data/names");
        assert_eq!(config.jobs_directory, "/data/jobs");
        assert_eq!(config.unknown_label, "Unknown Student");
        assert_eq!(config.scrub.line_limit, 20);
        assert_eq!(config.scrub.header_lines, 3);
        assert_eq!(config.scrub.replacement, "[STUDENT_NAME]");
        assert_eq!(config.retention.days, 210);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_load_config_with_scrub_overrides() {
        let config_json = r#"
        {
            "version": "1.0",
            "names_directory": "/data/names",
            "jobs_directory": "/data/jobs",
            "scrub": {
                "line_limit": 10,
                "header_lines": 2,
                "replacement": "[REDACTED]"
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.scrub.line_limit, 10);
        assert_eq!(config.scrub.header_lines, 2);
        assert_eq!(config.scrub.replacement, "[REDACTED]");
        // Unspecified field keeps its default.
        assert_eq!(config.scrub.min_name_length, 2);
    }

    #[test]
    fn test_invalid_version() {
        let config_json = r#"
        {
            "version": "2.0",
            "names_directory": "/data/names",
            "jobs_directory": "/data/jobs"
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_missing_required_field_fails_schema() {
        let config_json = r#"
        {
            "version": "1.0",
            "names_directory": "/data/names"
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_unknown_field_fails_schema() {
        let config_json = r#"
        {
            "version": "1.0",
            "names_directory": "/data/names",
            "jobs_directory": "/data/jobs",
            "surprise": true
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_line_limit_below_header_lines_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "names_directory": "/data/names",
            "jobs_directory": "/data/jobs",
            "scrub": { "line_limit": 2, "header_lines": 5 }
        }
        "#;

        let result = load_config_from_str(config_json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "names_directory": "/data/names",
            "jobs_directory": "/data/jobs",
            "retention": { "days": 0 }
        }
        "#;

        let result = load_config_from_str(config_json);
        // The schema minimum catches it before semantic validation.
        assert!(result.is_err());
    }
}
