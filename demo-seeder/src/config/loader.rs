use std::fs;
use std::path::Path;

use tracing::debug;

use super::error::ConfigError;
use crate::types::SeederConfig;

/// Environment variable overriding `organization`.
pub const ORG_ENV: &str = "AZURE_DEVOPS_ORG";
/// Environment variable overriding `project`.
pub const PROJECT_ENV: &str = "AZURE_DEVOPS_PROJECT";
/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "AZURE_DEVOPS_BASE_URL";

pub fn config_exists(config_path: &str) -> bool {
    Path::new(config_path).exists()
}

/// Read and parse a config file. A missing file is an error.
pub fn read_config(config_path: &str) -> Result<SeederConfig, ConfigError> {
    if !config_exists(config_path) {
        return Err(ConfigError::NotFound(config_path.to_string()));
    }

    let content = fs::read_to_string(config_path)?;
    if content.trim().is_empty() {
        return Ok(SeederConfig::default());
    }

    let config: SeederConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Read a config file, falling back to defaults when it does not exist.
pub fn read_config_or_default(config_path: &str) -> Result<SeederConfig, ConfigError> {
    match read_config(config_path) {
        Err(ConfigError::NotFound(_)) => {
            debug!("No config at {config_path}, using defaults");
            Ok(SeederConfig::default())
        }
        other => other,
    }
}

/// Apply environment overrides using `lookup` to resolve variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut SeederConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(org) = get(ORG_ENV) {
        config.organization = org;
    }
    if let Some(project) = get(PROJECT_ENV) {
        config.project = project;
    }
    if let Some(base_url) = get(BASE_URL_ENV) {
        config.base_url = base_url;
    }
}

/// Check that the config is usable, collecting every problem found.
pub fn validate_config(config: &SeederConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.organization.trim().is_empty() {
        errors.push(format!(
            "organization is required (set it in the config file or {ORG_ENV})"
        ));
    }
    if config.project.trim().is_empty() {
        errors.push(format!(
            "project is required (set it in the config file or {PROJECT_ENV})"
        ));
    }
    if !(config.base_url.starts_with("https://") || config.base_url.starts_with("http://")) {
        errors.push(format!(
            "base_url must start with http:// or https://, got \"{}\"",
            config.base_url
        ));
    }
    if config.api_version.trim().is_empty() {
        errors.push("api_version must not be empty".to_string());
    }
    if config.request_timeout_secs == 0 {
        errors.push("request_timeout_secs must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> SeederConfig {
        SeederConfig {
            organization: "contoso".to_string(),
            project: "Demo".to_string(),
            ..SeederConfig::default()
        }
    }

    #[test]
    fn test_read_config_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seeder.config.yaml");
        let result = read_config(&path.to_string_lossy());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_read_config_or_default_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seeder.config.yaml");
        let config = read_config_or_default(&path.to_string_lossy()).unwrap();
        assert_eq!(config, SeederConfig::default());
    }

    #[test]
    fn test_read_config_full_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seeder.config.yaml");
        std::fs::write(
            &path,
            "organization: contoso\n\
             project: Demo\n\
             team: Demo Team\n\
             extended_fields: true\n\
             request_timeout_secs: 10\n",
        )
        .unwrap();

        let config = read_config(&path.to_string_lossy()).unwrap();
        assert_eq!(config.organization, "contoso");
        assert_eq!(config.project, "Demo");
        assert_eq!(config.team.as_deref(), Some("Demo Team"));
        assert!(config.extended_fields);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.base_url, "https://dev.azure.com");
    }

    #[test]
    fn test_read_config_empty_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seeder.config.yaml");
        std::fs::write(&path, "\n").unwrap();
        let config = read_config(&path.to_string_lossy()).unwrap();
        assert_eq!(config, SeederConfig::default());
    }

    #[test]
    fn test_read_config_invalid_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seeder.config.yaml");
        std::fs::write(&path, "organization: [unclosed\n").unwrap();
        let result = read_config(&path.to_string_lossy());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_apply_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ORG_ENV, "fabrikam"),
            (PROJECT_ENV, "Other"),
            (BASE_URL_ENV, "http://localhost:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = valid_config();
        apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.organization, "fabrikam");
        assert_eq!(config.project, "Other");
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_apply_env_overrides_ignores_empty_values() {
        let mut config = valid_config();
        apply_env_overrides(&mut config, |name| {
            (name == ORG_ENV).then(|| "   ".to_string())
        });
        assert_eq!(config.organization, "contoso");
    }

    #[test]
    fn test_validate_config_ok() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_config_collects_all_errors() {
        let config = SeederConfig {
            base_url: "dev.azure.com".to_string(),
            request_timeout_secs: 0,
            ..SeederConfig::default()
        };

        match validate_config(&config) {
            Err(ConfigError::ValidationError(errors)) => {
                assert_eq!(errors.len(), 4);
                assert!(errors[0].contains("organization"));
                assert!(errors[1].contains("project"));
                assert!(errors[2].contains("base_url"));
                assert!(errors[3].contains("request_timeout_secs"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
