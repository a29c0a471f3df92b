//! Run setup: configuration, credential and connection preflight
//!
//! Everything here happens before the first work item is attempted. Any
//! failure is fatal for the run.

use std::path::Path;

use tracing::{debug, info};

use crate::azure_devops::{AzureDevOpsClient, AzureDevOpsError, ProjectInfo};
use crate::config::{
    apply_env_overrides, read_config, read_config_or_default, resolve_paths, validate_config,
    ConfigError,
};
use crate::hierarchy::GraphError;
use crate::types::{PathConfigType, SeederConfig};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid hierarchy: {0}")]
    Graph(#[from] GraphError),
    #[error("Credential error: {0}")]
    Credential(#[source] AzureDevOpsError),
    #[error("Connection check failed: {0}")]
    Preflight(#[source] AzureDevOpsError),
}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides<'a> {
    pub config_path: Option<&'a Path>,
    pub organization: Option<&'a str>,
    pub project: Option<&'a str>,
}

/// Resolve and read the configuration without validating it.
///
/// An explicitly named file must exist; the discovered local and global
/// files are optional.
pub fn resolve_config(overrides: &ConfigOverrides<'_>) -> Result<SeederConfig, SetupError> {
    let paths = resolve_paths(overrides.config_path);
    debug!(path = %paths.config_path, kind = ?paths.config_type, "Resolved config path");

    let mut config = match paths.config_type {
        PathConfigType::Explicit => read_config(&paths.config_path)?,
        PathConfigType::Local | PathConfigType::Global => {
            read_config_or_default(&paths.config_path)?
        }
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    if let Some(org) = overrides.organization {
        config.organization = org.to_string();
    }
    if let Some(project) = overrides.project {
        config.project = project.to_string();
    }
    Ok(config)
}

/// Resolve, read and validate the configuration.
pub fn load_config(overrides: &ConfigOverrides<'_>) -> Result<SeederConfig, SetupError> {
    let config = resolve_config(overrides)?;
    validate_config(&config)?;
    Ok(config)
}

/// Build an authenticated client from the process environment.
pub fn connect(config: SeederConfig) -> Result<AzureDevOpsClient, SetupError> {
    AzureDevOpsClient::from_env(config).map_err(SetupError::Credential)
}

/// Prove the credential can see the project before anything is created.
pub async fn preflight(client: &AzureDevOpsClient) -> Result<ProjectInfo, SetupError> {
    let project = client
        .verify_connection()
        .await
        .map_err(SetupError::Preflight)?;
    info!(project = %project.name, id = %project.id, "Connection verified");
    Ok(project)
}
