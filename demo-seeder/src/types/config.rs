use serde::{Deserialize, Serialize};

/// Target backend and seeding options.
///
/// Built once at startup and handed to the client; nothing reads
/// configuration from process-wide state after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeederConfig {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub project: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Team used for area and iteration paths (`<project>\<team>`).
    #[serde(default)]
    pub team: Option<String>,
    /// Send priority/story points/activity/severity fields.
    #[serde(default)]
    pub extended_fields: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project: String::new(),
            base_url: default_base_url(),
            api_version: default_api_version(),
            team: None,
            extended_fields: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SeederConfig {
    /// `<base>/<organization>`
    pub fn organization_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.organization
        )
    }

    /// `<base>/<organization>/<project>`
    pub fn project_url(&self) -> String {
        format!("{}/{}", self.organization_url(), self.project)
    }

    /// Canonical URL of a work item, as used in relation values.
    pub fn work_item_url(&self, id: u64) -> String {
        format!("{}/_apis/wit/workitems/{id}", self.project_url())
    }

    /// Boards page listing the project's work items.
    pub fn board_url(&self) -> String {
        format!("{}/_workitems", self.project_url())
    }

    /// Area/iteration path for the configured team, if any.
    pub fn team_path(&self) -> Option<String> {
        self.team
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|team| format!("{}\\{}", self.project, team))
    }
}

/// Path configuration for local vs global config resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub config_type: PathConfigType,
    pub config_path: String,
}

/// Whether config came from an explicit path, the project tree, or the user config dir
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathConfigType {
    Explicit,
    Local,
    Global,
}

// Default value helpers
fn default_base_url() -> String {
    "https://dev.azure.com".to_string()
}

fn default_api_version() -> String {
    "7.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}
