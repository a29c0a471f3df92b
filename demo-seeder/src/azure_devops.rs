//! Azure DevOps work item REST client
//!
//! Creates work items through the JSON-patch endpoint
//! (`PATCH {org}/{project}/_apis/wit/workitems/${type}`) and performs the
//! read-only project lookup used as a connection preflight.
//!
//! The personal access token is read from `AZURE_DEVOPS_PAT` and sent as a
//! Basic credential with an empty user name.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::creator::{CreateRequest, CreationOutcome, EntityCreator};
use crate::types::{Relation, RelationKind, SeederConfig, WorkItemType};

/// Environment variable holding the personal access token.
pub const PAT_ENV: &str = "AZURE_DEVOPS_PAT";

const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

// ---------------------------------------------------------------------------
// Patch document
// ---------------------------------------------------------------------------

/// One operation of a JSON-patch creation document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: &'static str,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: "add",
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Build the JSON-patch document for a creation request.
///
/// Order: title, description, free-form fields (in map order), then one
/// `/relations/-` operation per relation.
pub fn build_patch_document(config: &SeederConfig, request: &CreateRequest) -> Vec<PatchOperation> {
    let mut document = vec![PatchOperation::add(
        "/fields/System.Title",
        request.title.as_str(),
    )];

    if let Some(description) = request.description.as_deref().filter(|d| !d.is_empty()) {
        document.push(PatchOperation::add(
            "/fields/System.Description",
            description,
        ));
    }

    for (name, value) in &request.fields {
        document.push(PatchOperation::add(format!("/fields/{name}"), value.clone()));
    }

    for relation in &request.relations {
        document.push(PatchOperation::add(
            "/relations/-",
            serde_json::json!({
                "rel": relation.kind.link_type(),
                "url": config.work_item_url(relation.target),
            }),
        ));
    }

    document
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A link as echoed back by the backend on a created work item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkItemLink {
    pub rel: String,
    pub url: String,
}

impl WorkItemLink {
    /// Identity of the linked work item, taken from the URL's last segment.
    fn target_id(&self) -> Option<u64> {
        self.url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
    }

    fn matches(&self, relation: &Relation) -> bool {
        RelationKind::from_link_type(&self.rel) == Some(relation.kind)
            && self.target_id() == Some(relation.target)
    }
}

/// Result of a work item creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWorkItem {
    pub id: u64,
    /// Links on the stored item; `None` when the response carried no `relations` key.
    pub relations: Option<Vec<WorkItemLink>>,
}

/// Project returned by the preflight lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkItemResponse {
    id: Option<u64>,
    relations: Option<Vec<WorkItemLink>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

/// Custom error type for Azure DevOps API operations.
#[derive(Debug, thiserror::Error)]
pub enum AzureDevOpsError {
    #[error("AZURE_DEVOPS_PAT environment variable is not set")]
    MissingToken,
    #[error("Work item title must not be empty")]
    EmptyTitle,
    #[error("Authentication failed (401). Check AZURE_DEVOPS_PAT")]
    AuthFailed,
    #[error("Permission denied (403). The token may lack work item write scope")]
    PermissionDenied,
    #[error("Resource not found (404): {0}")]
    NotFound(String),
    #[error("Invalid request (400): {0}")]
    BadRequest(String),
    #[error("Azure DevOps API error (HTTP {status}): {message}")]
    HttpError { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Pull the `message` field out of a backend error body.
pub fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()?
        .message
        .filter(|m| !m.trim().is_empty())
}

/// Requested relations that do not appear among the echoed links.
///
/// A response without a `relations` key is treated as having stored none.
pub fn missing_relations(requested: &[Relation], echoed: Option<&[WorkItemLink]>) -> Vec<Relation> {
    let echoed = echoed.unwrap_or_default();
    requested
        .iter()
        .filter(|relation| !echoed.iter().any(|link| link.matches(relation)))
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Azure DevOps work item client bound to one organization and project.
pub struct AzureDevOpsClient {
    client: reqwest::Client,
    config: SeederConfig,
}

impl std::fmt::Debug for AzureDevOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsClient")
            .field("project_url", &self.config.project_url())
            .field("api_version", &self.config.api_version)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl AzureDevOpsClient {
    /// Create a client for `config` authenticating with `token`.
    pub fn new(config: SeederConfig, token: &str) -> Result<Self, AzureDevOpsError> {
        if token.trim().is_empty() {
            return Err(AzureDevOpsError::MissingToken);
        }

        let mut auth = HeaderValue::from_str(&basic_auth_value(token))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client reading the token from `AZURE_DEVOPS_PAT`.
    pub fn from_env(config: SeederConfig) -> Result<Self, AzureDevOpsError> {
        let token = std::env::var(PAT_ENV).map_err(|_| AzureDevOpsError::MissingToken)?;
        Self::new(config, &token)
    }

    pub fn config(&self) -> &SeederConfig {
        &self.config
    }

    fn create_url(&self, work_item_type: WorkItemType) -> String {
        format!(
            "{}/_apis/wit/workitems/${}?api-version={}",
            self.config.project_url(),
            work_item_type.backend_name(),
            self.config.api_version
        )
    }

    fn project_lookup_url(&self) -> String {
        format!(
            "{}/_apis/projects/{}?api-version={}",
            self.config.organization_url(),
            self.config.project,
            self.config.api_version
        )
    }

    // -----------------------------------------------------------------------
    // Generic HTTP helpers
    // -----------------------------------------------------------------------

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        path: &str,
    ) -> Result<T, AzureDevOpsError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str::<T>(&body).map_err(|e| {
                AzureDevOpsError::MalformedResponse(format!("Failed to parse response: {e}"))
            })
        } else {
            let body_text = resp.text().await.unwrap_or_default();
            Err(self.map_http_error(status, path, &body_text))
        }
    }

    fn map_http_error(&self, status: StatusCode, path: &str, body: &str) -> AzureDevOpsError {
        warn!(
            "Azure DevOps API error: HTTP {} on {}: {}",
            status.as_u16(),
            path,
            body
        );
        let message = extract_error_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED => AzureDevOpsError::AuthFailed,
            StatusCode::FORBIDDEN => AzureDevOpsError::PermissionDenied,
            StatusCode::NOT_FOUND => AzureDevOpsError::NotFound(message),
            StatusCode::BAD_REQUEST => AzureDevOpsError::BadRequest(message),
            _ => AzureDevOpsError::HttpError {
                status: status.as_u16(),
                message,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Public API methods
    // -----------------------------------------------------------------------

    /// Look up the configured project. Used to prove credentials and
    /// connectivity before anything is created.
    pub async fn verify_connection(&self) -> Result<ProjectInfo, AzureDevOpsError> {
        let url = self.project_lookup_url();
        debug!(%url, "Verifying project access");
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp, &format!("projects/{}", self.config.project))
            .await
    }

    /// Create one work item. Exactly one request is sent; nothing is retried.
    pub async fn create_work_item(
        &self,
        request: &CreateRequest,
    ) -> Result<CreatedWorkItem, AzureDevOpsError> {
        if request.title.trim().is_empty() {
            return Err(AzureDevOpsError::EmptyTitle);
        }

        let url = self.create_url(request.work_item_type);
        let document = build_patch_document(&self.config, request);
        let body = serde_json::to_vec(&document)?;
        debug!(
            %url,
            operations = document.len(),
            relations = request.relations.len(),
            "Creating {}",
            request.work_item_type
        );

        let resp = self
            .client
            .patch(&url)
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let path = format!("workitems/${}", request.work_item_type.backend_name());
        let parsed: WorkItemResponse = self.handle_response(resp, &path).await?;
        let id = parsed.id.ok_or_else(|| {
            AzureDevOpsError::MalformedResponse("response has no work item id".to_string())
        })?;

        debug!(id, "Created {}", request.work_item_type);
        Ok(CreatedWorkItem {
            id,
            relations: parsed.relations,
        })
    }
}

#[async_trait]
impl EntityCreator for AzureDevOpsClient {
    async fn create(&self, request: &CreateRequest) -> CreationOutcome {
        match self.create_work_item(request).await {
            Ok(created) => CreationOutcome::Created {
                id: created.id,
                missing_relations: missing_relations(
                    &request.relations,
                    created.relations.as_deref(),
                ),
            },
            Err(e) => {
                debug!(title = %request.title, "Creation failed: {e}");
                CreationOutcome::Failed(e.to_string())
            }
        }
    }
}

fn basic_auth_value(token: &str) -> String {
    format!("Basic {}", BASE64.encode(format!(":{token}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
