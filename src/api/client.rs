//! HTTP client for the CxSAST OData reporting API.
//!
//! Authentication is implicit: the first query fetches an access token
//! from the CxSAST identity endpoint and every later query reuses it.

use crate::api::{ApiError, ReportingApi};
use crate::config::ApiConfig;
use crate::models::{DateRange, Project, ProjectTeam, ResultState, Scan};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const TOKEN_PATH: &str = "/cxrestapi/auth/identity/connect/token";
const ODATA_PATH: &str = "/cxwebinterface/odata/v1";

/// Username and password for the CxSAST resource-owner grant.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OData wraps every entity set in `{"value": [...]}`.
#[derive(Debug, Deserialize)]
struct ODataCollection<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProjectTeamRecord {
    id: u64,
    name: String,
    owning_team_id: u64,
    #[serde(default)]
    owning_team: Option<TeamRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TeamRecord {
    full_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProjectScansRecord {
    id: u64,
    name: String,
    owning_team_id: u64,
    scans: Vec<ScanRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanRecord {
    id: u64,
}

/// CxSAST OData client.
pub struct CxODataClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    client_id: String,
    client_secret: String,
    scope: String,
    token: OnceCell<String>,
}

impl CxODataClient {
    /// Create a client for the server at `base_url` (e.g. `https://cxsast.local`).
    pub fn new(base_url: &str, credentials: Credentials, config: &ApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            "Initializing CxSAST client for {} (timeout {}s)",
            base_url, config.timeout_seconds
        );

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            token: OnceCell::new(),
        })
    }

    fn token_url(&self) -> String {
        format!("{}{}", self.base_url, TOKEN_PATH)
    }

    fn odata_url(&self, resource: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}/{}", self.base_url, ODATA_PATH, resource);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// URL listing every project with its owning team.
    pub fn projects_with_teams_url(&self) -> String {
        self.odata_url(
            "Projects",
            &[
                ("$select", "Id,Name,OwningTeamId".to_string()),
                ("$expand", "OwningTeam($select=FullName)".to_string()),
            ],
        )
    }

    /// URL listing a team's projects with their scans inside `range`.
    pub fn projects_with_scans_url(&self, team_id: u64, range: &DateRange) -> String {
        let scan_options = match scan_filter(range) {
            Some(filter) => format!("$filter={};$select=Id;$orderby=Id", filter),
            None => "$select=Id;$orderby=Id".to_string(),
        };

        self.odata_url(
            "Projects",
            &[
                ("$select", "Id,Name,OwningTeamId".to_string()),
                ("$filter", format!("OwningTeamId eq {}", team_id)),
                ("$expand", format!("Scans({})", scan_options)),
            ],
        )
    }

    /// URL counting a scan's results in any of `states`.
    pub fn result_count_url(&self, scan_id: u64, states: &[ResultState]) -> String {
        let filter = states
            .iter()
            .map(|state| format!("StateId eq {}", state.state_id()))
            .collect::<Vec<_>>()
            .join(" or ");

        let params = if filter.is_empty() {
            Vec::new()
        } else {
            vec![("$filter", filter)]
        };

        self.odata_url(&format!("Scans({})/Results/$count", scan_id), &params)
    }

    async fn access_token(&self) -> Result<&str, ApiError> {
        self.token
            .get_or_try_init(|| self.authenticate())
            .await
            .map(String::as_str)
    }

    async fn authenticate(&self) -> Result<String, ApiError> {
        let url = self.token_url();
        debug!("Requesting access token from {}", url);

        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("grant_type", "password"),
            ("scope", self.scope.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ApiError::Authentication {
                url,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::decode(&url, e.to_string()))?;

        info!("Authenticated as {}", self.credentials.username);
        Ok(token.access_token)
    }

    async fn get_text(&self, url: &str, accept: &str) -> Result<String, ApiError> {
        let token = self.access_token().await?;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| ApiError::transport(url, e))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Authentication {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| ApiError::transport(url, e))
    }

    async fn get_collection<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ApiError> {
        let body = self.get_text(url, "application/json").await?;
        decode_collection(url, &body)
    }
}

#[async_trait]
impl ReportingApi for CxODataClient {
    async fn projects_with_teams(&self) -> Result<Vec<ProjectTeam>, ApiError> {
        let url = self.projects_with_teams_url();
        let records: Vec<ProjectTeamRecord> = self.get_collection(&url).await?;
        Ok(records.into_iter().map(ProjectTeam::from).collect())
    }

    async fn projects_with_scans(
        &self,
        team_id: u64,
        range: &DateRange,
    ) -> Result<Vec<Project>, ApiError> {
        let url = self.projects_with_scans_url(team_id, range);
        let records: Vec<ProjectScansRecord> = self.get_collection(&url).await?;
        Ok(records.into_iter().map(Project::from).collect())
    }

    async fn count_results(&self, scan_id: u64, states: &[ResultState]) -> Result<u64, ApiError> {
        let url = self.result_count_url(scan_id, states);
        let body = self.get_text(&url, "text/plain").await?;
        decode_count(&url, &body)
    }
}

impl From<ProjectTeamRecord> for ProjectTeam {
    fn from(record: ProjectTeamRecord) -> Self {
        Self {
            project_id: record.id,
            project_name: record.name,
            team_id: record.owning_team_id,
            team_name: record.owning_team.map(|team| team.full_name),
        }
    }
}

impl From<ProjectScansRecord> for Project {
    fn from(record: ProjectScansRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            team_id: record.owning_team_id,
            scans: record
                .scans
                .into_iter()
                .map(|scan| Scan { id: scan.id })
                .collect(),
        }
    }
}

/// `$filter` clause on `ScanRequestedOn` for an inclusive date window.
fn scan_filter(range: &DateRange) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(start) = range.start {
        clauses.push(format!(
            "ScanRequestedOn ge {}T00:00:00Z",
            start.format("%Y-%m-%d")
        ));
    }
    if let Some(end) = range.exclusive_end() {
        clauses.push(format!(
            "ScanRequestedOn lt {}T00:00:00Z",
            end.format("%Y-%m-%d")
        ));
    }

    // An end date of NaiveDate::MAX has no next day and bounds nothing.
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" and "))
    }
}

fn decode_collection<T: DeserializeOwned>(url: &str, body: &str) -> Result<Vec<T>, ApiError> {
    serde_json::from_str::<ODataCollection<T>>(body)
        .map(|collection| collection.value)
        .map_err(|e| ApiError::decode(url, e.to_string()))
}

fn decode_count(url: &str, body: &str) -> Result<u64, ApiError> {
    let text = body.trim_start_matches('\u{feff}').trim();
    text.parse::<u64>()
        .map_err(|_| ApiError::decode(url, format!("expected a result count, got {:?}", text)))
}
