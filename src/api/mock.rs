//! In-memory [`ReportingApi`] used by tests.

use crate::api::{ApiError, ReportingApi};
use crate::models::{DateRange, Project, ProjectTeam, ResultState, Scan};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockApi {
    pub project_teams: Vec<ProjectTeam>,
    pub team_projects: HashMap<u64, Vec<Project>>,
    pub counts: HashMap<u64, u64>,
    /// Scan id whose count query fails with HTTP 500.
    pub failing_scan: Option<u64>,
    team_calls: Mutex<Vec<u64>>,
    count_calls: Mutex<Vec<(u64, Vec<ResultState>)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project in `team_id` whose scans have the given ids, oldest first.
    pub fn with_project(mut self, team_id: u64, project_id: u64, name: &str, scans: &[u64]) -> Self {
        self.project_teams.push(ProjectTeam {
            project_id,
            project_name: name.to_string(),
            team_id,
            team_name: Some(format!("/CxServer/Team{}", team_id)),
        });
        self.team_projects.entry(team_id).or_default().push(Project {
            id: project_id,
            name: name.to_string(),
            team_id,
            scans: scans.iter().map(|&id| Scan { id }).collect(),
        });
        self
    }

    pub fn with_count(mut self, scan_id: u64, count: u64) -> Self {
        self.counts.insert(scan_id, count);
        self
    }

    pub fn team_calls(&self) -> Vec<u64> {
        self.team_calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self) -> Vec<(u64, Vec<ResultState>)> {
        self.count_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportingApi for MockApi {
    async fn projects_with_teams(&self) -> Result<Vec<ProjectTeam>, ApiError> {
        Ok(self.project_teams.clone())
    }

    async fn projects_with_scans(
        &self,
        team_id: u64,
        _range: &DateRange,
    ) -> Result<Vec<Project>, ApiError> {
        self.team_calls.lock().unwrap().push(team_id);
        Ok(self.team_projects.get(&team_id).cloned().unwrap_or_default())
    }

    async fn count_results(&self, scan_id: u64, states: &[ResultState]) -> Result<u64, ApiError> {
        self.count_calls
            .lock()
            .unwrap()
            .push((scan_id, states.to_vec()));

        if self.failing_scan == Some(scan_id) {
            return Err(ApiError::Status {
                url: format!("mock://Scans({})/Results/$count", scan_id),
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }

        Ok(self.counts.get(&scan_id).copied().unwrap_or(0))
    }
}
