//! CxSAST reporting API access.
//!
//! The aggregator only sees the [`ReportingApi`] trait; [`CxODataClient`]
//! is the HTTP implementation backed by the CxSAST OData endpoint.

pub mod client;
pub mod error;

#[cfg(test)]
pub mod mock;

use crate::models::{DateRange, Project, ProjectTeam, ResultState};
use async_trait::async_trait;

pub use client::{CxODataClient, Credentials};
pub use error::ApiError;

/// Read-only queries needed to build the report.
#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// Every project visible to the user, with its owning team.
    async fn projects_with_teams(&self) -> Result<Vec<ProjectTeam>, ApiError>;

    /// Projects owned by `team_id`, each with the scans requested inside `range`.
    async fn projects_with_scans(
        &self,
        team_id: u64,
        range: &DateRange,
    ) -> Result<Vec<Project>, ApiError>;

    /// Number of results of `scan_id` whose state is any of `states`.
    async fn count_results(&self, scan_id: u64, states: &[ResultState]) -> Result<u64, ApiError>;
}
