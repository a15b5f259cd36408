//! Per-project NOT_EXPLOITABLE aggregation.
//!
//! Walks every team that owns at least one project, takes the latest scan
//! of each project inside the date range, and counts its results that were
//! triaged as not exploitable.

use crate::api::{ApiError, ReportingApi};
use crate::models::{DateRange, ProjectTeam, ResultState, ScanSummary};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Distinct owning-team ids, in ascending order.
pub fn distinct_team_ids(project_teams: &[ProjectTeam]) -> BTreeSet<u64> {
    project_teams.iter().map(|pt| pt.team_id).collect()
}

/// Build one summary per project whose latest scan has at least one
/// NOT_EXPLOITABLE result.
///
/// Projects without scans in `range`, or whose latest scan has no such
/// results, are left out. Any API failure aborts the whole aggregation.
pub async fn aggregate<A>(api: &A, range: &DateRange) -> Result<Vec<ScanSummary>, ApiError>
where
    A: ReportingApi + ?Sized,
{
    let project_teams = api.projects_with_teams().await?;
    let team_ids = distinct_team_ids(&project_teams);

    info!(
        "Found {} projects across {} teams, scan window {}",
        project_teams.len(),
        team_ids.len(),
        range
    );
    for project_team in &project_teams {
        debug!("Listed {}", project_team);
    }

    let mut summaries = Vec::new();

    for team_id in team_ids {
        let projects = api.projects_with_scans(team_id, range).await?;
        debug!("Team {}: {} projects", team_id, projects.len());

        for project in projects {
            let Some(scan_id) = project.latest_scan_id() else {
                debug!("Skipping {}: no scans in window", project);
                continue;
            };

            let count = api
                .count_results(scan_id, &[ResultState::NotExploitable])
                .await?;

            if count == 0 {
                debug!("Skipping {}: scan {} has none", project, scan_id);
                continue;
            }

            debug!("{}: scan {} has {} not exploitable", project.name, scan_id, count);
            summaries.push(ScanSummary {
                project_name: project.name,
                scan_id: Some(scan_id),
                number_of_not_exploitable: count,
            });
        }
    }

    info!("{} projects have NOT_EXPLOITABLE results", summaries.len());
    Ok(summaries)
}
