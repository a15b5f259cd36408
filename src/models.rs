//! Data models for the false-positive statistics report.
//!
//! Typed records built from the CxSAST reporting API plus the
//! summary rows written to the CSV report.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Triage state of a single scan result.
#[allow(dead_code)] // Full CxSAST state set; the report only counts one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResultState {
    ToVerify,
    NotExploitable,
    Confirmed,
    Urgent,
    ProposedNotExploitable,
}

impl ResultState {
    /// Numeric `StateId` used by the OData `Results` entity.
    pub fn state_id(&self) -> u8 {
        match self {
            ResultState::ToVerify => 0,
            ResultState::NotExploitable => 1,
            ResultState::Confirmed => 2,
            ResultState::Urgent => 3,
            ResultState::ProposedNotExploitable => 4,
        }
    }
}

impl fmt::Display for ResultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultState::ToVerify => write!(f, "TO_VERIFY"),
            ResultState::NotExploitable => write!(f, "NOT_EXPLOITABLE"),
            ResultState::Confirmed => write!(f, "CONFIRMED"),
            ResultState::Urgent => write!(f, "URGENT"),
            ResultState::ProposedNotExploitable => write!(f, "PROPOSED_NOT_EXPLOITABLE"),
        }
    }
}

/// A project together with the team that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTeam {
    pub project_id: u64,
    pub project_name: String,
    pub team_id: u64,
    /// Full team path, e.g. `/CxServer/AppSec`. Not every server expands it.
    pub team_name: Option<String>,
}

impl fmt::Display for ProjectTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {}) owned by team {}", self.project_name, self.project_id, self.team_id)?;
        if let Some(ref team_name) = self.team_name {
            write!(f, " {}", team_name)?;
        }
        Ok(())
    }
}

/// A single static-analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub id: u64,
}

/// A project with the scans that fall inside the requested date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub team_id: u64,
    /// Oldest first; the last element is the most recent scan.
    pub scans: Vec<Scan>,
}

impl Project {
    /// Id of the most recent scan, if the project has any.
    pub fn latest_scan_id(&self) -> Option<u64> {
        self.scans.last().map(|scan| scan.id)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {}, team {})", self.name, self.id, self.team_id)
    }
}

/// One row of the output report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub project_name: String,
    pub scan_id: Option<u64>,
    pub number_of_not_exploitable: u64,
}

/// Inclusive date window applied to scan request dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// True when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// First instant after the window, so the end date itself is included.
    pub fn exclusive_end(&self) -> Option<NaiveDate> {
        self.end.and_then(|end| end.checked_add_days(Days::new(1)))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_bound = |bound: Option<NaiveDate>| {
            bound
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "*".to_string())
        };
        write!(f, "[{}, {}]", fmt_bound(self.start), fmt_bound(self.end))
    }
}
