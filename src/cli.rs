//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::api::Credentials;
use crate::models::DateRange;
use chrono::NaiveDate;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// FpStats - NOT_EXPLOITABLE statistics for CxSAST projects
///
/// Counts the results triaged as NOT_EXPLOITABLE in the latest scan of
/// every project and writes one CSV row per project that has any.
///
/// Examples:
///   fpstats --cxsast_base_url https://localhost --cxsast_username admin --cxsast_password pw
///   fpstats ... --start_date 2023-07-01 --end_date 2023-08-08
///   fpstats ... --report_file_path ./reports/
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CxSAST base url, for example: https://localhost
    #[arg(long = "cxsast_base_url", value_name = "URL", env = "CXSAST_BASE_URL")]
    pub cxsast_base_url: String,

    /// CxSAST username
    #[arg(long = "cxsast_username", value_name = "USER", env = "CXSAST_USERNAME")]
    pub cxsast_username: String,

    /// CxSAST password
    #[arg(
        long = "cxsast_password",
        value_name = "PASSWORD",
        env = "CXSAST_PASSWORD",
        hide_env_values = true
    )]
    pub cxsast_password: String,

    /// Only consider scans requested on or after this date, example: 2023-07-01
    #[arg(long = "start_date", value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Only consider scans requested on or before this date, example: 2023-08-08
    #[arg(long = "end_date", value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Report file path
    ///
    /// A directory gets `number_of_not_exploitable_for_each_project.csv`
    /// appended. Defaults to that file in the current directory.
    #[arg(long = "report_file_path", value_name = "PATH")]
    pub report_file_path: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fpstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates from the CxSAST server
    #[arg(long)]
    pub insecure: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("cxsast_base_url", &self.cxsast_base_url)
            .field("cxsast_username", &self.cxsast_username)
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("report_file_path", &self.report_file_path)
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .field("insecure", &self.insecure)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD form", value))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        let url = self.cxsast_base_url.as_str();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("CxSAST base URL must start with 'http://' or 'https://'".to_string());
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(format!(
                    "Start date {} is after end date {}",
                    start, end
                ));
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Log level requested with `--verbose` or `--quiet`, if any.
    pub fn explicit_log_level(&self) -> Option<tracing::Level> {
        if self.quiet {
            Some(tracing::Level::ERROR)
        } else if self.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.cxsast_username.clone(), self.cxsast_password.clone())
    }
}
