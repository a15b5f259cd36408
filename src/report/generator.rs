//! CSV report generation.
//!
//! Writes one row per project summary. The file is assembled in a
//! temporary sibling and moved into place only once fully written.

use crate::models::ScanSummary;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::info;

/// File name used when no path, or a directory, is given.
pub const DEFAULT_REPORT_FILE_NAME: &str = "number_of_not_exploitable_for_each_project.csv";

/// Column order of the report.
pub const REPORT_HEADER: [&str; 3] = ["project_name", "scan_id", "number_of_not_exploitable"];

/// Resolve where the report goes.
///
/// No path means the current directory; an existing directory gets the
/// default file name appended; anything else is used unchanged.
pub fn resolve_report_path(path: Option<&Path>) -> PathBuf {
    match path {
        None => Path::new(".").join(DEFAULT_REPORT_FILE_NAME),
        Some(dir) if dir.is_dir() => dir.join(DEFAULT_REPORT_FILE_NAME),
        Some(file) => file.to_path_buf(),
    }
}

/// Serialize summaries as CSV into any writer.
pub fn write_csv<W: Write>(writer: W, summaries: &[ScanSummary]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(REPORT_HEADER)?;
    for summary in summaries {
        csv_writer.write_record(&[
            summary.project_name.clone(),
            summary.scan_id.map(|id| id.to_string()).unwrap_or_default(),
            summary.number_of_not_exploitable.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the report and return the path it was written to.
///
/// A report that already exists keeps its permissions, and a symlinked
/// report is rewritten at the file it points to. New reports get the same
/// mode as a plainly created file.
pub fn write_report(summaries: &[ScanSummary], path: Option<&Path>) -> Result<PathBuf> {
    let requested = resolve_report_path(path);
    let target = follow_symlink(&requested);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut staging = staging_builder()
        .tempfile_in(&dir)
        .with_context(|| format!("Failed to create report in {}", dir.display()))?;

    if let Ok(existing) = fs::metadata(&target) {
        staging
            .as_file()
            .set_permissions(existing.permissions())
            .with_context(|| format!("Failed to copy permissions of {}", target.display()))?;
    }

    write_csv(staging.as_file_mut(), summaries)
        .with_context(|| format!("Failed to write report to {}", target.display()))?;

    staging
        .persist(&target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write report to {}", target.display()))?;

    info!(
        "Wrote {} rows to {}",
        summaries.len(),
        requested.display()
    );
    Ok(requested)
}

/// Resolve a symlinked report to its real file; other paths are unchanged.
fn follow_symlink(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

fn staging_builder() -> Builder<'static, 'static> {
    let mut builder = Builder::new();
    builder.prefix(".fpstats-");
    // Umask applies, as with File::create.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn summary(name: &str, scan_id: Option<u64>, count: u64) -> ScanSummary {
        ScanSummary {
            project_name: name.to_string(),
            scan_id,
            number_of_not_exploitable: count,
        }
    }

    fn read_back(path: &Path) -> Vec<ScanSummary> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(|row| row.unwrap()).collect()
    }

    #[test]
    fn test_resolve_default_path() {
        assert_eq!(
            resolve_report_path(None),
            PathBuf::from("./number_of_not_exploitable_for_each_project.csv")
        );
    }

    #[test]
    fn test_resolve_directory_path() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            resolve_report_path(Some(dir.path())),
            dir.path().join(DEFAULT_REPORT_FILE_NAME)
        );
    }

    #[test]
    fn test_resolve_file_path_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("fp.csv");
        assert_eq!(resolve_report_path(Some(&file)), file);
    }

    #[test]
    fn test_header_only_when_empty() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "project_name,scan_id,number_of_not_exploitable\n"
        );
    }

    #[test]
    fn test_missing_scan_id_is_empty_field() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[summary("Orphan", None, 1)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().nth(1), Some("Orphan,,1"));
    }

    #[test]
    fn test_write_report_reads_back_in_order() {
        let dir = TempDir::new().unwrap();
        let summaries = vec![
            summary("WebGoat", Some(1000012), 3),
            summary("Juice Shop, legacy", Some(1000020), 41),
            summary("Orphan", None, 1),
        ];

        let written = write_report(&summaries, Some(dir.path())).unwrap();

        assert_eq!(written, dir.path().join(DEFAULT_REPORT_FILE_NAME));
        assert_eq!(read_back(&written), summaries);
    }

    #[test]
    fn test_write_report_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, "stale,data,here\nmore,stale,rows\n").unwrap();

        write_report(&[summary("ProjectA", Some(2), 3)], Some(&file)).unwrap();

        let text = std::fs::read_to_string(&file).unwrap();
        assert_eq!(
            text,
            "project_name,scan_id,number_of_not_exploitable\nProjectA,2,3\n"
        );
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn test_new_report_gets_plain_file_mode() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain.csv");
        fs::write(&plain, "").unwrap();

        let written = write_report(&[summary("ProjectA", Some(2), 3)], Some(dir.path())).unwrap();

        assert_eq!(mode(&written), mode(&plain));
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.csv");
        fs::write(&file, "stale\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();

        write_report(&[summary("ProjectA", Some(2), 3)], Some(&file)).unwrap();

        assert_eq!(mode(&file), 0o640);
        assert_eq!(read_back(&file), vec![summary("ProjectA", Some(2), 3)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_through_symlink_keeps_link() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.csv");
        let link = dir.path().join("link.csv");
        fs::write(&real, "stale\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let written = write_report(&[summary("ProjectA", Some(2), 3)], Some(&link)).unwrap();

        assert_eq!(written, link);
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(read_back(&real), vec![summary("ProjectA", Some(2), 3)]);
    }

    #[test]
    fn test_write_report_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("missing").join("report.csv");

        let err = write_report(&[], Some(&file)).unwrap_err();
        assert!(err.to_string().contains("Failed to create report"));
        assert!(!file.exists());
    }
}
