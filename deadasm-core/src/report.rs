//! Output formatting - plaintext and JSON.

use serde::Serialize;

use crate::detect::UnusedLabel;
use crate::rewrite::RewriteResult;

/// Everything a single run reports, in one serializable place.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Entry label the reachability walk started from.
    pub entry: String,
    /// Files parsed into the analysis.
    pub files_analyzed: usize,
    /// Files skipped because they could not be read.
    pub files_skipped: usize,
    /// Labels found across all files.
    pub total_labels: usize,
    /// Labels reachable from the entry or excluded by the user.
    pub used_labels: usize,
    /// Labels left unmarked, in file order then extent order.
    pub unused: Vec<UnusedLabel>,
    /// Present when a rewrite pass ran (including dry-run).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteResult>,
    /// True when the rewrite pass did not touch the filesystem.
    pub dry_run: bool,
}

/// Human-readable extent range. An end line of 0 means the extent runs
/// to the end of the file.
fn format_extent(start_line: usize, end_line: usize) -> String {
    if end_line == 0 {
        format!("lines {}-eof", start_line)
    } else if end_line == start_line {
        format!("line {}", start_line)
    } else {
        format!("lines {}-{}", start_line, end_line)
    }
}

/// Prints the run summary in plain text format.
pub fn print_plain(report: &RunReport) {
    println!(
        "Analyzed {} file(s), {} label(s), {} used.",
        report.files_analyzed, report.total_labels, report.used_labels
    );
    if report.files_skipped > 0 {
        println!("Skipped {} unreadable file(s).", report.files_skipped);
    }

    if report.unused.is_empty() {
        println!("No unused labels found.");
    } else {
        println!("UNUSED LABELS ({}):", report.unused.len());
        for label in &report.unused {
            let visibility = if label.is_global { "global" } else { "static" };
            println!(
                "- {} ({}, {}, {})",
                label.name,
                label.file.display(),
                format_extent(label.start_line, label.end_line),
                visibility
            );
        }
    }

    if let Some(rewrite) = &report.rewrite {
        let verb = if report.dry_run {
            "[DRY-RUN] Would rewrite"
        } else {
            "Rewrote"
        };
        println!(
            "{} {} file(s): {} extent line(s) and {} declaration(s) removed.",
            verb,
            rewrite.files_written.len(),
            rewrite.lines_removed,
            rewrite.declarations_removed
        );
        for err in &rewrite.errors {
            eprintln!("  - {}", err);
        }
    }
}

/// Prints the run summary in JSON format.
///
/// Falls back to a minimal object if serialization fails, so a report is
/// emitted even for paths that do not serialize cleanly.
pub fn print_json(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"unused_count\": {}}}", report.unused.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_report() -> RunReport {
        RunReport {
            entry: "_main".to_string(),
            files_analyzed: 2,
            files_skipped: 1,
            total_labels: 5,
            used_labels: 3,
            unused: vec![
                UnusedLabel {
                    file: PathBuf::from("a.asm"),
                    name: "_helper".to_string(),
                    start_line: 11,
                    end_line: 13,
                    is_global: false,
                },
                UnusedLabel {
                    file: PathBuf::from("b.asm"),
                    name: "_unused".to_string(),
                    start_line: 3,
                    end_line: 0,
                    is_global: true,
                },
            ],
            rewrite: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_format_extent_variants() {
        assert_eq!(format_extent(5, 9), "lines 5-9");
        assert_eq!(format_extent(4, 4), "line 4");
        assert_eq!(format_extent(3, 0), "lines 3-eof");
    }

    #[test]
    fn test_report_serializes_with_expected_keys() {
        let report = sample_report();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["entry"], "_main");
        assert_eq!(value["total_labels"], 5);
        assert_eq!(value["unused"][0]["name"], "_helper");
        assert_eq!(value["unused"][1]["end_line"], 0);
        assert!(value.get("rewrite").is_none());
    }

    #[test]
    fn test_rewrite_section_serialized_when_present() {
        let mut report = sample_report();
        report.rewrite = Some(RewriteResult {
            files_written: vec!["a.asmrm".to_string()],
            lines_removed: 3,
            declarations_removed: 1,
            errors: vec![],
        });
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["rewrite"]["lines_removed"], 3);
        assert_eq!(value["rewrite"]["files_written"][0], "a.asmrm");
    }
}
