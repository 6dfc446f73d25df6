//! Builder pattern API for deadasm analysis.
//!
//! Provides a fluent interface for configuring and running a dead label
//! analysis over a set of assembly files:
//!
//! ```rust,ignore
//! use deadasm_core::prelude::*;
//!
//! let result = Deadasm::new(["boot.asm", "io.asm"])
//!     .entry("_main")
//!     .exclude(["_isr_timer"])
//!     .analyze()?;
//!
//! println!("Unused labels: {}", result.dead_count());
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::{ExclusionSet, DEFAULT_ENTRY_LABEL};
use crate::detect::{find_unused, UnusedLabel};
use crate::graph::{mark_reachable, MarkSummary};
use crate::parse::{parse_files, parse_files_strict, ParsedBatch, Tree};
use crate::report::RunReport;
use crate::rewrite::{rewrite_tree, RewriteMode, RewriteResult};
use crate::scan::expand_inputs;

/// Builder for configuring a dead label analysis.
///
/// # Example
///
/// ```rust,ignore
/// let result = Deadasm::new(["src/"])
///     .entry("_reset_handler")
///     .analyze()?;
/// ```
#[derive(Debug, Clone)]
pub struct Deadasm {
    /// Files or directories to analyze, in command line order
    inputs: Vec<PathBuf>,

    /// Entry label the reachability walk starts from
    entry: String,

    /// Labels kept alive regardless of reachability
    exclude: Vec<String>,

    /// Fail on the first unreadable file instead of skipping it
    strict: bool,
}

impl Deadasm {
    /// Create a new analysis builder over the given inputs.
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            entry: DEFAULT_ENTRY_LABEL.to_string(),
            exclude: Vec::new(),
            strict: false,
        }
    }

    /// Set the entry label. Defaults to `_main`.
    pub fn entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    /// Add labels to keep alive regardless of reachability.
    pub fn exclude<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Fail on the first unreadable file instead of skipping it.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        // 1. Expand directories into files
        let files = expand_inputs(&self.inputs).context("Failed to expand inputs")?;

        // 2. Parse everything
        let (mut tree, skipped) = if self.strict {
            let tree = parse_files_strict(&files).context("Failed to parse input files")?;
            (tree, Vec::new())
        } else {
            let ParsedBatch { tree, skipped } = parse_files(&files);
            (tree, skipped)
        };

        // 3. Exclusions (duplicates are warned about on insert)
        let mut exclusions = ExclusionSet::from_names(self.exclude.iter().cloned());

        // 4. Mark reachable labels. Deliberately propagated without added
        //    context so callers can downcast the entry-not-found case.
        let summary = mark_reachable(&mut tree, &self.entry, &mut exclusions)?;

        // 5. Collect what was left unmarked
        let unused = find_unused(&tree);

        Ok(AnalysisResult {
            entry: self.entry.clone(),
            tree,
            skipped,
            summary,
            unused,
        })
    }

    /// Rewrite the analyzed files, dropping everything left unused.
    pub fn rewrite(
        &self,
        result: &AnalysisResult,
        mode: &RewriteMode,
        dry_run: bool,
    ) -> RewriteResult {
        rewrite_tree(&result.tree, mode, dry_run)
    }
}

/// Result of running a dead label analysis.
#[derive(Debug)]
pub struct AnalysisResult {
    /// Entry label the walk started from
    pub entry: String,

    /// The marked tree, one file graph per parsed input
    pub tree: Tree,

    /// Inputs skipped as unreadable, with the reason
    pub skipped: Vec<(PathBuf, String)>,

    /// Counters from the marking pass
    pub summary: MarkSummary,

    /// Labels left unmarked, in file order then extent order
    pub unused: Vec<UnusedLabel>,
}

impl AnalysisResult {
    /// Check if any unused label was found.
    pub fn has_dead_code(&self) -> bool {
        !self.unused.is_empty()
    }

    /// Number of unused labels.
    pub fn dead_count(&self) -> usize {
        self.unused.len()
    }

    /// Percentage of labels that are unused.
    pub fn dead_percentage(&self) -> f64 {
        if self.summary.total_labels == 0 {
            0.0
        } else {
            (self.unused.len() as f64 / self.summary.total_labels as f64) * 100.0
        }
    }

    /// Assemble the run report for this analysis. The rewrite section is
    /// left empty; callers that rewrite fill it in afterwards.
    pub fn report(&self) -> RunReport {
        RunReport {
            entry: self.entry.clone(),
            files_analyzed: self.tree.files.len(),
            files_skipped: self.skipped.len(),
            total_labels: self.summary.total_labels,
            used_labels: self.summary.used_labels,
            unused: self.unused.clone(),
            rewrite: None,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeadasmError;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_project() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join(format!("deadasm_builder_test_{}", std::process::id()))
            .join(id.to_string());

        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).expect("Failed to create test directory");

        fs::write(
            dir.join("a.asm"),
            "\t.globl _main\n\t.area CODE\n_main:\n\tcall _used\n\tret\n_used:\n\tret\n_helper:\n\tret\n",
        )
        .expect("Failed to write a.asm");

        fs::write(
            dir.join("b.asm"),
            "\t.globl _unused\n\t.area CODE\n_unused:\n\tnop\n\tret\n",
        )
        .expect("Failed to write b.asm");

        dir
    }

    #[test]
    fn test_builder_basic() {
        let dir = create_test_project();

        let result = Deadasm::new([dir.join("a.asm"), dir.join("b.asm")])
            .analyze()
            .unwrap();

        let names: Vec<_> = result.unused.iter().map(|u| u.name.as_str()).collect();
        assert!(names.contains(&"_helper"));
        assert!(names.contains(&"_unused"));
        assert!(!names.contains(&"_main"));
        assert!(!names.contains(&"_used"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_accepts_directory_input() {
        let dir = create_test_project();

        let result = Deadasm::new([&dir]).analyze().unwrap();
        assert_eq!(result.tree.files.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_exclude_keeps_label() {
        let dir = create_test_project();

        let result = Deadasm::new([dir.join("a.asm"), dir.join("b.asm")])
            .exclude(["_helper"])
            .analyze()
            .unwrap();

        let names: Vec<_> = result.unused.iter().map(|u| u.name.as_str()).collect();
        assert!(!names.contains(&"_helper"));
        assert!(names.contains(&"_unused"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_missing_entry_is_typed_error() {
        let dir = create_test_project();

        let err = Deadasm::new([dir.join("a.asm")])
            .entry("_no_such_label")
            .analyze()
            .unwrap_err();

        match err.downcast_ref::<DeadasmError>() {
            Some(DeadasmError::EntryNotFound { name }) => assert_eq!(name, "_no_such_label"),
            other => panic!("expected EntryNotFound, got {:?}", other),
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_skips_missing_file_in_lenient_mode() {
        let dir = create_test_project();

        let result = Deadasm::new([dir.join("a.asm"), dir.join("gone.asm")])
            .analyze()
            .unwrap();
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.tree.files.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_strict_mode_fails_on_missing_file() {
        let dir = create_test_project();

        let err = Deadasm::new([dir.join("a.asm"), dir.join("gone.asm")])
            .strict(true)
            .analyze()
            .unwrap_err();
        assert!(err.to_string().contains("parse input files"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_rewrite_writes_suffix_files() {
        let dir = create_test_project();
        let builder = Deadasm::new([dir.join("a.asm"), dir.join("b.asm")]);

        let result = builder.analyze().unwrap();
        let rewrite = builder.rewrite(&result, &RewriteMode::Suffix("rm".to_string()), false);

        assert_eq!(rewrite.files_written.len(), 2);
        assert!(dir.join("a.asmrm").exists());
        let rewritten = fs::read_to_string(dir.join("a.asmrm")).unwrap();
        assert!(!rewritten.contains("_helper:"));
        assert!(rewritten.contains("_used:"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_analysis_result_stats() {
        let dir = create_test_project();

        let result = Deadasm::new([dir.join("a.asm"), dir.join("b.asm")])
            .analyze()
            .unwrap();

        assert!(result.has_dead_code());
        assert_eq!(result.dead_count(), 2);
        assert_eq!(result.summary.total_labels, 4);
        assert!((result.dead_percentage() - 50.0).abs() < 0.01);

        let report = result.report();
        assert_eq!(report.files_analyzed, 2);
        assert_eq!(report.used_labels, 2);
        assert!(report.rewrite.is_none());

        fs::remove_dir_all(&dir).ok();
    }
}
