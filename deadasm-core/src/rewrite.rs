//! Rewriting pass that emits the surviving lines of each analyzed file.
//!
//! Rewriting never re-parses: it replays the same logical-line stream the
//! parser saw and consults the marked [`Tree`] to decide, line by line,
//! whether a line survives. Three things can make a line disappear:
//!
//! - it starts the extent of an unused label (the whole extent goes),
//! - it falls inside an extent that is currently being dropped,
//! - it is a `.globl` declaration whose label ended up unused.
//!
//! Everything else is written back verbatim, one logical line per output
//! line. The input is read in full before any output file is opened, so
//! in-place rewriting can never truncate a file it still needs to read.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::line::{read_source, LineCursor};
use crate::parse::{export_name, FileGraph, Tree};

/// Where the rewritten output of each input file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteMode {
    /// Overwrite the input file with its rewritten content.
    InPlace,
    /// Write next to the input, with the suffix appended to the full
    /// file name: `boot.asm` with suffix `rm` becomes `boot.asmrm`.
    Suffix(String),
}

impl RewriteMode {
    /// Output path for the given input path under this mode.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match self {
            Self::InPlace => input.to_path_buf(),
            Self::Suffix(suffix) => {
                let mut name = input.as_os_str().to_os_string();
                name.push(suffix);
                PathBuf::from(name)
            }
        }
    }
}

/// Line accounting for a single rewritten file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FileStats {
    /// Logical lines read from the input.
    pub lines_in: usize,
    /// Logical lines written to the output.
    pub lines_out: usize,
    /// Lines dropped as part of an unused label's extent.
    pub lines_removed: usize,
    /// `.globl` declaration lines dropped because their label is unused.
    pub declarations_removed: usize,
}

/// Aggregate outcome of rewriting a whole [`Tree`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteResult {
    /// Output files written, or that would be written under dry-run.
    pub files_written: Vec<String>,
    /// Extent lines dropped across all files.
    pub lines_removed: usize,
    /// `.globl` declaration lines dropped across all files.
    pub declarations_removed: usize,
    /// Files that could not be read back or written, with the reason.
    pub errors: Vec<String>,
}

impl RewriteResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total lines dropped, extents and declarations combined.
    pub fn total_removed(&self) -> usize {
        self.lines_removed + self.declarations_removed
    }
}

/// True when `name` declares a label that exists somewhere in the tree,
/// is global, and was left unmarked. Declarations naming no known label
/// are kept: there is no label to prove them unused.
fn declaration_is_orphaned(tree: &Tree, name: &str) -> bool {
    tree.labels()
        .any(|(_, _, label)| label.name == name && label.is_global && !label.used)
}

/// Rewrites one file's source against the marked tree.
///
/// Pure function over the already-read source text; returns the new
/// content (one normalized logical line per output line) together with
/// the line accounting. Extents with an end line of 0 run to the end of
/// the file, so once such an extent starts nothing further is emitted.
pub fn rewrite_source(file: &FileGraph, tree: &Tree, src: &str) -> (String, FileStats) {
    let mut out = String::with_capacity(src.len());
    let mut stats = FileStats::default();
    // End line of the extent currently being dropped. An end of 0 never
    // matches a real line number, which skips to end of file.
    let mut skip_until: Option<usize> = None;

    for (line_no, line) in LineCursor::new(src) {
        stats.lines_in += 1;

        if let Some(end_line) = skip_until {
            if line_no == end_line {
                skip_until = None;
            }
            stats.lines_removed += 1;
            continue;
        }

        if let Some(name) = export_name(line) {
            if declaration_is_orphaned(tree, name) {
                debug!(
                    label = name,
                    file = %file.path.display(),
                    "dropping declaration of unused global label"
                );
                stats.declarations_removed += 1;
                continue;
            }
        }

        if let Some(label) = file
            .labels
            .iter()
            .find(|label| !label.used && label.start_line == line_no)
        {
            debug!(
                label = %label.name,
                file = %file.path.display(),
                lines = label.end_line.saturating_sub(label.start_line) + 1,
                "dropping unused label"
            );
            // A single-line extent ends on the line that starts it, so
            // there is nothing left to keep skipping.
            if label.end_line != line_no {
                skip_until = Some(label.end_line);
            }
            stats.lines_removed += 1;
            continue;
        }

        out.push_str(line);
        out.push('\n');
        stats.lines_out += 1;
    }

    (out, stats)
}

/// Rewrites every file of the tree under the given output mode.
///
/// Each input is re-read in full before its output is opened. Files that
/// cannot be read back or written are reported in the result and skipped;
/// the pass continues with the remaining files. Under `dry_run` nothing
/// is written and the paths that would have been written are printed.
pub fn rewrite_tree(tree: &Tree, mode: &RewriteMode, dry_run: bool) -> RewriteResult {
    let mut result = RewriteResult::new();

    for file in &tree.files {
        let src = match read_source(&file.path) {
            Ok(src) => src,
            Err(e) => {
                warn!(
                    path = %file.path.display(),
                    error = %e,
                    "cannot re-read input, leaving it untouched"
                );
                result.errors.push(e.to_string());
                continue;
            }
        };

        let (content, stats) = rewrite_source(file, tree, &src);
        result.lines_removed += stats.lines_removed;
        result.declarations_removed += stats.declarations_removed;

        let out_path = mode.output_path(&file.path);
        if dry_run {
            println!(
                "[DRY-RUN] Would write {} ({} of {} lines kept)",
                out_path.display(),
                stats.lines_out,
                stats.lines_in
            );
            result.files_written.push(out_path.display().to_string());
            continue;
        }

        match fs::write(&out_path, content) {
            Ok(()) => {
                debug!(
                    path = %out_path.display(),
                    lines_in = stats.lines_in,
                    lines_out = stats.lines_out,
                    "wrote rewritten file"
                );
                result.files_written.push(out_path.display().to_string());
            }
            Err(e) => {
                warn!(path = %out_path.display(), error = %e, "could not write output");
                result
                    .errors
                    .push(format!("write {}: {}", out_path.display(), e));
            }
        }
    }

    info!(
        files = result.files_written.len(),
        lines_removed = result.lines_removed,
        declarations_removed = result.declarations_removed,
        dry_run,
        "rewrite pass complete"
    );
    result
}
