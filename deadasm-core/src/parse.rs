//! Assembly parsing - the label graph builder.
//!
//! One pass over each file's logical lines produces its [`FileGraph`]:
//! the ordered labels defined in the code section, each with its global
//! flag, line extent, and outgoing call names. The dialect is the one
//! SDCC emits: `.globl` export declarations, a literal `.area CODE`
//! section boundary, `_name:` label definitions, `call` instructions and
//! parenthesized symbol operands.
//!
//! Parsing is deliberately inert on anything it does not recognize:
//! unknown lines carry no information for reachability and are simply
//! passed over. Only I/O can make a file drop out of the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use tracing::warn;

use crate::error::DeadasmError;
use crate::line::{read_source, LineCursor};

/// Maximum file size to parse (10 MB).
/// Assembler output is orders of magnitude smaller; anything larger is
/// not ours and is skipped rather than slurped.
const MAX_FILE_SIZE: usize = 10_000_000;

/// Line that switches the parser from declaration scanning to label
/// scanning. Labels are only recognized after it.
const SECTION_BOUNDARY: &str = ".area CODE";

/// Directive that exports a symbol for cross-file linkage.
const EXPORT_DIRECTIVE: &str = ".globl";

/// Shortest possible label definition line, `_a:`.
const MIN_LABEL_LEN: usize = 3;

// ---------------------------------------------------------------------------
// Dialect lexis
// ---------------------------------------------------------------------------

/// Check for the code-section marker line.
pub fn is_section_boundary(line: &str) -> bool {
    line == SECTION_BOUNDARY
}

/// Check for a region-terminating return instruction.
pub fn is_return_line(line: &str) -> bool {
    line == "ret" || line == "iret"
}

/// Extract the defined name from a label-definition line.
///
/// A label line is a `_`-prefixed identifier terminated by `:`. The
/// second byte must not be `_` (double-underscore symbols are assembler
/// internals, never compiler-emitted function labels), and the line must
/// be at least `_a:` long to exclude accidental matches.
pub fn label_name(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    if bytes.len() >= MIN_LABEL_LEN
        && bytes[0] == b'_'
        && bytes[1] != b'_'
        && bytes[bytes.len() - 1] == b':'
    {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

/// Extract the declared name from an export-directive line.
///
/// Returns the first `_`-prefixed token after `.globl`, or `None` if the
/// line is not an export declaration (or declares no such symbol).
pub fn export_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(EXPORT_DIRECTIVE)?;
    rest.split_whitespace().find(|tok| tok.starts_with('_'))
}

/// Extract the callee name from a call-instruction line.
///
/// The target is the second whitespace-delimited token; a conditional
/// call (`call NZ,_name`) yields the part after the condition code.
pub fn call_target(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    if !tokens.next()?.starts_with("call") {
        return None;
    }
    let target = tokens.next()?;
    match target.rfind(',') {
        Some(idx) => Some(&target[idx + 1..]),
        None => Some(target),
    }
}

fn operand_ref_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\((_[A-Za-z0-9_]+)\)").expect("Hardcoded regex pattern is valid")
    })
}

/// Extract parenthesized symbol references from an operand line.
///
/// Addressing modes like `ld hl, (_table)` reference a label without a
/// call instruction; each captured name counts as an outgoing edge.
pub fn operand_refs(line: &str) -> impl Iterator<Item = &str> {
    operand_ref_regex()
        .captures_iter(line)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
}

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// One labeled code region inside a file.
#[derive(Debug, Clone)]
pub struct Label {
    /// Symbol text, case-sensitive, without the trailing colon
    pub name: String,
    /// Declared via `.globl` before the code section began; fixed at
    /// parse time, visible for call resolution from any file
    pub is_global: bool,
    /// Reachability mark. Initially false, set only by the marking
    /// phase, and monotonic: once true it never reverts.
    pub used: bool,
    /// First line of the extent (the definition line), 1-based logical
    pub start_line: usize,
    /// Last line of the extent: the terminating `ret`/`iret` line, or
    /// the line before the next label/section boundary, or 0 when the
    /// region runs to end of input
    pub end_line: usize,
    /// Raw callee names in order of appearance; names that resolve to
    /// no label anywhere are kept and simply never match
    pub calls: Vec<String>,
}

/// Parsed form of one input file: its path and its labels in order of
/// definition. The rewriter relies on extent containment, so this order
/// (== start_line order) must be preserved.
#[derive(Debug, Clone)]
pub struct FileGraph {
    /// Path the file was read from; also names the rewritten output
    pub path: PathBuf,
    /// Labels in definition order
    pub labels: Vec<Label>,
}

impl FileGraph {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            labels: Vec::new(),
        }
    }

    /// Look up a label in this file by name.
    pub fn label_named(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.name == name)
    }
}

/// The full analysis unit: every parsed file of one run, in input
/// order. Built once by the parser, marked in place by the reachability
/// engine, and read-only for the rewriter.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub files: Vec<FileGraph>,
}

impl Tree {
    /// Total number of labels across all files.
    pub fn label_count(&self) -> usize {
        self.files.iter().map(|f| f.labels.len()).sum()
    }

    /// Iterate `(file index, label index, label)` over the whole tree.
    pub fn labels(&self) -> impl Iterator<Item = (usize, usize, &Label)> {
        self.files.iter().enumerate().flat_map(|(fi, f)| {
            f.labels.iter().enumerate().map(move |(li, l)| (fi, li, l))
        })
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Compute where the extent opened by a label line ends.
///
/// `cursor` sits just past the label line; the fork scans forward until
/// a return instruction (that line ends the extent), another label or
/// the section boundary (the extent ends one line earlier), or end of
/// input (sentinel 0: the extent runs to the end).
fn extent_end(cursor: &LineCursor) -> usize {
    for (line_no, line) in cursor.clone() {
        if is_return_line(line) {
            return line_no;
        }
        if label_name(line).is_some() || is_section_boundary(line) {
            return line_no - 1;
        }
    }
    0
}

/// Parse one file's text into its label graph.
///
/// Never fails: unrecognized lines are inert, and a file without a code
/// section simply yields no labels.
pub fn parse_source(path: impl Into<PathBuf>, src: &str) -> FileGraph {
    let mut file = FileGraph::new(path);
    let mut exports: HashSet<String> = HashSet::new();
    let mut in_code = false;

    let mut cursor = LineCursor::new(src);
    while let Some((line_no, line)) = cursor.next() {
        if !in_code {
            // Declaration scanning: collect exported names until the
            // code section begins. Nothing here defines a label.
            if let Some(name) = export_name(line) {
                exports.insert(name.to_string());
            } else if is_section_boundary(line) {
                in_code = true;
            }
            continue;
        }

        if let Some(name) = label_name(line) {
            file.labels.push(Label {
                name: name.to_string(),
                is_global: exports.contains(name),
                used: false,
                start_line: line_no,
                end_line: extent_end(&cursor),
                calls: Vec::new(),
            });
        } else if let Some(target) = call_target(line) {
            // A reference before any label has no owner and is dropped.
            if let Some(label) = file.labels.last_mut() {
                label.calls.push(target.to_string());
            }
        } else {
            for name in operand_refs(line) {
                if let Some(label) = file.labels.last_mut() {
                    label.calls.push(name.to_string());
                }
            }
        }
    }

    file
}

/// Result of parsing a single file - used for granular parallel control.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Successfully parsed file
    Parsed(FileGraph),
    /// Unreadable or oversized file (logged, batch continues)
    Skipped(PathBuf, String),
}

/// Parse one file from disk. The atomic unit of work for the parallel
/// batch; I/O failure becomes a skip, never an abort.
pub fn parse_single_file(path: &Path) -> ParseOutcome {
    let src = match read_source(path) {
        Ok(src) => src,
        Err(DeadasmError::Io { message, .. }) => {
            return ParseOutcome::Skipped(path.to_path_buf(), message);
        }
        Err(e) => return ParseOutcome::Skipped(path.to_path_buf(), e.to_string()),
    };

    if src.len() > MAX_FILE_SIZE {
        return ParseOutcome::Skipped(
            path.to_path_buf(),
            format!("File too large ({} bytes, max {})", src.len(), MAX_FILE_SIZE),
        );
    }

    ParseOutcome::Parsed(parse_source(path, &src))
}

/// Parse one file, returning `Result` for use with the `?` operator.
/// Use this when you want fail-fast behavior instead of skipping.
pub fn parse_single_file_strict(path: &Path) -> Result<FileGraph> {
    let src = read_source(path).with_context(|| format!("Failed to read: {}", path.display()))?;

    anyhow::ensure!(
        src.len() <= MAX_FILE_SIZE,
        "File too large ({} bytes, max {}): {}",
        src.len(),
        MAX_FILE_SIZE,
        path.display()
    );

    Ok(parse_source(path, &src))
}

/// A parsed batch: the tree plus the files that dropped out of it.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub tree: Tree,
    /// Unreadable inputs with the reason they were skipped
    pub skipped: Vec<(PathBuf, String)>,
}

/// Parse all files in parallel, skipping unreadable ones (lenient mode).
///
/// File order in the resulting tree matches the input order; entry
/// resolution depends on it, so the parallel map keeps positions.
pub fn parse_files(files: &[PathBuf]) -> ParsedBatch {
    let outcomes: Vec<ParseOutcome> = files.par_iter().map(|p| parse_single_file(p)).collect();

    let mut batch = ParsedBatch::default();
    for outcome in outcomes {
        match outcome {
            ParseOutcome::Parsed(file) => batch.tree.files.push(file),
            ParseOutcome::Skipped(path, reason) => {
                warn!(path = %path.display(), reason = %reason, "skipping input file");
                batch.skipped.push((path, reason));
            }
        }
    }
    batch
}

/// Parse all files in parallel with strict error handling (fail-fast).
/// Returns an error if any file cannot be read.
pub fn parse_files_strict(files: &[PathBuf]) -> Result<Tree> {
    let parsed: Vec<FileGraph> = files
        .par_iter()
        .map(|path| parse_single_file_strict(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(Tree { files: parsed })
}
