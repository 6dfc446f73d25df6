//! Unused label detection - the report-facing view of a marked tree.

use serde::Serialize;
use std::path::PathBuf;

use crate::parse::Tree;

/// One label left unmarked after reachability analysis.
#[derive(Debug, Clone, Serialize)]
pub struct UnusedLabel {
    /// File the label is defined in
    pub file: PathBuf,
    /// Label name without the trailing colon
    pub name: String,
    pub start_line: usize,
    /// 0 means the extent runs to end of input
    pub end_line: usize,
    pub is_global: bool,
}

/// List every label the marking phase left unused, in file order and
/// extent order. These are the blocks the rewriter will elide.
pub fn find_unused(tree: &Tree) -> Vec<UnusedLabel> {
    tree.files
        .iter()
        .flat_map(|file| {
            file.labels
                .iter()
                .filter(|l| !l.used)
                .map(|l| UnusedLabel {
                    file: file.path.clone(),
                    name: l.name.clone(),
                    start_line: l.start_line,
                    end_line: l.end_line,
                    is_global: l.is_global,
                })
        })
        .collect()
}
