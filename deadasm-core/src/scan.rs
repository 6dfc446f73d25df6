//! Parallel, deterministic discovery of assembly files under a directory.
//!
//! Performance notes:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel extension filtering via Rayon's `par_bridge`
//! - Results sorted before returning, so discovery order never depends on
//!   traversal or thread scheduling

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions treated as assembly sources.
const ASM_EXTENSIONS: &[&str] = &["asm", "s"];

/// Directories to exclude from traversal (VCS and build output).
const EXCLUDED_DIRS: &[&str] = &[".git", ".svn", ".hg", "build", "obj"];

/// Checks if a directory entry should be pruned from traversal.
///
/// Called by `WalkDir::filter_entry`; runs sequentially but enables O(1)
/// subtree skipping for excluded directories.
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

fn is_asm_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ASM_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
}

/// Gathers all `.asm` and `.s` files recursively under `root`.
///
/// Skips `.git/`, `.svn/`, `.hg/`, `build/` and `obj/` subtrees. The
/// returned paths are sorted: analysis results depend on file order, so
/// discovery must not vary with traversal or thread scheduling.
pub fn gather_asm_files(root: &Path) -> Result<Vec<PathBuf>> {
    let excludes: HashSet<&str> = EXCLUDED_DIRS.iter().copied().collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if is_asm_file(path) {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!(
            "Failed to gather assembly files from {}",
            root.display()
        ))?;

    files.sort();
    Ok(files)
}

/// Expands command line inputs into a flat list of files to analyze.
///
/// Directories are searched with [`gather_asm_files`]; anything else is
/// passed through untouched, in the order given. A path that does not
/// exist is passed through as well, so the parser reports it as
/// unreadable instead of discovery failing the whole run.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.is_dir() {
            files.extend(gather_asm_files(input)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
