//! deadasm CLI - dead label eliminator for SDCC-generated assembly.
//!
//! Features:
//! - Cross-file reachability from a configurable entry label
//! - Visibility-aware resolution: `.globl` labels resolve anywhere,
//!   statics only within their own file
//! - Exclusion list for interrupt handlers and jump-table targets
//! - Rayon-powered parallel parsing
//! - Suffixed or in-place output, with a dry-run preview

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use deadasm_core::{
    expand_inputs, find_unused, init_with_default_filter, load_config, mark_reachable,
    parse_files, print_json, print_plain, rewrite_tree, DeadasmConfig, DeadasmError, ExclusionSet,
    ParsedBatch, RewriteMode, RunReport, DEFAULT_ENTRY_LABEL, DEFAULT_SUFFIX,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dead label eliminator for SDCC-generated assembly"
)]
pub struct Cli {
    /// Assembly files or directories to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Entry label to compute reachability from [default: _main]
    #[arg(short, long)]
    entry: Option<String>,

    /// Label to keep regardless of reachability (repeatable)
    #[arg(short = 'x', long, value_name = "LABEL")]
    exclude: Vec<String>,

    /// Overwrite the input files instead of writing suffixed copies
    #[arg(long)]
    in_place: bool,

    /// Suffix appended to output file names [default: rm]
    #[arg(long, conflicts_with = "in_place")]
    suffix: Option<String>,

    /// Analyze and report without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Default log filter for the chosen verbosity. An explicit `RUST_LOG`
/// always takes precedence over this.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Entry label precedence: command line, then config file, then `_main`.
fn resolve_entry(cli_entry: Option<String>, config: Option<&DeadasmConfig>) -> String {
    cli_entry
        .or_else(|| config.and_then(|c| c.entry.clone()))
        .unwrap_or_else(|| DEFAULT_ENTRY_LABEL.to_string())
}

/// Output suffix precedence: command line, then config file, then `rm`.
fn resolve_suffix(cli_suffix: Option<String>, config: Option<&DeadasmConfig>) -> String {
    cli_suffix
        .or_else(|| config.and_then(|c| c.suffix.clone()))
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string())
}

/// Exclusions from the command line and the config file combined.
fn merge_excludes(cli_excludes: &[String], config: Option<&DeadasmConfig>) -> Vec<String> {
    let mut excludes = cli_excludes.to_vec();
    if let Some(list) = config.and_then(|c| c.exclude.as_ref()) {
        excludes.extend(list.iter().cloned());
    }
    excludes
}

fn main() -> Result<()> {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadasm internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    let cli = Cli::parse();

    // Structured JSON logging to stderr; -v widens the default filter
    init_with_default_filter(default_filter(cli.verbose));

    // 1. Load config from deadasm.toml if present (safe - don't fail on config errors)
    let config = match load_config(Path::new(".")) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[WARN] config load failed: {}", e);
            None
        }
    };
    let entry = resolve_entry(cli.entry.clone(), config.as_ref());
    let suffix = resolve_suffix(cli.suffix.clone(), config.as_ref());
    let excludes = merge_excludes(&cli.exclude, config.as_ref());

    // 2. Expand directories into the flat file list
    let files = expand_inputs(&cli.files).context("Failed to expand inputs")?;

    // 3. Parse all inputs in parallel, skipping unreadable ones
    let ParsedBatch { mut tree, skipped } = parse_files(&files);

    // 4. Mark labels reachable from the entry, exclusions included
    let mut exclusions = ExclusionSet::from_names(excludes);
    let summary = match mark_reachable(&mut tree, &entry, &mut exclusions) {
        Ok(summary) => summary,
        Err(e @ DeadasmError::EntryNotFound { .. }) => {
            eprintln!("[ERROR] {}; nothing was rewritten", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    // 5. Collect unused labels and rewrite the survivors
    let unused = find_unused(&tree);
    let mode = if cli.in_place {
        RewriteMode::InPlace
    } else {
        RewriteMode::Suffix(suffix)
    };
    let rewrite = rewrite_tree(&tree, &mode, cli.dry_run);

    // 6. Report results
    let report = RunReport {
        entry,
        files_analyzed: tree.files.len(),
        files_skipped: skipped.len(),
        total_labels: summary.total_labels,
        used_labels: summary.used_labels,
        unused,
        rewrite: Some(rewrite),
        dry_run: cli.dry_run,
    };
    if cli.json {
        print_json(&report);
    } else {
        print_plain(&report);
    }

    // 7. Exit code (CI-friendly): the run completed
    std::process::exit(0);
}
