//! deadasm-core: dead label elimination library for SDCC-generated assembly
//!
//! This library provides modular components for scanning, parsing, and
//! analyzing assembly files in the dialect SDCC emits, finding the function
//! labels no call path reaches, and rewriting the files without them.
//!
//! # Features
//!
//! - **Label graph construction**: per-file label tables with line extents
//!   and outgoing call edges
//! - **Cross-file reachability**: `.globl` exports resolve across files,
//!   static labels only within their own file
//! - **Exclusions**: keep interrupt handlers and other indirectly invoked
//!   labels alive by name
//! - **Rewriting**: emit each input minus unused extents and the `.globl`
//!   declarations that pointed at them, in place or to suffixed copies
//! - **Parallel parsing**: files are parsed concurrently while the tree
//!   keeps command line order
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use deadasm_core::prelude::*;
//!
//! let result = Deadasm::new(["boot.asm", "io.asm"])
//!     .entry("_main")
//!     .analyze()?;
//!
//! for label in &result.unused {
//!     println!("Unused label: {}", label.name);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`line`]: logical line reader shared by the parser and the rewriter
//! - [`parse`]: dialect lexis, label extents, per-file graphs
//! - [`graph`]: call graph construction and reachability marking
//! - [`detect`]: unused label collection
//! - [`rewrite`]: output generation with unused extents dropped
//! - [`scan`]: parallel file discovery
//! - [`builder`]: fluent builder API for configuration
//! - [`error`]: typed error handling

pub mod builder;
pub mod config;
pub mod detect;
pub mod error;
pub mod graph;
pub mod line;
pub mod logging;
pub mod parse;
pub mod prelude;
pub mod report;
pub mod rewrite;
pub mod scan;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DeadasmError, DeadasmResult, IoResultExt};

// Builder API
pub use builder::{AnalysisResult, Deadasm};

// Configuration
pub use config::{load_config, DeadasmConfig, ExclusionSet, DEFAULT_ENTRY_LABEL, DEFAULT_SUFFIX};

// Unused label detection
pub use detect::{find_unused, UnusedLabel};

// Graph building
pub use graph::{
    build_call_graph, build_label_index, mark_reachable, reachable_from_roots, LabelId,
    MarkSummary,
};

// Logical line reading
pub use line::{read_source, LineCursor, MAX_LINE_LEN};

// Logging
pub use logging::{init_structured_logging, init_with_default_filter};

// Parsing
pub use parse::{
    call_target, export_name, is_return_line, is_section_boundary, label_name, operand_refs,
    parse_files, parse_files_strict, parse_single_file, parse_single_file_strict, parse_source,
    FileGraph, Label, ParseOutcome, ParsedBatch, Tree,
};

// Reporting
pub use report::{print_json, print_plain, RunReport};

// Rewriting
pub use rewrite::{rewrite_source, rewrite_tree, FileStats, RewriteMode, RewriteResult};

// File scanning
pub use scan::{expand_inputs, gather_asm_files};
