//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use deadasm_core::prelude::*;
//! ```
//!
//! This provides the most commonly needed types for dead label analysis
//! without polluting the namespace with rarely-used items.

// Core analysis types
pub use crate::error::{DeadasmError, DeadasmResult};
pub use crate::parse::{FileGraph, Label, ParsedBatch, Tree};

// Graph building and traversal
pub use crate::graph::{
    build_call_graph, build_label_index, mark_reachable, reachable_from_roots, LabelId,
    MarkSummary,
};

// Unused label detection
pub use crate::detect::{find_unused, UnusedLabel};

// Rewriting
pub use crate::rewrite::{rewrite_tree, RewriteMode, RewriteResult};

// File scanning
pub use crate::scan::{expand_inputs, gather_asm_files};

// Configuration
pub use crate::config::{load_config, DeadasmConfig, ExclusionSet};

// Builder API
pub use crate::builder::{AnalysisResult, Deadasm};
