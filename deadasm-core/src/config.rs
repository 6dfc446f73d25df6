//! Configuration loading from deadasm.toml, and the exclusion set.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::{fs, path::Path};
use tracing::warn;

/// Entry label assumed when none is configured. SDCC prefixes C symbols
/// with an underscore, so C `main` becomes `_main`.
pub const DEFAULT_ENTRY_LABEL: &str = "_main";

/// Suffix appended to the input path in non-destructive output mode
/// (`boot.asm` → `boot.asmrm`).
pub const DEFAULT_SUFFIX: &str = "rm";

/// Main configuration structure for deadasm.toml.
#[derive(Debug, Deserialize, Default)]
pub struct DeadasmConfig {
    /// Entry label to compute reachability from.
    pub entry: Option<String>,
    /// Labels that must never be removed.
    pub exclude: Option<Vec<String>>,
    /// Output suffix for non-destructive mode.
    pub suffix: Option<String>,
}

/// Loads configuration from deadasm.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<DeadasmConfig>> {
    let path = root.join("deadasm.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let cfg = toml::from_str(&content).context("Invalid deadasm.toml")?;
    Ok(Some(cfg))
}

/// Labels the user asserts are referenced externally or indirectly.
///
/// Members are treated as reachability roots regardless of visibility,
/// so they (and everything they call) survive rewriting. The marking
/// phase also force-inserts the entry name here.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from configured names, warning on duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    /// Insert a label name. Re-excluding an already-excluded label is a
    /// warning, never an error.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.names.contains(&name) {
            warn!(label = %name, "label set as excluded more than once");
            return false;
        }
        self.names.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}
