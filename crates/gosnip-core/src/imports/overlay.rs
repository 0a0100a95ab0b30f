//! User import overlay (`imports.json`).
//!
//! A flat JSON object mapping identifiers to import paths:
//!
//! ```text
//! {
//!     "re": "regexp",
//!     "yaml": "gopkg.in/yaml.v3"
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{Error, Result};

/// User-supplied identifier → import path entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportOverlay {
    entries: BTreeMap<String, String>,
}

impl ImportOverlay {
    /// Load the overlay from `path`. A missing file is an empty overlay.
    ///
    /// # Errors
    /// Returns [`Error::Overlay`] if the file is not a flat string map.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| Error::Overlay(format!("{}: {}", path.display(), e)))
    }

    /// Write the overlay to `path`, pretty-printed with four-space indent.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;

        fs::write(path, buf)?;
        Ok(())
    }

    /// Add or replace an entry. Later entries win.
    pub fn insert(&mut self, alias: impl Into<String>, module: impl Into<String>) {
        self.entries.insert(alias.into(), module.into());
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ImportOverlay {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overlay = Self::default();
        for (k, v) in iter {
            overlay.insert(k, v);
        }
        overlay
    }
}

/// Infer the identifier a fetched module is referenced by.
///
/// Takes the last path segment, drops any `@version` query, skips a
/// trailing `vN` major-version segment and strips a `.vN` suffix
/// (`gopkg.in/yaml.v3` → `yaml`).
pub fn infer_alias(module: &str) -> String {
    let module = module.split('@').next().unwrap_or(module);
    let mut segments = module.trim_end_matches('/').rsplit('/');

    let mut last = segments.next().unwrap_or(module);
    if is_major_version(last) {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }

    match last.rsplit_once('.') {
        Some((name, suffix)) if is_major_version(suffix) && !name.is_empty() => name.to_string(),
        _ => last.to_string(),
    }
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Module path without any `@version` query.
pub fn strip_version(module: &str) -> &str {
    module.split('@').next().unwrap_or(module)
}
