//! Import resolution for snippets.
//!
//! Snippets use packages without declaring them. The resolver scans the
//! snippet for `identifier.` accessors and turns every identifier with a
//! known import path into an import declaration:
//!
//! ```text
//! re.MustCompile(`\d+`)     ── overlay {"re": "regexp"} ──►  re "regexp"
//! script.Echo("hi").Stdout() ── built-in table ──────────►  "github.com/bitfield/script"
//! ```
//!
//! The scan is a heuristic, not identifier resolution. A local variable
//! named like a known package (`url.Path` on a `url` variable) gains an
//! import it does not need, and a package member used without a qualifier
//! is missed. Both are left for the Go compiler to report.

mod builtin;
mod overlay;

pub use overlay::{ImportOverlay, infer_alias, strip_version};

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use builtin::BUILTIN_IMPORTS;

/// Matches a type, field or function accessor (`pkg.Type`, `value.Field`).
static ACCESSOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Za-z_]+)\.").expect("accessor pattern is valid")
});

/// Merged identifier → import path lookup. The overlay wins over the
/// built-in table.
#[derive(Debug, Clone, Copy)]
pub struct ImportTable<'a> {
    overlay: &'a ImportOverlay,
}

impl<'a> ImportTable<'a> {
    pub fn new(overlay: &'a ImportOverlay) -> Self {
        Self { overlay }
    }

    /// Look up the import path for an identifier.
    pub fn lookup(&self, ident: &str) -> Option<&'a str> {
        self.overlay.get(ident).or_else(|| {
            BUILTIN_IMPORTS
                .iter()
                .find(|(key, _)| *key == ident)
                .map(|(_, path)| *path)
        })
    }
}

/// One line of the import block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportDecl {
    /// Local name, present only when it differs from the path's base name.
    pub alias: Option<String>,

    /// Fully-qualified import path.
    pub path: String,
}

impl ImportDecl {
    /// Declaration for `ident` resolving to `path`.
    ///
    /// The alias is dropped when the path's last segment already equals the
    /// identifier.
    pub fn for_identifier(ident: &str, path: &str) -> Self {
        let base = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
        let alias = (base != ident).then(|| ident.to_string());

        Self {
            alias,
            path: path.to_string(),
        }
    }
}

impl fmt::Display for ImportDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} \"{}\"", alias, self.path),
            None => write!(f, "\"{}\"", self.path),
        }
    }
}

/// Identifiers immediately followed by a dot, distinct, in order of first
/// appearance.
pub fn package_candidates(snippet: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    ACCESSOR
        .captures_iter(snippet)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|ident| seen.insert(*ident))
        .collect()
}

/// Resolve the imports a snippet needs.
///
/// Declarations are deduplicated by their rendered form and returned in
/// order of first use. Identifiers without a mapping are skipped.
pub fn resolve(snippet: &str, table: &ImportTable<'_>) -> Vec<ImportDecl> {
    let mut rendered = HashSet::new();
    let mut decls = Vec::new();

    for ident in package_candidates(snippet) {
        let Some(path) = table.lookup(ident) else {
            continue;
        };

        let decl = ImportDecl::for_identifier(ident, path);
        if rendered.insert(decl.to_string()) {
            tracing::debug!("Resolved import {} for '{}'", decl, ident);
            decls.push(decl);
        }
    }

    decls
}
