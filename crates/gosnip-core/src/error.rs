//! Error types for gosnip-core.

use thiserror::Error;

/// Result type for gosnip-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gosnip-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Project directory invalid or missing.
    #[error("project setup error: {0}")]
    Setup(String),

    /// Named source or binary is absent.
    #[error("{kind} not found for command '{name}'")]
    NotFound { kind: &'static str, name: String },

    /// Operation not allowed in the command's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Skeleton could not be parsed or executed.
    #[error("template error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Template { line: Option<usize>, message: String },

    /// Generated source rejected by the formatting pass.
    #[error("format error: {0}")]
    Format(String),

    /// Import overlay file is unreadable.
    #[error("import overlay error: {0}")]
    Overlay(String),

    /// External tool could not be located or launched.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn source_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "source",
            name: name.to_string(),
        }
    }

    pub(crate) fn binary_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "binary",
            name: name.to_string(),
        }
    }

    pub(crate) fn template(line: usize, message: impl Into<String>) -> Self {
        Self::Template {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Whether the error should stop the whole invocation.
    ///
    /// Everything else is reported and the process exits normally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Setup(_) | Self::Template { .. } | Self::Format(_)
        )
    }

    /// Render the error together with a recovery hint, when one exists.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Self::Setup(_) => Some(
                "check GOSNIP_PROJECT_DIR, or create a project with `gosnip --setup <dir>`",
            ),
            Self::NotFound { .. } => Some("run `gosnip --list` to see available commands"),
            Self::Template { .. } => Some("fix <project>/script.tmpl or delete it to use the default"),
            Self::Format(_) => Some("the snippet is not valid Go; check brackets and quotes"),
            Self::Overlay(_) => Some("<project>/imports.json must be a flat JSON object of strings"),
            Self::Toolchain(_) => Some("install Go or point GOSNIP_GO at the go binary"),
            Self::InvalidOperation(_) | Self::Io(_) | Self::Json(_) => None,
        };

        match hint {
            Some(hint) => format!("{}\n  hint: {}", self, hint),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Setup("x".into()).is_fatal());
        assert!(Error::Format("x".into()).is_fatal());
        assert!(Error::template(3, "bad").is_fatal());
        assert!(!Error::source_not_found("foo").is_fatal());
        assert!(!Error::Toolchain("x".into()).is_fatal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::source_not_found("foo").to_string(),
            "source not found for command 'foo'"
        );
        assert_eq!(
            Error::template(2, "unexpected {{end}}").to_string(),
            "template error at line 2: unexpected {{end}}"
        );
        assert!(Error::binary_not_found("foo").with_hint().contains("hint:"));
    }
}
