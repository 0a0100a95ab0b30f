//! Source assembly.
//!
//! Turns resolved imports and a snippet body into a complete Go program:
//!
//! ```text
//! imports ──┐
//!           ├──► Template (script.tmpl) ──► SourceFormatter ──► source text
//! body ─────┘
//! ```

mod format;
mod template;

pub use format::{BuiltinFormatter, FormatterChoice, Gofmt, SourceFormatter, formatter_for};
pub use template::{Template, TemplateData};

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::imports::ImportDecl;

/// Skeleton written by project setup and used when a project has none.
pub const DEFAULT_TEMPLATE: &str = "package main\n\nimport ( {{range .Imports}}\n\t{{.}}{{ end }}\n)\n\nfunc main() {\n\t{{.Code}}\n}\n";

/// Merges imports and a body into formatted source.
pub struct SourceAssembler {
    template: Template,
    formatter: Box<dyn SourceFormatter>,
}

impl SourceAssembler {
    pub fn new(template: Template, formatter: Box<dyn SourceFormatter>) -> Self {
        Self {
            template,
            formatter,
        }
    }

    /// Assembler using the default skeleton.
    pub fn with_default_template(formatter: Box<dyn SourceFormatter>) -> Result<Self> {
        Ok(Self::new(Template::parse(DEFAULT_TEMPLATE)?, formatter))
    }

    /// Assembler using the skeleton at `path`, or the default skeleton when
    /// the file does not exist.
    pub fn from_template_file(path: &Path, formatter: Box<dyn SourceFormatter>) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Template {} not found, using the default skeleton",
                path.display()
            );
            return Self::with_default_template(formatter);
        }

        let source = fs::read_to_string(path)?;
        Ok(Self::new(Template::parse(&source)?, formatter))
    }

    /// Substitute `imports` and `body` into the skeleton and format the
    /// result.
    ///
    /// # Errors
    /// [`Error::Template`](crate::Error::Template) if the skeleton cannot be
    /// executed, [`Error::Format`](crate::Error::Format) if the generated
    /// text is not well-formed.
    pub fn assemble(&self, imports: &[ImportDecl], body: &str) -> Result<String> {
        let data = TemplateData {
            imports: imports.iter().map(ToString::to_string).collect(),
            code: body.to_string(),
        };

        let generated = self.template.render(&data)?;
        tracing::debug!("Generated {} bytes of source", generated.len());

        self.formatter.format(&generated)
    }
}
