//! Core engine for gosnip.
//!
//! This crate provides:
//! - Import resolution for unqualified package references in snippets
//! - Source assembly through a fill-in skeleton and a formatting pass
//! - The `src/` + `bin/` command store with reversible soft-delete
//! - The lifecycle controller driving the external Go toolchain

pub mod assemble;
pub mod error;
pub mod imports;
pub mod lifecycle;
pub mod project;
pub mod store;
pub mod toolchain;

pub use assemble::{FormatterChoice, SourceAssembler, SourceFormatter};
pub use error::{Error, Result};
pub use imports::{ImportDecl, ImportOverlay, ImportTable, resolve};
pub use lifecycle::{
    CompileReport, DEFAULT_COMMAND_NAME, DeleteReport, ExportReport, FetchReport, Lifecycle,
    Snippet,
};
pub use project::{ProjectContext, ProjectDirs, SetupReport, setup_project};
pub use store::{CommandState, CommandStore};
pub use toolchain::{Compiler, GoToolchain, PackageFetcher, ToolConfig, ToolOutcome, ToolOutput};

/// Version string printed by `--version`.
pub const VERSION: &str = concat!("gosnip v", env!("CARGO_PKG_VERSION"));
