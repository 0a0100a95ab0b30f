//! Project directory management.
//!
//! A gosnip project is a Go module directory holding every command's
//! source and binary:
//!
//! ```text
//! <project>/
//! ├── go.mod
//! ├── script.tmpl   # Fill-in skeleton for snippets
//! ├── imports.json  # User import overlay (optional)
//! ├── src/          # <name>.go (active) or <name> (soft-deleted)
//! └── bin/          # <name> compiled binaries
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::assemble::DEFAULT_TEMPLATE;
use crate::error::{Error, Result};
use crate::imports::ImportOverlay;
use crate::toolchain::{PackageFetcher, ToolOutcome};

/// File name of the fill-in skeleton.
pub const TEMPLATE_FILE: &str = "script.tmpl";

/// File name of the user import overlay.
pub const OVERLAY_FILE: &str = "imports.json";

/// Directory structure of a project.
#[derive(Debug, Clone)]
pub struct ProjectDirs {
    /// The project (Go module) root.
    pub root: PathBuf,

    /// Command sources.
    pub src_dir: PathBuf,

    /// Compiled command binaries.
    pub bin_dir: PathBuf,
}

impl ProjectDirs {
    /// Create the directory structure for an existing project root.
    ///
    /// Creates `src/` and `bin/` if they don't exist.
    ///
    /// # Errors
    /// Returns [`Error::Setup`] if the root does not exist, or an IO error
    /// if a subdirectory cannot be created.
    pub fn from_root(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Setup(format!(
                "project directory not found: {}",
                root.display()
            )));
        }

        let dirs = Self::layout(root);
        fs::create_dir_all(&dirs.src_dir)?;
        fs::create_dir_all(&dirs.bin_dir)?;
        Ok(dirs)
    }

    fn layout(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            src_dir: root.join("src"),
            bin_dir: root.join("bin"),
        }
    }

    /// Path to the fill-in skeleton.
    pub fn template_path(&self) -> PathBuf {
        self.root.join(TEMPLATE_FILE)
    }

    /// Path to the user import overlay.
    pub fn overlay_path(&self) -> PathBuf {
        self.root.join(OVERLAY_FILE)
    }

    /// Module name used for `go mod init`: the root's base name.
    pub fn module_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gosnip".to_string())
    }

    /// Lay out a brand-new project at `root`.
    ///
    /// Creates the root, `src/`, `bin/` and writes the default skeleton.
    /// An existing skeleton is left untouched.
    pub fn scaffold(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let dirs = Self::from_root(root)?;

        let template = dirs.template_path();
        if !template.exists() {
            fs::write(&template, DEFAULT_TEMPLATE)?;
            tracing::debug!("Wrote default template to {}", template.display());
        }

        Ok(dirs)
    }
}

/// Module providing the default `script.*` helpers.
pub const SCRIPT_MODULE: &str = "github.com/bitfield/script";

/// What happened while setting up a new project.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub dirs: ProjectDirs,
    pub module_init: ToolOutcome,
    pub script_fetch: ToolOutcome,
}

/// Create a project at `root`: the module, the `script` dependency, the
/// `src/`/`bin/` pair and the default skeleton.
///
/// Tool failures are reported in the [`SetupReport`]; only filesystem
/// errors abort.
pub fn setup_project(root: &Path, tools: &impl PackageFetcher) -> Result<SetupReport> {
    fs::create_dir_all(root)?;
    let name = ProjectDirs::layout(root).module_name();

    let module_init = ToolOutcome::from_result(tools.init_module(&name));
    let script_fetch = ToolOutcome::from_result(tools.fetch(SCRIPT_MODULE));
    let dirs = ProjectDirs::scaffold(root)?;

    tracing::info!("Created project {} at {}", name, root.display());
    Ok(SetupReport {
        dirs,
        module_init,
        script_fetch,
    })
}

/// Everything an operation needs to know about the project.
///
/// Resolved once at startup and passed explicitly to every component.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Project directories.
    pub dirs: ProjectDirs,

    /// User import overlay, loaded once per invocation.
    pub overlay: ImportOverlay,

    /// Program named in the `#!/usr/bin/env -S` directive line.
    pub interpreter: String,
}

impl ProjectContext {
    /// Locate the project.
    ///
    /// A declared directory must already exist; a relative one is resolved
    /// against the current directory. Without one, the project is the
    /// directory containing the running executable.
    pub fn locate(declared: Option<&Path>) -> Result<Self> {
        let root = match declared {
            Some(dir) => {
                // Tools run inside the project, so relative paths must not
                // survive past this point.
                let dir = std::path::absolute(dir)?;
                if !dir.exists() {
                    return Err(Error::Setup(format!(
                        "directory specified by GOSNIP_PROJECT_DIR not found: {}",
                        dir.display()
                    )));
                }
                dir
            }
            None => {
                let exe = std::env::current_exe()?;
                exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                    Error::Setup(format!("executable has no parent directory: {}", exe.display()))
                })?
            }
        };

        tracing::debug!("Using project directory {}", root.display());
        Self::open(&root)
    }

    /// Open the project rooted at `root`.
    ///
    /// An unreadable overlay is logged and treated as empty.
    pub fn open(root: &Path) -> Result<Self> {
        let dirs = ProjectDirs::from_root(root)?;

        let overlay = match ImportOverlay::load(&dirs.overlay_path()) {
            Ok(overlay) => overlay,
            Err(e) => {
                tracing::warn!("Ignoring import overlay: {}", e);
                ImportOverlay::default()
            }
        };

        Ok(Self {
            dirs,
            overlay,
            interpreter: "gosnip".to_string(),
        })
    }

    /// Set the program named in directive lines.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// The `#!` line that lets a source file run as a script.
    pub fn directive_line(&self) -> String {
        format!("#!/usr/bin/env -S {}", self.interpreter)
    }
}
