//! External Go toolchain.
//!
//! Compiling and fetching are capabilities injected into the
//! [`Lifecycle`](crate::Lifecycle) controller. [`GoToolchain`] provides them
//! by running `go` as a blocking child process and capturing its combined
//! output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::assemble::FormatterChoice;
use crate::error::{Error, Result};

/// Result of running an external tool to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,

    /// Stdout followed by stderr.
    pub output: String,
}

impl ToolOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            output: String::new(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    fn from_output(output: Output) -> Self {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Self {
            code: output.status.code(),
            output: combined,
        }
    }
}

/// What came of an external tool step, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Succeeded,

    /// The tool ran and failed, or could not be launched. `output` is the
    /// tool's combined output, verbatim, or the launch error.
    Failed { output: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Fold a tool invocation into an outcome. Launch errors become
    /// failures; nothing here aborts the caller.
    pub fn from_result(result: Result<ToolOutput>) -> Self {
        match result {
            Ok(out) if out.is_success() => Self::Succeeded,
            Ok(out) => {
                let status = out
                    .code
                    .map(|c| format!("exit status {}", c))
                    .unwrap_or_else(|| "terminated by signal".to_string());
                Self::Failed {
                    output: format!("{}: {}", status, out.output),
                }
            }
            Err(e) => Self::Failed {
                output: e.to_string(),
            },
        }
    }
}

/// Builds a single source file into an executable.
pub trait Compiler {
    /// Compile `source` to `output`. `Err` only if the compiler could not
    /// be launched; a failed build is a non-zero [`ToolOutput`].
    fn build(&self, source: &Path, output: &Path) -> Result<ToolOutput>;
}

/// Maintains the project's module dependencies.
pub trait PackageFetcher {
    /// Fetch a module and add it to the project's requirements.
    fn fetch(&self, module: &str) -> Result<ToolOutput>;

    /// Prune requirements no source uses any more.
    fn tidy(&self) -> Result<ToolOutput>;

    /// Initialize the project as a module named `name`.
    fn init_module(&self, name: &str) -> Result<ToolOutput>;
}

/// Toolchain settings resolved at startup.
#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    /// Explicit `go` binary; looked up in `PATH` when unset.
    pub go_binary: Option<PathBuf>,

    /// Formatting pass to use.
    pub formatter: FormatterChoice,
}

/// The `go` command, run inside the project directory.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    go_path: Option<PathBuf>,
    project_dir: PathBuf,
}

impl GoToolchain {
    /// Toolchain rooted at `project_dir`.
    ///
    /// A missing `go` binary is not an error here; every invocation then
    /// reports it instead.
    pub fn new(project_dir: impl Into<PathBuf>, config: &ToolConfig) -> Self {
        let go_path = config.go_binary.clone().or_else(Self::find_go);
        if go_path.is_none() {
            tracing::warn!("go not found in PATH");
        }

        Self {
            go_path,
            project_dir: project_dir.into(),
        }
    }

    /// Find go in PATH.
    fn find_go() -> Option<PathBuf> {
        which::which("go").ok()
    }

    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        let Some(go) = &self.go_path else {
            return Err(Error::Toolchain("go not found in PATH".to_string()));
        };

        tracing::debug!("Running {} {}", go.display(), args.join(" "));

        let output = Command::new(go)
            .current_dir(&self.project_dir)
            .args(args)
            .output()
            .map_err(|e| Error::Toolchain(format!("Failed to run go: {}", e)))?;

        Ok(ToolOutput::from_output(output))
    }
}

impl Compiler for GoToolchain {
    fn build(&self, source: &Path, output: &Path) -> Result<ToolOutput> {
        let source = source.to_string_lossy();
        let output = output.to_string_lossy();
        self.run(&["build", "-o", &output, &source])
    }
}

impl PackageFetcher for GoToolchain {
    fn fetch(&self, module: &str) -> Result<ToolOutput> {
        self.run(&["get", module])
    }

    fn tidy(&self) -> Result<ToolOutput> {
        self.run(&["mod", "tidy"])
    }

    fn init_module(&self, name: &str) -> Result<ToolOutput> {
        self.run(&["mod", "init", name])
    }
}
