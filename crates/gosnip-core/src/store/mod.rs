//! Command store: the `src/` + `bin/` directory pair.
//!
//! Each [`CommandState`] has one filesystem representation:
//!
//! | state         | `src/`       | `bin/`              |
//! |---------------|--------------|---------------------|
//! | `Active`      | `<name>.go`  | `<name>` once built |
//! | `SoftDeleted` | `<name>`     | -                   |
//! | `Absent`      | -            | -                   |

mod state;

pub use state::{CommandState, Operation};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::project::ProjectDirs;

/// Extension marking a source as an active command.
pub const SOURCE_EXT: &str = "go";

/// Drop a leading `#!` interpreter-directive line.
pub fn strip_interpreter_directive(text: &str) -> &str {
    if !text.starts_with("#!") {
        return text;
    }
    match text.find('\n') {
        Some(end) => &text[end + 1..],
        None => "",
    }
}

/// Check that a command name maps to a single file inside the project.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.ends_with(&format!(".{}", SOURCE_EXT));

    if invalid {
        return Err(Error::InvalidOperation(format!(
            "'{}' is not a valid command name",
            name
        )));
    }
    Ok(())
}

/// Persists command sources and binaries.
#[derive(Debug, Clone)]
pub struct CommandStore {
    src_dir: PathBuf,
    bin_dir: PathBuf,
}

impl CommandStore {
    pub fn new(dirs: &ProjectDirs) -> Self {
        Self {
            src_dir: dirs.src_dir.clone(),
            bin_dir: dirs.bin_dir.clone(),
        }
    }

    /// `src/<name>.go`
    pub fn source_path(&self, name: &str) -> PathBuf {
        self.src_dir.join(format!("{}.{}", name, SOURCE_EXT))
    }

    /// `src/<name>`, where a soft-deleted source is parked.
    pub fn parked_path(&self, name: &str) -> PathBuf {
        self.src_dir.join(name)
    }

    /// `bin/<name>`
    pub fn binary_path(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }

    /// Current state of `name`, read from the filesystem.
    pub fn state(&self, name: &str) -> CommandState {
        if self.source_path(name).is_file() {
            CommandState::Active
        } else if self.parked_path(name).is_file() {
            CommandState::SoftDeleted
        } else {
            CommandState::Absent
        }
    }

    /// Whether `name` is an active command.
    pub fn exists(&self, name: &str) -> bool {
        self.state(name) == CommandState::Active
    }

    pub fn has_binary(&self, name: &str) -> bool {
        self.binary_path(name).is_file()
    }

    /// Names of all active commands, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.src_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == SOURCE_EXT) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Source of an active command, without any leading `#!` line.
    pub fn read(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        if !self.exists(name) {
            return Err(Error::source_not_found(name));
        }

        let content = fs::read_to_string(self.source_path(name))?;
        Ok(strip_interpreter_directive(&content).to_string())
    }

    /// Persist the source of a command, creating or replacing it.
    pub fn write(&self, name: &str, source: &str) -> Result<PathBuf> {
        validate_name(name)?;
        self.state(name).apply(Operation::Create, name)?;

        let path = self.source_path(name);
        fs::write(&path, source)?;
        tracing::debug!("Wrote {} bytes to {}", source.len(), path.display());
        Ok(path)
    }

    /// Soft-delete: park the source without its extension and remove the
    /// binary.
    pub fn soft_delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.state(name).apply(Operation::Delete, name)?;

        fs::rename(self.source_path(name), self.parked_path(name))?;

        let binary = self.binary_path(name);
        if binary.exists() {
            fs::remove_file(&binary)?;
        } else {
            tracing::warn!("No binary to remove for '{}'", name);
        }

        tracing::info!("Soft-deleted '{}'", name);
        Ok(())
    }

    /// Undo a soft-delete by restoring the extension. Returns the active
    /// source path; the caller rebuilds the binary.
    pub fn restore(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        self.state(name).apply(Operation::Restore, name)?;

        let source = self.source_path(name);
        fs::rename(self.parked_path(name), &source)?;

        tracing::info!("Restored '{}'", name);
        Ok(source)
    }

    /// Copy a command's binary into `dest_dir`, executable.
    pub fn copy_binary(&self, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        validate_name(name)?;
        let binary = self.binary_path(name);
        if !binary.is_file() {
            return Err(Error::binary_not_found(name));
        }

        let dest = dest_dir.join(name);
        fs::copy(&binary, &dest)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest, fs::Permissions::from_mode(0o755))?;
        }

        Ok(dest)
    }
}
