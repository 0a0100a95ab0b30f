//! Child processes that take over the terminal: the built command and the
//! editor.

use std::path::Path;
use std::process::{Command, ExitCode};

use anyhow::{Context, Result};

/// Run a built command with inherited stdio and return its exit status.
pub fn run_binary(binary: &Path, args: &[String]) -> Result<ExitCode> {
    tracing::debug!("Executing {} {:?}", binary.display(), args);

    let status = Command::new(binary)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute {}", binary.display()))?;

    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

/// Editor command from `GOSNIP_EDITOR`, falling back to `EDITOR`.
pub fn configured_editor() -> Option<String> {
    ["GOSNIP_EDITOR", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

/// Open `source` in `editor` and wait for it to exit.
///
/// `editor` may carry arguments (`code --wait`). The editor's own exit
/// status is only logged.
pub fn edit(editor: &str, source: &Path) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Editor command is empty")?;

    let status = Command::new(program)
        .args(parts)
        .arg(source)
        .status()
        .with_context(|| format!("Failed to launch editor '{}'", program))?;

    if !status.success() {
        tracing::warn!("Editor exited with {}", status);
    }
    Ok(())
}
