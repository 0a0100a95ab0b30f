//! One function per primary operation.
//!
//! Operations print their results; failures of external tools are shown
//! and otherwise ignored, matching how the core reports them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use gosnip_core::{
    CompileReport, DeleteReport, GoToolchain, Lifecycle, Snippet, ToolConfig, ToolOutcome,
    setup_project,
};

use crate::colors;
use crate::process;

pub type Controller = Lifecycle<GoToolchain, GoToolchain>;

/// Where the source of a build comes from.
pub enum BuildSource {
    /// A complete Go program on disk.
    Program(PathBuf),

    /// Snippet text or a file holding the body of `main`.
    Snippet(String),

    /// The command's own stored source.
    Existing,
}

pub fn list(lc: &Controller) -> Result<()> {
    for name in lc.store().list()? {
        println!("{}", name);
    }
    Ok(())
}

/// Print the active source path of `name`, or nothing.
pub fn print_path(lc: &Controller, name: &str) {
    if lc.store().exists(name) {
        println!("{}", lc.store().source_path(name).display());
    }
}

pub fn cat(lc: &Controller, name: &str) -> Result<()> {
    print!("{}", lc.store().read(name)?);
    Ok(())
}

pub fn export(lc: &Controller, name: &str) -> Result<()> {
    let report = lc.export(name)?;
    print!("{}", report.script);
    report_delete(&report.delete);
    Ok(())
}

pub fn export_binary(lc: &Controller, name: &str) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let (dest, delete) = lc.export_binary(name, &cwd)?;
    eprintln!("Exported binary to {}", dest.display());
    report_delete(&delete);
    Ok(())
}

pub fn delete(lc: &Controller, name: &str) -> Result<()> {
    let report = lc.delete(name)?;
    report_delete(&report);
    Ok(())
}

pub fn restore(lc: &Controller, name: &str) -> Result<()> {
    let report = lc.restore(name)?;
    report_compile(&report);
    Ok(())
}

pub fn fetch(lc: &Controller, module: &str) -> Result<()> {
    let report = lc.fetch_dependency(module)?;
    report_tool("go get", &report.outcome);
    eprintln!(
        "Recorded import {} → {}",
        report.alias,
        gosnip_core::imports::strip_version(&report.module)
    );
    Ok(())
}

pub fn recompile(lc: &Controller) -> Result<()> {
    let reports = lc.recompile_all()?;

    let mut failed = 0;
    for report in &reports {
        match &report.outcome {
            ToolOutcome::Succeeded => {
                eprintln!("{}  ✓ {}{}", colors::GREEN, report.name, colors::RESET);
            }
            ToolOutcome::Failed { output } => {
                failed += 1;
                eprintln!("{}  ✗ {}{}", colors::RED, report.name, colors::RESET);
                eprintln!("{}", output.trim_end());
            }
        }
    }

    eprintln!(
        "{}Recompiled{} {} commands ({} failed)",
        colors::BOLD,
        colors::RESET,
        reports.len(),
        failed
    );
    Ok(())
}

/// Print an assembled skeleton, or write it to `src/<name>.go`.
pub fn template(lc: &Controller, code: Option<&str>, name: Option<&str>) -> Result<()> {
    let snippet = Snippet::from_arg(code.unwrap_or_default());

    match name {
        Some(name) => {
            let path = lc.write_template(name, &snippet)?;
            println!("Source file written to: {}", path.display());
        }
        None => {
            let source = lc.assemble(&snippet)?;
            println!("{}", lc.context().directive_line());
            print!("{}", source);
        }
    }
    Ok(())
}

pub fn edit(lc: &Controller, name: &str) -> Result<()> {
    if !lc.store().exists(name) {
        eprintln!("File not found in <project>/src directory for {}", name);
        return Ok(());
    }

    let Some(editor) = process::configured_editor() else {
        eprintln!("The --edit option requires environment variable GOSNIP_EDITOR or EDITOR to be defined.");
        return Ok(());
    };

    process::edit(&editor, &lc.store().source_path(name))
}

/// Persist, build and optionally run a command.
pub fn build(
    lc: &Controller,
    source: BuildSource,
    name: &str,
    exec: bool,
    args: &[String],
) -> Result<ExitCode> {
    let report = match source {
        BuildSource::Program(path) => {
            let program = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            lc.create_from_program(name, &program)?
        }
        BuildSource::Snippet(code) => lc.create(name, &Snippet::from_arg(&code))?,
        BuildSource::Existing => lc.rebuild(name)?,
    };

    report_compile(&report);

    if exec && report.outcome.is_success() {
        return process::run_binary(&report.binary, args);
    }
    Ok(ExitCode::SUCCESS)
}

/// Create a new project, or print instructions for `help`.
pub fn setup(target: &str, config: &ToolConfig) -> Result<()> {
    if target == "help" {
        print_setup_help();
        return Ok(());
    }

    let root = absolute_project_path(target)?;
    println!("Absolute path: {}", root.display());

    let tools = GoToolchain::new(&root, config);
    let report = setup_project(&root, &tools)?;
    report_tool("go mod init", &report.module_init);
    report_tool("go get", &report.script_fetch);

    println!(
        "Created project {} at {}",
        report.dirs.module_name(),
        root.display()
    );
    println!("To complete setup:");
    println!("\t1. Set environment variable GOSNIP_PROJECT_DIR={}", root.display());
    println!("\t2. Add {} to your PATH environment variable.", report.dirs.bin_dir.display());
    Ok(())
}

fn print_setup_help() {
    let program = std::env::args().next().unwrap_or_else(|| "gosnip".to_string());
    println!("To use the --setup option to create a gosnip project:");
    println!("Run '{} --setup <project name>'", program);
    println!("gosnip will:");
    println!("  a. Create the project directory");
    println!("  b. Run go mod init <project>");
    println!("  c. Run 'go get {}'", gosnip_core::project::SCRIPT_MODULE);
    println!("  d. Create 'src' and 'bin' subdirectories in the project");
    println!("  e. Add the Go template file 'script.tmpl'");
    println!("  f. Print instructions to set GOSNIP_PROJECT_DIR and add GOSNIP_PROJECT_DIR/bin to the PATH");
}

/// Resolve `~/` and relative paths against the home and current directory.
fn absolute_project_path(target: &str) -> Result<PathBuf> {
    if let Some(rest) = target.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        return Ok(home.join(rest));
    }

    let path = Path::new(target);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn report_compile(report: &CompileReport) {
    match &report.outcome {
        ToolOutcome::Succeeded => tracing::debug!("Built {}", report.binary.display()),
        ToolOutcome::Failed { output } => {
            eprintln!(
                "{}Build of '{}' failed{}",
                colors::RED,
                report.name,
                colors::RESET
            );
            eprintln!("{}", output.trim_end());
        }
    }
}

fn report_delete(report: &DeleteReport) {
    report_tool("go mod tidy", &report.tidy);
}

fn report_tool(tool: &str, outcome: &ToolOutcome) {
    if let ToolOutcome::Failed { output } = outcome {
        eprintln!("{}{} failed{}", colors::YELLOW, tool, colors::RESET);
        eprintln!("{}", output.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_project_path() {
        let abs = absolute_project_path("/tmp/scripts").unwrap();
        assert_eq!(abs, PathBuf::from("/tmp/scripts"));

        let rel = absolute_project_path("scripts").unwrap();
        assert!(rel.is_absolute());
        assert!(rel.ends_with("scripts"));
    }
}
