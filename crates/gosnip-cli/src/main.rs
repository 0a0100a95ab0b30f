//! gosnip CLI - Turn Go snippets into standalone commands.

mod colors;
mod commands;
mod process;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use gosnip_core::{DEFAULT_COMMAND_NAME, FormatterChoice, Lifecycle, ProjectContext, ToolConfig};

use commands::BuildSource;

#[derive(Parser)]
#[command(name = "gosnip")]
#[command(about = "Turn Go snippets into standalone commands")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Go snippet (or a file holding one) to use as the body of main
    #[arg(short, long)]
    code: Option<String>,

    /// Complete Go program to store and build
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Command name
    #[arg(short, long)]
    name: Option<String>,

    /// Run the built command with the remaining arguments
    #[arg(short = 'x', long)]
    exec: bool,

    /// Open a command's source in $GOSNIP_EDITOR or $EDITOR
    #[arg(short, long, value_name = "NAME")]
    edit: Option<String>,

    /// Print the assembled source instead of building it
    #[arg(short, long)]
    template: bool,

    /// List active commands
    #[arg(short, long)]
    list: bool,

    /// Print the source path of a command
    #[arg(short, long, value_name = "NAME")]
    path: Option<String>,

    /// Print the source of a command
    #[arg(long, value_name = "NAME")]
    cat: Option<String>,

    /// Print a command as a runnable script, then delete it
    #[arg(long, value_name = "NAME")]
    export: Option<String>,

    /// Copy a command's binary to the current directory, then delete it
    #[arg(long, value_name = "NAME")]
    export_bin: Option<String>,

    /// Delete a command (restorable)
    #[arg(long, value_name = "NAME")]
    delete: Option<String>,

    /// Restore a deleted command and rebuild it
    #[arg(long, value_name = "NAME")]
    restore: Option<String>,

    /// Fetch a Go module and record its import alias
    #[arg(short, long, value_name = "MODULE")]
    goget: Option<String>,

    /// Rebuild every command
    #[arg(long)]
    recompile: bool,

    /// Create a new project directory ('help' for instructions)
    #[arg(long, value_name = "DIR")]
    setup: Option<String>,

    /// Print the project directory
    #[arg(short, long)]
    dir: bool,

    /// Print the #! line for gosnip scripts
    #[arg(short, long)]
    bang: bool,

    /// Print version
    #[arg(short, long)]
    version: bool,

    /// Project directory (defaults to the executable's directory)
    #[arg(long, env = "GOSNIP_PROJECT_DIR", value_name = "DIR")]
    project: Option<PathBuf>,

    /// Go binary (defaults to `go` on PATH)
    #[arg(long = "go", env = "GOSNIP_GO", value_name = "PATH")]
    go_binary: Option<PathBuf>,

    /// Formatting pass for assembled sources
    #[arg(long, env = "GOSNIP_FORMATTER", value_enum, default_value_t = FormatterArg::Auto)]
    formatter: FormatterArg,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Arguments for --exec, or a gosnip script followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatterArg {
    Auto,
    Gofmt,
    Builtin,
}

impl From<FormatterArg> for FormatterChoice {
    fn from(arg: FormatterArg) -> Self {
        match arg {
            FormatterArg::Auto => FormatterChoice::Auto,
            FormatterArg::Gofmt => FormatterChoice::Gofmt,
            FormatterArg::Builtin => FormatterChoice::Builtin,
        }
    }
}

impl Cli {
    /// Whether any flag other than the global settings selects an operation.
    fn has_operation(&self) -> bool {
        self.code.is_some()
            || self.file.is_some()
            || self.name.is_some()
            || self.edit.is_some()
            || self.template
            || self.list
            || self.path.is_some()
            || self.cat.is_some()
            || self.export.is_some()
            || self.export_bin.is_some()
            || self.delete.is_some()
            || self.restore.is_some()
            || self.goget.is_some()
            || self.recompile
            || self.setup.is_some()
            || self.dir
            || self.bang
            || self.version
    }

    /// Treat `gosnip <script> args...` as `--file <script> --exec args...`.
    fn adopt_script_argument(&mut self) {
        if self.has_operation() {
            return;
        }
        let Some(first) = self.args.first() else {
            return;
        };
        if Path::new(first).is_file() {
            let script = self.args.remove(0);
            tracing::debug!("Running script {}", script);
            self.file = Some(PathBuf::from(script));
            self.exec = true;
        }
    }
}

fn main() -> ExitCode {
    let mut cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli.adopt_script_argument();

    match run(cli) {
        Ok(code) => code,
        Err(err) => report_error(err),
    }
}

/// Print an error; only fatal core errors fail the process.
fn report_error(err: anyhow::Error) -> ExitCode {
    match err.downcast_ref::<gosnip_core::Error>() {
        Some(core_err) => {
            eprintln!("{}error:{} {}", colors::RED, colors::RESET, core_err.with_hint());
            if core_err.is_fatal() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        None => {
            eprintln!("{}error:{} {:#}", colors::RED, colors::RESET, err);
            ExitCode::FAILURE
        }
    }
}

fn interpreter() -> String {
    std::env::args().next().unwrap_or_else(|| "gosnip".to_string())
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ToolConfig {
        go_binary: cli.go_binary.clone(),
        formatter: cli.formatter.into(),
    };

    if cli.version {
        println!("{}", gosnip_core::VERSION);
        return Ok(ExitCode::SUCCESS);
    }

    if cli.bang {
        println!("#!/usr/bin/env -S {}", interpreter());
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(target) = &cli.setup {
        commands::setup(target, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = ProjectContext::locate(cli.project.as_deref())?.with_interpreter(interpreter());

    if cli.dir {
        println!("{}", ctx.dirs.root.display());
        return Ok(ExitCode::SUCCESS);
    }

    let lc = Lifecycle::open(ctx, &config)?;

    if let Some(name) = &cli.path {
        commands::print_path(&lc, name);
    } else if cli.list {
        commands::list(&lc)?;
    } else if let Some(module) = &cli.goget {
        commands::fetch(&lc, module)?;
    } else if cli.recompile {
        commands::recompile(&lc)?;
    } else if cli.template {
        commands::template(&lc, cli.code.as_deref(), cli.name.as_deref())?;
    } else if let Some(name) = &cli.edit {
        commands::edit(&lc, name)?;
    } else if let Some(name) = &cli.cat {
        commands::cat(&lc, name)?;
    } else if let Some(name) = &cli.export {
        commands::export(&lc, name)?;
    } else if let Some(name) = &cli.export_bin {
        commands::export_binary(&lc, name)?;
    } else if let Some(name) = &cli.delete {
        commands::delete(&lc, name)?;
    } else if let Some(name) = &cli.restore {
        commands::restore(&lc, name)?;
    } else if let Some(file) = cli.file {
        let name = cli.name.unwrap_or_else(|| DEFAULT_COMMAND_NAME.to_string());
        return commands::build(&lc, BuildSource::Program(file), &name, cli.exec, &cli.args);
    } else if let Some(code) = cli.code {
        let name = cli.name.unwrap_or_else(|| DEFAULT_COMMAND_NAME.to_string());
        return commands::build(&lc, BuildSource::Snippet(code), &name, cli.exec, &cli.args);
    } else if let Some(name) = &cli.name {
        return commands::build(&lc, BuildSource::Existing, name, cli.exec, &cli.args);
    } else {
        eprintln!("No operation given. Run 'gosnip --help' for usage.");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
