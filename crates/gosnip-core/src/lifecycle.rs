//! Command lifecycle controller.
//!
//! Orchestrates snippet → source → binary, and the delete / restore /
//! export / recompile-all operations on top of the [`CommandStore`].
//!
//! External tool failures never abort an operation: they come back as a
//! [`ToolOutcome::Failed`] inside the operation's report, and the store is
//! left as the failed step found it (typically a persisted source with a
//! stale or missing binary).

use std::fs;
use std::path::{Path, PathBuf};

use crate::assemble::{SourceAssembler, formatter_for};
use crate::error::Result;
use crate::imports::{ImportDecl, ImportOverlay, ImportTable, infer_alias, resolve, strip_version};
use crate::project::ProjectContext;
use crate::store::{CommandStore, Operation, strip_interpreter_directive};
use crate::toolchain::{Compiler, GoToolchain, PackageFetcher, ToolConfig, ToolOutcome};

/// Name used when a snippet is compiled without one.
pub const DEFAULT_COMMAND_NAME: &str = "gocmd";

/// Snippet text: literal code, or a file holding the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snippet {
    Code(String),
    File(PathBuf),
}

impl Snippet {
    /// Interpret a command-line argument: an existing file is read,
    /// anything else is code.
    pub fn from_arg(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.is_file() {
            Self::File(path.to_path_buf())
        } else {
            Self::Code(arg.to_string())
        }
    }

    /// The body text, without any leading `#!` line.
    pub fn body(&self) -> Result<String> {
        match self {
            Self::Code(code) => Ok(code.clone()),
            Self::File(path) => {
                let content = fs::read_to_string(path)?;
                Ok(strip_interpreter_directive(&content).to_string())
            }
        }
    }
}

/// Outcome of building one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub name: String,
    pub binary: PathBuf,
    pub outcome: ToolOutcome,
}

/// Outcome of a soft-delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub name: String,

    /// Result of pruning module requirements afterwards.
    pub tidy: ToolOutcome,
}

/// Outcome of exporting a command's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Source with a `#!` directive line, ready to run as a script.
    pub script: String,
    pub delete: DeleteReport,
}

/// Outcome of fetching a dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub module: String,

    /// Identifier recorded in the overlay for the module.
    pub alias: String,
    pub outcome: ToolOutcome,
}

/// Drives commands through their states.
pub struct Lifecycle<C, F> {
    ctx: ProjectContext,
    store: CommandStore,
    assembler: SourceAssembler,
    compiler: C,
    fetcher: F,
}

impl Lifecycle<GoToolchain, GoToolchain> {
    /// Controller backed by the real `go` toolchain and the project's
    /// skeleton.
    pub fn open(ctx: ProjectContext, config: &ToolConfig) -> Result<Self> {
        let formatter = formatter_for(config.formatter)?;
        let assembler = SourceAssembler::from_template_file(&ctx.dirs.template_path(), formatter)?;
        let go = GoToolchain::new(&ctx.dirs.root, config);

        Ok(Self::new(ctx, assembler, go.clone(), go))
    }
}

impl<C: Compiler, F: PackageFetcher> Lifecycle<C, F> {
    pub fn new(ctx: ProjectContext, assembler: SourceAssembler, compiler: C, fetcher: F) -> Self {
        let store = CommandStore::new(&ctx.dirs);
        Self {
            ctx,
            store,
            assembler,
            compiler,
            fetcher,
        }
    }

    pub fn context(&self) -> &ProjectContext {
        &self.ctx
    }

    pub fn store(&self) -> &CommandStore {
        &self.store
    }

    /// Imports a snippet body needs, per the built-in table and overlay.
    pub fn resolve_imports(&self, body: &str) -> Vec<ImportDecl> {
        resolve(body, &ImportTable::new(&self.ctx.overlay))
    }

    /// Complete, formatted source for a snippet.
    pub fn assemble(&self, snippet: &Snippet) -> Result<String> {
        let body = snippet.body()?;
        let imports = self.resolve_imports(&body);
        self.assembler.assemble(&imports, &body)
    }

    /// Assemble a snippet, persist it as `name` and build it.
    pub fn create(&self, name: &str, snippet: &Snippet) -> Result<CompileReport> {
        let source = self.assemble(snippet)?;
        self.store.write(name, &source)?;
        tracing::info!("Created '{}'", name);
        Ok(self.build(name))
    }

    /// Persist a complete program as `name` and build it.
    pub fn create_from_program(&self, name: &str, program: &str) -> Result<CompileReport> {
        self.store.write(name, strip_interpreter_directive(program))?;
        tracing::info!("Created '{}' from program text", name);
        Ok(self.build(name))
    }

    /// Rebuild an existing command from its stored source, dropping any
    /// `#!` line the source gained while being edited.
    pub fn rebuild(&self, name: &str) -> Result<CompileReport> {
        let source = self.store.read(name)?;
        self.store.write(name, &source)?;
        self.compile(name)
    }

    /// Persist an assembled snippet as `name` without building it.
    pub fn write_template(&self, name: &str, snippet: &Snippet) -> Result<PathBuf> {
        let source = self.assemble(snippet)?;
        self.store.write(name, &source)
    }

    /// Build an active command.
    pub fn compile(&self, name: &str) -> Result<CompileReport> {
        self.store.state(name).apply(Operation::Recompile, name)?;
        Ok(self.build(name))
    }

    fn build(&self, name: &str) -> CompileReport {
        let source = self.store.source_path(name);
        let binary = self.store.binary_path(name);

        let outcome = ToolOutcome::from_result(self.compiler.build(&source, &binary));
        match &outcome {
            ToolOutcome::Succeeded => tracing::info!("Built {}", binary.display()),
            ToolOutcome::Failed { .. } => tracing::warn!("Build of '{}' failed", name),
        }

        CompileReport {
            name: name.to_string(),
            binary,
            outcome,
        }
    }

    /// Soft-delete a command, then prune unused module requirements.
    pub fn delete(&self, name: &str) -> Result<DeleteReport> {
        self.store.soft_delete(name)?;
        let tidy = ToolOutcome::from_result(self.fetcher.tidy());

        Ok(DeleteReport {
            name: name.to_string(),
            tidy,
        })
    }

    /// Undo a soft-delete and rebuild the command.
    pub fn restore(&self, name: &str) -> Result<CompileReport> {
        self.store.restore(name)?;
        Ok(self.build(name))
    }

    /// Take a command's source out of the project as a runnable script.
    /// The command is soft-deleted afterwards and can be restored.
    pub fn export(&self, name: &str) -> Result<ExportReport> {
        self.store.state(name).apply(Operation::Export, name)?;

        let source = self.store.read(name)?;
        let script = format!("{}\n{}", self.ctx.directive_line(), source);
        let delete = self.delete(name)?;

        Ok(ExportReport { script, delete })
    }

    /// Copy a command's binary into `dest_dir`, then soft-delete it.
    pub fn export_binary(&self, name: &str, dest_dir: &Path) -> Result<(PathBuf, DeleteReport)> {
        self.store.state(name).apply(Operation::Export, name)?;

        let dest = self.store.copy_binary(name, dest_dir)?;
        let delete = self.delete(name)?;
        Ok((dest, delete))
    }

    /// Rebuild every active command, in name order. One failure does not
    /// stop the rest.
    pub fn recompile_all(&self) -> Result<Vec<CompileReport>> {
        let names = self.store.list()?;
        tracing::info!("Recompiling {} commands", names.len());

        Ok(names.iter().map(|name| self.build(name)).collect())
    }

    /// Fetch a module and record it in the overlay under its inferred
    /// alias, so later snippets resolve it.
    ///
    /// The alias is recorded even when the fetch fails.
    pub fn fetch_dependency(&self, module: &str) -> Result<FetchReport> {
        let outcome = ToolOutcome::from_result(self.fetcher.fetch(module));

        let path = self.ctx.dirs.overlay_path();
        let mut overlay = ImportOverlay::load(&path)?;
        let alias = infer_alias(module);
        overlay.insert(alias.clone(), strip_version(module));
        overlay.save(&path)?;
        tracing::info!("Recorded import alias '{}' for {}", alias, module);

        Ok(FetchReport {
            module: module.to_string(),
            alias,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::assemble::BuiltinFormatter;
    use crate::error::Error;
    use crate::store::CommandState;
    use crate::toolchain::ToolOutput;
    use tempfile::TempDir;

    /// Writes a fake binary unless the source contains `BROKEN`.
    #[derive(Default)]
    struct FakeCompiler {
        builds: RefCell<Vec<PathBuf>>,
    }

    impl Compiler for &FakeCompiler {
        fn build(&self, source: &Path, output: &Path) -> Result<ToolOutput> {
            self.builds.borrow_mut().push(source.to_path_buf());
            let text = fs::read_to_string(source)?;
            if text.contains("BROKEN") {
                return Ok(ToolOutput::failure(1, "./src/x.go:6:2: undefined: BROKEN\n"));
            }
            fs::write(output, b"binary")?;
            Ok(ToolOutput::success())
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        fail_fetch: bool,
        fetched: RefCell<Vec<String>>,
        tidies: RefCell<usize>,
    }

    impl PackageFetcher for &FakeFetcher {
        fn fetch(&self, module: &str) -> Result<ToolOutput> {
            self.fetched.borrow_mut().push(module.to_string());
            if self.fail_fetch {
                Ok(ToolOutput::failure(1, "go: module not found"))
            } else {
                Ok(ToolOutput::success())
            }
        }

        fn tidy(&self) -> Result<ToolOutput> {
            *self.tidies.borrow_mut() += 1;
            Ok(ToolOutput::success())
        }

        fn init_module(&self, _name: &str) -> Result<ToolOutput> {
            Ok(ToolOutput::success())
        }
    }

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        compiler: FakeCompiler,
        fetcher: FakeFetcher,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_fetcher(FakeFetcher::default())
        }

        fn with_fetcher(fetcher: FakeFetcher) -> Self {
            let temp = TempDir::new().expect("Failed to create temp dir");
            let root = temp.path().to_path_buf();
            Self {
                _temp: temp,
                root,
                compiler: FakeCompiler::default(),
                fetcher,
            }
        }

        fn lifecycle(&self) -> Lifecycle<&FakeCompiler, &FakeFetcher> {
            let ctx = ProjectContext::open(&self.root)
                .expect("Failed to open project")
                .with_interpreter("gosnip");
            let assembler =
                SourceAssembler::with_default_template(Box::new(BuiltinFormatter)).unwrap();
            Lifecycle::new(ctx, assembler, &self.compiler, &self.fetcher)
        }
    }

    fn code(s: &str) -> Snippet {
        Snippet::Code(s.to_string())
    }

    #[test]
    fn test_create_assembles_persists_and_builds() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        let report = lc
            .create("hello", &code(r#"script.Echo("hi\n").Stdout()"#))
            .unwrap();

        assert!(report.outcome.is_success());
        assert!(report.binary.is_file());
        assert_eq!(lc.store().state("hello"), CommandState::Active);
        assert_eq!(
            lc.store().read("hello").unwrap(),
            "package main\n\nimport (\n\t\"github.com/bitfield/script\"\n)\n\nfunc main() {\n\tscript.Echo(\"hi\\n\").Stdout()\n}\n"
        );
    }

    #[test]
    fn test_failed_build_is_reported_not_fatal() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        let report = lc.create("bad", &code("BROKEN()")).unwrap();

        match report.outcome {
            ToolOutcome::Failed { output } => assert!(output.contains("undefined: BROKEN")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(lc.store().exists("bad"));
        assert!(!lc.store().has_binary("bad"));
    }

    #[test]
    fn test_malformed_snippet_stops_before_persisting() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        let err = lc.create("oops", &code("fmt.Println(")).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert_eq!(lc.store().state("oops"), CommandState::Absent);
        assert!(fx.compiler.builds.borrow().is_empty());
    }

    #[test]
    fn test_delete_then_restore() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();
        lc.create("foo", &code(r#"fmt.Println("foo")"#)).unwrap();
        let before = fs::read(lc.store().source_path("foo")).unwrap();

        let deleted = lc.delete("foo").unwrap();
        assert!(deleted.tidy.is_success());
        assert_eq!(*fx.fetcher.tidies.borrow(), 1);
        assert!(!lc.store().list().unwrap().contains(&"foo".to_string()));
        assert!(!lc.store().has_binary("foo"));

        let restored = lc.restore("foo").unwrap();
        assert!(restored.outcome.is_success());
        assert!(lc.store().list().unwrap().contains(&"foo".to_string()));
        assert!(lc.store().has_binary("foo"));
        assert_eq!(fs::read(lc.store().source_path("foo")).unwrap(), before);
    }

    #[test]
    fn test_delete_missing_command() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        assert!(matches!(lc.delete("ghost"), Err(Error::NotFound { .. })));
        assert!(matches!(lc.restore("ghost"), Err(Error::NotFound { .. })));
        assert_eq!(*fx.fetcher.tidies.borrow(), 0);
    }

    #[test]
    fn test_export_adds_directive_and_soft_deletes() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();
        lc.create("tool", &code(r#"fmt.Println("x")"#)).unwrap();
        let source = lc.store().read("tool").unwrap();

        let export = lc.export("tool").unwrap();

        assert_eq!(export.script, format!("#!/usr/bin/env -S gosnip\n{}", source));
        assert_eq!(lc.store().state("tool"), CommandState::SoftDeleted);
        assert!(lc.restore("tool").unwrap().outcome.is_success());
    }

    #[test]
    fn test_export_binary() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();
        lc.create("tool", &code("os.Exit(0)")).unwrap();
        let dest_dir = fx.root.join("out");
        fs::create_dir(&dest_dir).unwrap();

        let (dest, _) = lc.export_binary("tool", &dest_dir).unwrap();

        assert_eq!(fs::read(dest).unwrap(), b"binary");
        assert_eq!(lc.store().state("tool"), CommandState::SoftDeleted);
    }

    #[test]
    fn test_recompile_all_continues_past_failures() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();
        lc.create("a", &code(r#"fmt.Println("a")"#)).unwrap();
        lc.create("b", &code("BROKEN()")).unwrap();
        lc.create("c", &code(r#"fmt.Println("c")"#)).unwrap();
        lc.delete("c").unwrap();
        fx.compiler.builds.borrow_mut().clear();

        let reports = lc.recompile_all().unwrap();

        let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(reports[0].outcome.is_success());
        assert!(!reports[1].outcome.is_success());
        assert_eq!(fx.compiler.builds.borrow().len(), 2);
    }

    #[test]
    fn test_compile_requires_active_command() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        assert!(matches!(lc.compile("nope"), Err(Error::NotFound { .. })));
        assert!(matches!(lc.rebuild("nope"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_rebuild_drops_directive_line() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();
        lc.create("tool", &code(r#"fmt.Println("x")"#)).unwrap();
        let source = lc.store().read("tool").unwrap();
        let path = lc.store().source_path("tool");
        fs::write(&path, format!("#!/usr/bin/env -S gosnip\n{}", source)).unwrap();

        let report = lc.rebuild("tool").unwrap();

        assert!(report.outcome.is_success());
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn test_fetch_records_alias_for_later_resolution() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        let report = lc.fetch_dependency("github.com/fatih/color@v1.16.0").unwrap();

        assert_eq!(report.alias, "color");
        assert!(report.outcome.is_success());
        assert_eq!(*fx.fetcher.fetched.borrow(), vec!["github.com/fatih/color@v1.16.0"]);

        let reopened = fx.lifecycle();
        let imports = reopened.resolve_imports("color.Red(\"x\")");
        assert_eq!(imports, vec![ImportDecl::for_identifier("color", "github.com/fatih/color")]);
    }

    #[test]
    fn test_failed_fetch_is_reported_and_still_recorded() {
        let fx = Fixture::with_fetcher(FakeFetcher {
            fail_fetch: true,
            ..Default::default()
        });
        let lc = fx.lifecycle();

        let report = lc.fetch_dependency("example.com/missing").unwrap();

        assert!(!report.outcome.is_success());
        let overlay = ImportOverlay::load(&lc.context().dirs.overlay_path()).unwrap();
        assert_eq!(overlay.get("missing"), Some("example.com/missing"));
    }

    #[test]
    fn test_fetch_keeps_existing_overlay_entries() {
        let fx = Fixture::new();
        fs::write(fx.root.join("imports.json"), r#"{"re": "regexp"}"#).unwrap();
        let lc = fx.lifecycle();

        lc.fetch_dependency("rsc.io/quote").unwrap();

        let overlay = ImportOverlay::load(&lc.context().dirs.overlay_path()).unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.get("re"), Some("regexp"));
    }

    #[test]
    fn test_snippet_from_file() {
        let fx = Fixture::new();
        let body_file = fx.root.join("body.txt");
        fs::write(&body_file, "#!ignored\nfmt.Println(strings.ToUpper(\"x\"))\n").unwrap();
        let lc = fx.lifecycle();

        let snippet = Snippet::from_arg(body_file.to_str().unwrap());
        assert!(matches!(snippet, Snippet::File(_)));
        let source = lc.assemble(&snippet).unwrap();

        assert!(source.contains("\t\"fmt\"\n\t\"strings\"\n"));
        assert!(!source.contains("#!"));
    }

    #[test]
    fn test_program_and_rebuild_strip_directive() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();
        let program = "#!/usr/bin/env -S gosnip\npackage main\n\nfunc main() {\n}\n";

        lc.create_from_program("prog", program).unwrap();
        assert_eq!(lc.store().read("prog").unwrap(), "package main\n\nfunc main() {\n}\n");

        fs::write(lc.store().source_path("prog"), program).unwrap();
        let report = lc.rebuild("prog").unwrap();
        assert!(report.outcome.is_success());
        assert_eq!(
            fs::read_to_string(lc.store().source_path("prog")).unwrap(),
            "package main\n\nfunc main() {\n}\n"
        );
    }

    #[test]
    fn test_write_template_does_not_build() {
        let fx = Fixture::new();
        let lc = fx.lifecycle();

        let path = lc.write_template("draft", &code("")).unwrap();

        assert!(path.is_file());
        assert!(fx.compiler.builds.borrow().is_empty());
    }
}
