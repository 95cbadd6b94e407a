//! Pipeline driver: orchestrates input loading, whole-program
//! compilation, metadata extraction, and the glue-compilation step.
//!
//! The backend compiler is a black box invoked synchronously from
//! [`Driver::compile`]; it reports modules back through the
//! [`CompileHooks`] listener on the same call stack, re-entrantly, not
//! concurrently. One driver instance corresponds to one compilation
//! run; its registry and export list are destroyed with it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::ast::{ModuleUnit, TypeKind};
use crate::error::{Error, Result};
use crate::extract;
use crate::glue::GlueCoordinator;
use crate::input::{InputKind, SOURCE_EXT};
use crate::paths::{SearchPaths, PATH_ENV};
use crate::registry::{TypeRecord, TypeRegistry};
use crate::runtime::HostRuntime;

/// External whole-program compiler for queued module inputs.
pub trait ModuleCompiler {
    /// Queue one input file for the next [`ModuleCompiler::compile`]
    /// call.
    fn add_input(&mut self, path: &Path, kind: InputKind) -> Result<()>;

    /// True if any inputs have been queued.
    fn has_inputs(&self) -> bool;

    /// Compile all queued inputs, reporting each module to `hooks`.
    ///
    /// The backend's phase structure guarantees that every module's
    /// `module_parsed` fires before any module's `module_resolved`. On
    /// any module failure compilation aborts and the error is surfaced
    /// unchanged.
    fn compile(&mut self, hooks: &mut dyn CompileHooks) -> Result<()>;
}

/// Listener interface the backend reports compilation progress to.
pub trait CompileHooks {
    /// A module has been parsed; its types are not yet resolved.
    fn module_parsed(&mut self, unit: &ModuleUnit);

    /// Whole-program resolution has finished for this module.
    fn module_resolved(&mut self, unit: &ModuleUnit);

    /// All modules are resolved. May be invoked more than once; the
    /// glue-compilation trigger behind it is idempotent.
    fn compilation_finished(&mut self) -> Result<()>;
}

/// Observer notified of every type the driver records.
pub trait TypeObserver {
    /// Called once per extraction pass for every recorded type, so
    /// twice per declaration over a full run.
    fn new_type(&mut self, record: &TypeRecord);

    /// Called for unit (parser) types once they are resolved.
    fn new_unit(&mut self, _record: &TypeRecord) {}
}

/// Stage the pipeline is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No inputs loaded yet.
    Idle,
    /// Inputs are being queued; re-entrant.
    Loading,
    /// The backend's whole-program compile is running.
    Compiling,
    /// Glue compilation succeeded; terminal success state.
    GlueCompiled,
    /// An unrecoverable error occurred; no further hooks fire.
    Failed,
}

/// Per-run driver state: the registry, the glue coordinator, and the
/// pipeline stage. Explicitly constructed and destroyed with the
/// driver, never global, so independent runs can coexist in one
/// process.
pub struct DriverContext {
    registry: TypeRegistry,
    glue: Box<dyn GlueCoordinator>,
    observer: Option<Box<dyn TypeObserver>>,
    state: PipelineState,
    need_glue: bool,
}

impl DriverContext {
    fn new(glue: Box<dyn GlueCoordinator>) -> Self {
        Self {
            registry: TypeRegistry::new(),
            glue,
            observer: None,
            state: PipelineState::Idle,
            need_glue: true,
        }
    }
}

impl CompileHooks for DriverContext {
    fn module_parsed(&mut self, unit: &ModuleUnit) {
        if self.state == PipelineState::Failed || unit.extension != SOURCE_EXT {
            return;
        }

        let extraction = extract::extract_types(unit, false);
        for record in extraction.types {
            tracing::debug!(id = %record.id, "got type (pre-resolution)");
            if let Some(observer) = &mut self.observer {
                observer.new_type(&record);
            }
            self.registry.record(record);
        }
        for record in extraction.public_enums {
            tracing::debug!(id = %record.id, "auto-exporting public enum");
            self.registry.record_public_enum(record);
        }
    }

    fn module_resolved(&mut self, unit: &ModuleUnit) {
        if self.state == PipelineState::Failed || unit.extension != SOURCE_EXT {
            return;
        }

        let extraction = extract::extract_types(unit, true);
        for record in extraction.types {
            tracing::debug!(id = %record.id, "got type (post-resolution)");
            if let Some(observer) = &mut self.observer {
                observer.new_type(&record);
                if record.def.kind() == TypeKind::Unit {
                    observer.new_unit(&record);
                }
            }
            self.registry.record(record);
        }

        if let Some(path) = &unit.path {
            self.glue.add_module(&unit.id, path);
        }
    }

    fn compilation_finished(&mut self) -> Result<()> {
        // Latch: glue compilation runs at most once per driver, no
        // matter how many times the backend signals completion.
        if !self.need_glue {
            return Ok(());
        }
        self.need_glue = false;

        if self.glue.compile() {
            self.state = PipelineState::GlueCompiled;
            Ok(())
        } else {
            self.state = PipelineState::Failed;
            Err(Error::Glue)
        }
    }
}

/// Compilation driver for Plait modules.
///
/// Owns the metadata registry and the glue coordinator for its entire
/// lifetime and drives the staged sequence: load, compile, extract
/// (pre-resolution), resolve, extract (post-resolution), glue-compile.
pub struct Driver {
    compiler: Box<dyn ModuleCompiler>,
    ctx: DriverContext,
    search_paths: SearchPaths,
}

impl Driver {
    /// Create a driver around a backend compiler and a glue
    /// coordinator. The search path starts from the `PLAIT_PATH`
    /// environment variable.
    pub fn new(compiler: Box<dyn ModuleCompiler>, glue: Box<dyn GlueCoordinator>) -> Self {
        let mut search_paths = SearchPaths::new();
        search_paths.extend_from_env(PATH_ENV);

        Self {
            compiler,
            ctx: DriverContext::new(glue),
            search_paths,
        }
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search_paths
    }

    pub fn search_paths_mut(&mut self) -> &mut SearchPaths {
        &mut self.search_paths
    }

    /// Attach an observer notified of every recorded type.
    pub fn set_observer(&mut self, observer: Box<dyn TypeObserver>) {
        self.ctx.observer = Some(observer);
    }

    pub fn state(&self) -> PipelineState {
        self.ctx.state
    }

    /// Glue coordinator in use by the driver.
    pub fn glue(&self) -> &dyn GlueCoordinator {
        self.ctx.glue.as_ref()
    }

    /// Schedule a file for loading.
    ///
    /// Resolves `file` against `relative_to` and the search paths,
    /// classifies it by extension, then either hands glue-description
    /// files to the glue coordinator immediately or queues the input
    /// with the backend compiler for the next [`Driver::compile`] call.
    /// A failure here does not prevent later `load_file` calls.
    pub fn load_file(&mut self, file: &Path, relative_to: Option<&Path>) -> Result<()> {
        let path = self.search_paths.resolve(file, relative_to)?;
        let kind = InputKind::classify(&path)?;

        if self.ctx.state == PipelineState::Idle {
            self.ctx.state = PipelineState::Loading;
        }

        match kind {
            InputKind::Glue => {
                tracing::debug!(path = %path.display(), "loading glue file");
                if self.ctx.glue.load_glue_file(&path) {
                    Ok(())
                } else {
                    Err(Error::LoadFailure {
                        path,
                        message: "glue file rejected".to_string(),
                    })
                }
            }
            _ => {
                tracing::debug!(path = %path.display(), ?kind, "queueing compiler input");
                self.compiler.add_input(&path, kind)
            }
        }
    }

    /// Compile all queued inputs. No-op success when nothing was ever
    /// queued. On success, triggers glue compilation exactly once per
    /// driver instance.
    pub fn compile(&mut self) -> Result<()> {
        if !self.compiler.has_inputs() {
            return Ok(());
        }

        tracing::debug!("running module compiler");
        self.ctx.state = PipelineState::Compiling;

        if let Err(err) = self.compiler.compile(&mut self.ctx) {
            self.ctx.state = PipelineState::Failed;
            return Err(err);
        }

        // Backends may have signaled completion themselves; the latch
        // makes this second trigger a no-op in that case.
        self.ctx.compilation_finished()?;

        tracing::debug!("module compiler finished");
        Ok(())
    }

    /// Look up a type by fully-qualified name. Available in any
    /// pipeline state, returning only what has been recorded so far.
    pub fn lookup_type(&self, id: &str) -> Result<&TypeRecord> {
        self.ctx.registry.lookup(id)
    }

    /// Look up a type, enforcing its structural kind.
    pub fn lookup_type_kind(&self, id: &str, kind: TypeKind) -> Result<&TypeRecord> {
        self.ctx.registry.lookup_kind(id, kind)
    }

    /// All types seen so far, in registry insertion order. With
    /// `exported_only`, restricts to names exported via glue plus the
    /// auto-exported public enums.
    pub fn types(&self, exported_only: bool) -> Vec<TypeRecord> {
        if !exported_only {
            return self.ctx.registry.iter().cloned().collect();
        }

        let mut names: HashSet<String> = self
            .ctx
            .glue
            .exported_ids()
            .into_iter()
            .map(|(source, _)| source)
            .collect();
        names.extend(self.ctx.registry.public_enums().iter().map(|r| r.id.clone()));

        self.ctx
            .registry
            .iter()
            .filter(|record| names.contains(&record.id))
            .cloned()
            .collect()
    }

    /// Exported types with their host-side target names: explicit glue
    /// exports first, then the auto-exported public enums. Exported
    /// names missing from the registry are reported and skipped.
    pub fn exported_types(&self) -> Vec<(TypeRecord, String)> {
        let mut out = Vec::new();

        for (source, target) in self.ctx.glue.exported_ids() {
            match self.ctx.registry.lookup(&source) {
                Ok(record) => out.push((record.clone(), target)),
                Err(_) => tracing::error!(id = %source, "unknown type exported"),
            }
        }

        for record in self.ctx.registry.public_enums() {
            out.push((record.clone(), record.id.clone()));
        }

        out
    }

    /// Initialize the host runtime before executing compiled output.
    /// Not invoked during pure compilation.
    pub fn init_runtime(&mut self, runtime: &mut dyn HostRuntime) -> Result<()> {
        runtime.init()
    }

    /// Tear the host runtime down after execution.
    pub fn finish_runtime(&mut self, runtime: &mut dyn HostRuntime) -> Result<()> {
        runtime.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Linkage, TypeDef};
    use std::path::PathBuf;

    /// Backend double: hands fixed module units through the hook
    /// protocol without touching the filesystem.
    struct ScriptedCompiler {
        inputs: Vec<PathBuf>,
        units: Vec<ModuleUnit>,
        fail_with: Option<String>,
        finish_twice: bool,
    }

    impl ScriptedCompiler {
        fn new(units: Vec<ModuleUnit>) -> Self {
            Self {
                inputs: Vec::new(),
                units,
                fail_with: None,
                finish_twice: false,
            }
        }
    }

    impl ModuleCompiler for ScriptedCompiler {
        fn add_input(&mut self, path: &Path, _kind: InputKind) -> Result<()> {
            self.inputs.push(path.to_path_buf());
            Ok(())
        }

        fn has_inputs(&self) -> bool {
            !self.inputs.is_empty() || !self.units.is_empty()
        }

        fn compile(&mut self, hooks: &mut dyn CompileHooks) -> Result<()> {
            if let Some(message) = &self.fail_with {
                return Err(Error::Compile {
                    message: message.clone(),
                    context: None,
                });
            }

            for unit in &self.units {
                hooks.module_parsed(unit);
            }
            for unit in &self.units {
                hooks.module_resolved(unit);
            }

            hooks.compilation_finished()?;
            if self.finish_twice {
                hooks.compilation_finished()?;
            }
            Ok(())
        }
    }

    /// Glue double counting compile invocations.
    #[derive(Default)]
    struct CountingGlue {
        exports: Vec<(String, String)>,
        compile_calls: std::rc::Rc<std::cell::Cell<usize>>,
        fail_compile: bool,
    }

    impl GlueCoordinator for CountingGlue {
        fn load_glue_file(&mut self, _path: &Path) -> bool {
            true
        }

        fn compile(&mut self) -> bool {
            self.compile_calls.set(self.compile_calls.get() + 1);
            !self.fail_compile
        }

        fn exported_ids(&self) -> Vec<(String, String)> {
            self.exports.clone()
        }

        fn add_module(&mut self, _id: &str, _path: &Path) {}
    }

    fn module(id: &str, path: Option<&str>, decls: Vec<Decl>) -> ModuleUnit {
        ModuleUnit {
            id: id.to_string(),
            path: path.map(PathBuf::from),
            extension: "plait".to_string(),
            decls,
        }
    }

    fn decl(id: &str, linkage: Linkage, def: TypeDef) -> Decl {
        Decl {
            id: id.to_string(),
            linkage,
            def,
            children: Vec::new(),
        }
    }

    fn enum_def() -> TypeDef {
        TypeDef::Enum {
            labels: vec!["red".into(), "green".into()],
        }
    }

    #[test]
    fn compile_without_inputs_is_noop_success() {
        let glue_calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let glue = CountingGlue {
            compile_calls: glue_calls.clone(),
            ..Default::default()
        };
        let mut driver = Driver::new(
            Box::new(ScriptedCompiler::new(Vec::new())),
            Box::new(glue),
        );

        driver.compile().expect("no-op compile");
        assert_eq!(glue_calls.get(), 0);
        assert_eq!(driver.state(), PipelineState::Idle);
    }

    #[test]
    fn glue_compiles_at_most_once_per_driver() {
        let glue_calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let glue = CountingGlue {
            compile_calls: glue_calls.clone(),
            ..Default::default()
        };

        let mut compiler = ScriptedCompiler::new(vec![module(
            "a",
            Some("a.plait"),
            vec![decl("Color", Linkage::Public, enum_def())],
        )]);
        // The backend signals completion twice, and the driver adds its
        // own trigger on top.
        compiler.finish_twice = true;

        let mut driver = Driver::new(Box::new(compiler), Box::new(glue));
        driver.compile().expect("compile");
        assert_eq!(glue_calls.get(), 1);
        assert_eq!(driver.state(), PipelineState::GlueCompiled);

        driver.compile().expect("second compile");
        assert_eq!(glue_calls.get(), 1);
    }

    #[test]
    fn glue_failure_surfaces_fixed_diagnostic_and_fails_run() {
        let glue = CountingGlue {
            fail_compile: true,
            ..Default::default()
        };
        let mut driver = Driver::new(
            Box::new(ScriptedCompiler::new(vec![module("a", Some("a.plait"), vec![])])),
            Box::new(glue),
        );

        let err = driver.compile().expect_err("glue fails");
        assert!(matches!(err, Error::Glue));
        assert_eq!(driver.state(), PipelineState::Failed);
    }

    #[test]
    fn backend_errors_surface_unchanged() {
        let mut compiler = ScriptedCompiler::new(vec![module("a", Some("a.plait"), vec![])]);
        compiler.fail_with = Some("type error in module a".to_string());

        let mut driver = Driver::new(Box::new(compiler), Box::new(CountingGlue::default()));
        let err = driver.compile().expect_err("backend fails");
        assert_eq!(err.to_string(), "type error in module a");
        assert_eq!(driver.state(), PipelineState::Failed);
    }

    #[test]
    fn post_resolution_records_win() {
        let unit = module(
            "a",
            Some("a.plait"),
            vec![decl("Color", Linkage::Public, enum_def())],
        );
        let mut driver = Driver::new(
            Box::new(ScriptedCompiler::new(vec![unit])),
            Box::new(CountingGlue::default()),
        );

        driver.compile().expect("compile");
        let record = driver.lookup_type("a::Color").expect("recorded");
        assert!(record.is_resolved);
    }

    #[test]
    fn observer_sees_both_passes_and_units_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Default)]
        struct Counts {
            types: Vec<String>,
            units: Vec<String>,
        }

        struct Recorder(Rc<RefCell<Counts>>);

        impl TypeObserver for Recorder {
            fn new_type(&mut self, record: &TypeRecord) {
                self.0.borrow_mut().types.push(record.id.clone());
            }
            fn new_unit(&mut self, record: &TypeRecord) {
                self.0.borrow_mut().units.push(record.id.clone());
            }
        }

        let counts = Rc::new(RefCell::new(Counts::default()));
        let unit = module(
            "a",
            Some("a.plait"),
            vec![decl("Msg", Linkage::Public, TypeDef::Unit { fields: vec![] })],
        );

        let mut driver = Driver::new(
            Box::new(ScriptedCompiler::new(vec![unit])),
            Box::new(CountingGlue::default()),
        );
        driver.set_observer(Box::new(Recorder(counts.clone())));
        driver.compile().expect("compile");

        let counts = counts.borrow();
        assert_eq!(counts.types, ["a::Msg", "a::Msg"]);
        assert_eq!(counts.units, ["a::Msg"]);
    }

    #[test]
    fn exported_types_unions_glue_and_public_enums() {
        let glue = CountingGlue {
            exports: vec![("a::Msg".to_string(), "Host::Message".to_string())],
            ..Default::default()
        };

        let unit = module(
            "a",
            Some("a.plait"),
            vec![
                decl("Color", Linkage::Public, enum_def()),
                decl("Msg", Linkage::Public, TypeDef::Unit { fields: vec![] }),
                decl("Internal", Linkage::Private, TypeDef::Struct { fields: vec![] }),
            ],
        );

        let mut driver = Driver::new(Box::new(ScriptedCompiler::new(vec![unit])), Box::new(glue));
        driver.compile().expect("compile");

        let all: Vec<String> = driver.types(false).into_iter().map(|r| r.id).collect();
        let exported: Vec<String> = driver.types(true).into_iter().map(|r| r.id).collect();

        assert_eq!(all, ["a::Color", "a::Msg", "a::Internal"]);
        assert_eq!(exported, ["a::Color", "a::Msg"]);
        // Exported-only output is a subset of the full listing.
        assert!(exported.iter().all(|id| all.contains(id)));

        let pairs = driver.exported_types();
        assert_eq!(pairs[0].1, "Host::Message");
        assert_eq!(pairs[1].1, "a::Color");
    }

    #[test]
    fn exported_name_missing_from_registry_is_skipped() {
        let glue = CountingGlue {
            exports: vec![("a::Ghost".to_string(), "Host::Ghost".to_string())],
            ..Default::default()
        };
        let unit = module(
            "a",
            Some("a.plait"),
            vec![decl("Color", Linkage::Public, enum_def())],
        );

        let mut driver = Driver::new(Box::new(ScriptedCompiler::new(vec![unit])), Box::new(glue));
        driver.compile().expect("compile");

        let pairs = driver.exported_types();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.id, "a::Color");
    }

    #[test]
    fn second_module_wins_name_collisions() {
        let first = module(
            "x",
            Some("first.plait"),
            vec![decl("T", Linkage::Public, TypeDef::Struct { fields: vec!["a".into()] })],
        );
        let second = module(
            "x",
            Some("second.plait"),
            vec![decl("T", Linkage::Public, TypeDef::Struct { fields: vec!["b".into()] })],
        );

        let mut driver = Driver::new(
            Box::new(ScriptedCompiler::new(vec![first, second])),
            Box::new(CountingGlue::default()),
        );
        driver.compile().expect("compile");

        let record = driver.lookup_type("x::T").expect("recorded");
        assert_eq!(record.module_path, PathBuf::from("second.plait"));
        assert_eq!(record.def, TypeDef::Struct { fields: vec!["b".into()] });
    }

    #[test]
    fn lookup_surface_available_before_compile() {
        let driver = Driver::new(
            Box::new(ScriptedCompiler::new(Vec::new())),
            Box::new(CountingGlue::default()),
        );
        assert!(matches!(
            driver.lookup_type("a::T"),
            Err(Error::UnknownType(_))
        ));
        assert!(driver.types(false).is_empty());
        assert!(driver.types(true).is_empty());
    }
}
