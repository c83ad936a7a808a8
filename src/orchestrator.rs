//! Block evaluation pipelines
//!
//! The orchestrator carries everything an evaluation mutates: the artifact
//! counter and the runner. Two orchestrators never share state, so tests
//! and independent callers cannot interfere with each other.
//!
//! Execute: resolve, expand, write source, clean stale unit artifacts,
//! compile, run the binary.
//! Prove: resolve, expand, write source, write project, clear the prover's
//! working directory, prove.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::artifact::ArtifactNamer;
use crate::command::{CommandLine, Toolchain};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::expand::{expand_body, TemplateRegistry};
use crate::params::{BlockParams, RawOptions};
use crate::project::{render_descriptor, PROVER_WORK_DIR};
use crate::runner::{CapturedOutput, ToolRunner};

pub const SOURCE_PREFIX: &str = "ada-src-";
pub const SOURCE_SUFFIX: &str = ".adb";
pub const BINARY_PREFIX: &str = "ada-bin-";
pub const PROJECT_PREFIX: &str = "ada_gpr_";
pub const PROJECT_SUFFIX: &str = ".gpr";

/// Pipeline step that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Compile,
    Run,
    Prove,
}

/// Outcome of a block evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Evaluation {
    /// Every step ran cleanly; `output` is the binary's stdout or the prover's output
    Completed { output: String },
    /// A tool exited non-zero or wrote to stderr; `output` is what it printed
    ToolReported {
        stage: Stage,
        exit_code: Option<i32>,
        output: String,
    },
}

impl Evaluation {
    pub fn output(&self) -> &str {
        match self {
            Evaluation::Completed { output } | Evaluation::ToolReported { output, .. } => output,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Evaluation::Completed { .. })
    }

    fn reported(stage: Stage, captured: &CapturedOutput) -> Self {
        Evaluation::ToolReported {
            stage,
            exit_code: captured.status,
            output: captured.combined(),
        }
    }
}

/// Files and commands of a prepared execute run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutePlan {
    pub source: PathBuf,
    pub binary: PathBuf,
    /// Unit binary and object files cleared before the compile
    pub removed: Vec<PathBuf>,
    pub compile: CommandLine,
    pub run: CommandLine,
}

/// Files and command of a prepared proof run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvePlan {
    pub source: PathBuf,
    pub project: PathBuf,
    pub prove: CommandLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum Plan {
    Execute(ExecutePlan),
    Prove(ProvePlan),
}

pub struct Orchestrator<R> {
    toolchain: Toolchain,
    registry: TemplateRegistry,
    namer: ArtifactNamer,
    runner: R,
}

impl<R: ToolRunner> Orchestrator<R> {
    pub fn new(toolchain: Toolchain, registry: TemplateRegistry, namer: ArtifactNamer, runner: R) -> Self {
        Orchestrator {
            toolchain,
            registry,
            namer,
            runner,
        }
    }

    /// Build from configuration, rooting artifacts at the local or remote temp dir
    pub fn from_config(config: &Config, remote: bool, runner: R) -> Result<Self> {
        let namer = ArtifactNamer::new(config.temp_root().select(remote))?;
        Ok(Self::new(
            config.toolchain()?,
            config.template_registry()?,
            namer,
            runner,
        ))
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn namer(&self) -> &ArtifactNamer {
        &self.namer
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Resolve options and run the execute or prove path, per `:prove`
    pub fn evaluate(&mut self, body: &str, raw: &RawOptions) -> Result<Evaluation> {
        let params = BlockParams::resolve(raw)?;
        if params.prove {
            self.prove(body, &params)
        } else {
            self.execute(body, &params)
        }
    }

    /// Prepare the run `evaluate` would do, without invoking any tool
    pub fn plan(&mut self, body: &str, raw: &RawOptions) -> Result<Plan> {
        let params = BlockParams::resolve(raw)?;
        if params.prove {
            self.prepare_prove(body, &params).map(Plan::Prove)
        } else {
            self.prepare_execute(body, &params).map(Plan::Execute)
        }
    }

    /// Write the source and build the compile and run commands
    pub fn prepare_execute(&mut self, body: &str, params: &BlockParams) -> Result<ExecutePlan> {
        let unit = params.unit.as_deref();
        let source = self.write_source(body, params)?;
        let binary = self.namer.allocate(BINARY_PREFIX, "", unit, true)?;

        // The compiler must start without any earlier binary, .ali or .o
        let removed = match unit {
            Some(unit) => self.namer.remove_stale(unit)?,
            None => Vec::new(),
        };

        let compile = self.toolchain.compile_command(params, &source, &binary)?;
        let run = self.toolchain.run_command(&binary);
        debug!(%compile, %run, "prepared execute commands");

        Ok(ExecutePlan {
            source,
            binary,
            removed,
            compile,
            run,
        })
    }

    /// Write the source and project descriptor and build the prove command
    pub fn prepare_prove(&mut self, body: &str, params: &BlockParams) -> Result<ProvePlan> {
        let unit = params.unit.as_deref();
        let source = self.write_source(body, params)?;

        let project = self.namer.allocate(PROJECT_PREFIX, PROJECT_SUFFIX, unit, true)?;
        write_file(&project, &render_descriptor(&project, &source))?;
        self.namer.remove_dir(PROVER_WORK_DIR)?;

        let prove = self.toolchain.prove_command(params, &project, &source)?;
        debug!(%prove, "prepared prove command");

        Ok(ProvePlan {
            source,
            project,
            prove,
        })
    }

    /// Compile, then run the binary; the binary's stdout is the result
    pub fn execute(&mut self, body: &str, params: &BlockParams) -> Result<Evaluation> {
        let plan = self.prepare_execute(body, params)?;

        let compiled = self.run_tool(&plan.compile)?;
        if compiled.reported_problems() {
            info!(status = ?compiled.status, "compiler reported problems");
            return Ok(Evaluation::reported(Stage::Compile, &compiled));
        }

        let ran = self.run_tool(&plan.run)?;
        if ran.reported_problems() {
            info!(status = ?ran.status, "program reported problems");
            return Ok(Evaluation::reported(Stage::Run, &ran));
        }

        Ok(Evaluation::Completed { output: ran.stdout })
    }

    /// Run the prover over the block; its output is the result
    pub fn prove(&mut self, body: &str, params: &BlockParams) -> Result<Evaluation> {
        let plan = self.prepare_prove(body, params)?;

        let proved = self.run_tool(&plan.prove)?;
        if proved.reported_problems() {
            info!(status = ?proved.status, "prover reported problems");
            return Ok(Evaluation::reported(Stage::Prove, &proved));
        }

        Ok(Evaluation::Completed {
            output: proved.combined(),
        })
    }

    fn write_source(&mut self, body: &str, params: &BlockParams) -> Result<PathBuf> {
        let text = expand_body(body, params, &self.registry)?;
        let source = self
            .namer
            .allocate(SOURCE_PREFIX, SOURCE_SUFFIX, params.unit.as_deref(), false)?;
        write_file(&source, &text)?;
        Ok(source)
    }

    fn run_tool(&mut self, command: &CommandLine) -> Result<CapturedOutput> {
        let dir = self.namer.root().to_path_buf();
        self.runner.run(command, &dir)
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Answers each run with the next queued output
    #[derive(Default)]
    struct Scripted {
        replies: VecDeque<CapturedOutput>,
        seen: Vec<CommandLine>,
    }

    impl ToolRunner for Scripted {
        fn run(&mut self, command: &CommandLine, _dir: &Path) -> Result<CapturedOutput> {
            self.seen.push(command.clone());
            Ok(self.replies.pop_front().unwrap_or_default())
        }
    }

    fn orchestrator(dir: &Path, replies: Vec<CapturedOutput>) -> Orchestrator<Scripted> {
        Orchestrator::new(
            Toolchain::default(),
            TemplateRegistry::builtin(),
            ArtifactNamer::new(dir).unwrap(),
            Scripted {
                replies: replies.into(),
                seen: Vec::new(),
            },
        )
    }

    #[test]
    fn test_execute_returns_binary_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(
            dir.path(),
            vec![CapturedOutput::success("gcc -c ada-src-000001.adb\n"), CapturedOutput::success("42\n")],
        );

        let result = orch.execute("null;", &BlockParams::default()).unwrap();
        assert_eq!(result, Evaluation::Completed { output: "42\n".into() });

        let seen = &orch.runner().seen;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].program, "gnatmake");
        assert_eq!(seen[1].program, dir.path().join("ada-bin-000001").to_string_lossy());
    }

    #[test]
    fn test_compile_failure_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), vec![CapturedOutput::failure(4, "x.adb:1:01: error\n")]);

        let result = orch.execute("bogus", &BlockParams::default()).unwrap();
        assert_eq!(
            result,
            Evaluation::ToolReported {
                stage: Stage::Compile,
                exit_code: Some(4),
                output: "x.adb:1:01: error\n".into(),
            }
        );
        assert_eq!(orch.runner().seen.len(), 1);
    }

    #[test]
    fn test_run_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(
            dir.path(),
            vec![
                CapturedOutput::success(""),
                CapturedOutput::failure(1, "raised CONSTRAINT_ERROR\n"),
            ],
        );

        let result = orch.execute("null;", &BlockParams::default()).unwrap();
        assert!(matches!(result, Evaluation::ToolReported { stage: Stage::Run, .. }));
        assert_eq!(result.output(), "raised CONSTRAINT_ERROR\n");
    }

    #[test]
    fn test_prove_writes_project_and_clears_workdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(PROVER_WORK_DIR).join("stale")).unwrap();
        let mut orch = orchestrator(dir.path(), vec![CapturedOutput::success("Summary: proved\n")]);

        let params = BlockParams {
            prove: true,
            unit: Some("counter".into()),
            ..BlockParams::default()
        };
        let result = orch.prove("package Counter is end Counter;", &params).unwrap();
        assert_eq!(result.output(), "Summary: proved\n");

        assert!(!dir.path().join(PROVER_WORK_DIR).exists());
        let gpr = fs::read_to_string(dir.path().join("counter.gpr")).unwrap();
        assert!(gpr.contains("for Main use (\"counter.adb\");"));
        let seen = &orch.runner().seen;
        assert_eq!(seen[0].args[0], format!("-P{}", dir.path().join("counter.gpr").display()));
    }

    #[test]
    fn test_evaluate_dispatches_on_prove() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), vec![CapturedOutput::success("ok\n")]);

        let raw = RawOptions::new().with("prove", "yes").with("level", "1");
        orch.evaluate("null;", &raw).unwrap();
        assert_eq!(orch.runner().seen[0].program, "gnatprove");
        assert!(orch.runner().seen[0].contains("--level=1"));
    }

    #[test]
    fn test_plan_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), Vec::new());

        let plan = orch.plan("null;", &RawOptions::new()).unwrap();
        let Plan::Execute(plan) = plan else {
            panic!("expected execute plan");
        };
        assert!(plan.source.ends_with("ada-src-000001.adb"));
        assert!(plan.binary.ends_with("ada-bin-000001"));
        assert!(orch.runner().seen.is_empty());
    }

    #[test]
    fn test_unit_plan_leaves_no_binary_behind() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Foo", "Foo.ali", "Foo.o"] {
            fs::write(dir.path().join(name), "old").unwrap();
        }
        let mut orch = orchestrator(dir.path(), Vec::new());

        let raw = RawOptions::new().with("unit", "Foo");
        let Plan::Execute(plan) = orch.plan("null;", &raw).unwrap() else {
            panic!("expected execute plan");
        };
        assert_eq!(plan.binary, dir.path().join("Foo"));
        assert_eq!(plan.removed.len(), 3);
        assert!(!plan.binary.exists());
        assert!(!dir.path().join("Foo.ali").exists());
        assert!(!dir.path().join("Foo.o").exists());
        assert!(plan.source.exists());
    }

    #[test]
    fn test_session_is_refused_before_anything_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), Vec::new());
        let raw = RawOptions::new().with("session", "main");
        assert!(matches!(orch.evaluate("null;", &raw), Err(Error::SessionUnsupported(_))));
        assert_eq!(orch.namer().counter(), 0);
    }
}
