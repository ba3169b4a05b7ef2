//! Pipeline controller: maps a build target to its stage.
//!
//! Environment setup (toolchain discovery and the child search path) happens
//! once in [`Pipeline::new`], before any stage runs.
use crate::artifacts;
use crate::config::ProjectConfig;
use crate::error::PipelineError;
use crate::paths::ArtifactPaths;
use crate::runner::{ProcessRunner, SystemExecutor};
use crate::stages::{self, CoverageOutput, StageContext};
use crate::toolchain::{Toolchain, ToolchainOptions};
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

/// Build targets; exactly one runs per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildTarget {
    /// Remove generated files
    #[value(name = "clean")]
    Clean,
    /// Run Yosys synthesis (creates the gate-level netlist)
    #[value(name = "syn")]
    Synthesize,
    /// Run RTL simulation
    #[value(name = "simrtl")]
    SimulateRtl,
    /// Run gate-level simulation (synthesizes first if needed)
    #[value(name = "simgates")]
    SimulateGates,
    /// Run the Verilator coverage flow and report line coverage
    #[value(name = "rtlCoverage")]
    Coverage,
}

impl BuildTarget {
    pub fn name(self) -> &'static str {
        match self {
            BuildTarget::Clean => "clean",
            BuildTarget::Synthesize => "syn",
            BuildTarget::SimulateRtl => "simrtl",
            BuildTarget::SimulateGates => "simgates",
            BuildTarget::Coverage => "rtlCoverage",
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the coverage summary is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
}

/// Inputs for [`Pipeline::new`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub project_dir: PathBuf,
    pub toolchain_dir: Option<PathBuf>,
    pub summary_format: SummaryFormat,
}

/// The configured pipeline for one project.
pub struct Pipeline {
    config: ProjectConfig,
    paths: ArtifactPaths,
    toolchain: Toolchain,
    runner: ProcessRunner,
    summary_format: SummaryFormat,
}

impl Pipeline {
    /// Locate the toolchain and build the process runner.
    pub fn new(config: ProjectConfig, options: PipelineOptions) -> Result<Self, PipelineError> {
        let project_dir = options
            .project_dir
            .canonicalize()
            .map_err(|err| {
                PipelineError::io(
                    format!("resolve project directory {}", options.project_dir.display()),
                    err,
                )
            })?;
        let toolchain = Toolchain::discover(&ToolchainOptions {
            root_override: options.toolchain_dir,
            project_dir: project_dir.clone(),
            inherited_path: std::env::var_os("PATH"),
        })?;
        let executor = SystemExecutor::new(project_dir.clone(), toolchain.search_path().clone());
        let runner = ProcessRunner::new(Box::new(executor));
        Ok(Self::with_parts(
            config,
            project_dir,
            toolchain,
            runner,
            options.summary_format,
        ))
    }

    /// Assemble a pipeline from already-built parts.
    pub fn with_parts(
        config: ProjectConfig,
        project_dir: PathBuf,
        toolchain: Toolchain,
        runner: ProcessRunner,
        summary_format: SummaryFormat,
    ) -> Self {
        let paths = ArtifactPaths::new(project_dir, &config);
        Self {
            config,
            paths,
            toolchain,
            runner,
            summary_format,
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    fn context(&self) -> StageContext<'_> {
        StageContext {
            runner: &self.runner,
            toolchain: &self.toolchain,
            config: &self.config,
            paths: &self.paths,
        }
    }

    /// Run one target to completion.
    pub fn run(&self, target: BuildTarget) -> Result<(), PipelineError> {
        tracing::info!(%target, root = %self.paths.root().display(), "running target");
        let ctx = self.context();
        match target {
            BuildTarget::Clean => {
                let report = artifacts::clean(&self.paths);
                if !report.is_clean() {
                    tracing::warn!(
                        failures = report.failures.len(),
                        "clean left some entries behind"
                    );
                }
                Ok(())
            }
            BuildTarget::Synthesize => stages::synthesize(&ctx),
            BuildTarget::SimulateRtl => stages::simulate_rtl(&ctx),
            BuildTarget::SimulateGates => stages::simulate_gates(&ctx),
            BuildTarget::Coverage => {
                if let CoverageOutput::Counted(counters) = stages::coverage_run(&ctx)? {
                    self.print_summary(&counters.summary());
                }
                Ok(())
            }
        }
    }

    fn print_summary(&self, summary: &crate::coverage::CoverageSummary) {
        match self.summary_format {
            SummaryFormat::Text => println!("{summary}"),
            SummaryFormat::Json => match serde_json::to_string_pretty(summary) {
                Ok(json) => println!("{json}"),
                Err(err) => tracing::warn!(error = %err, "cannot serialize coverage summary"),
            },
        }
    }
}
