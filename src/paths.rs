//! Typed paths into a project directory.
//!
//! Stages pass relative names to the tools (children run in the project
//! directory) and use these absolute paths for their own existence checks.
use crate::config::ProjectConfig;
use std::env;
use std::path::{Path, PathBuf};

/// Marker written after a successful synthesis.
pub const SYNTHESIS_MARKER: &str = "synthesis_successful";
/// Raw coverage database written by the instrumented simulation.
pub const COVERAGE_DB: &str = "coverage.dat";
/// Portable coverage info converted from the raw database.
pub const COVERAGE_INFO: &str = "coverage.info";
/// HTML coverage report directory.
pub const COVERAGE_REPORT_DIR: &str = "coverage_report";

/// Locations of every artifact the pipeline reads or writes.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    root: PathBuf,
    config: ProjectConfig,
}

impl ArtifactPaths {
    pub fn new(root: PathBuf, config: &ProjectConfig) -> Self {
        Self {
            root,
            config: config.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rtl_binary(&self) -> PathBuf {
        self.root.join(&self.config.rtl_binary)
    }

    pub fn gates_binary(&self) -> PathBuf {
        self.root.join(&self.config.gates_binary)
    }

    pub fn netlist(&self) -> PathBuf {
        self.root.join(&self.config.netlist)
    }

    pub fn synthesis_marker(&self) -> PathBuf {
        self.root.join(SYNTHESIS_MARKER)
    }

    pub fn coverage_db(&self) -> PathBuf {
        self.root.join(COVERAGE_DB)
    }

    pub fn coverage_info(&self) -> PathBuf {
        self.root.join(COVERAGE_INFO)
    }

    pub fn coverage_report_dir(&self) -> PathBuf {
        self.root.join(COVERAGE_REPORT_DIR)
    }

    pub fn coverage_workdir(&self) -> PathBuf {
        self.root.join(&self.config.coverage_workdir)
    }

    pub fn placeholder_name(&self) -> &str {
        &self.config.placeholder
    }

    pub fn coverage_config(&self) -> PathBuf {
        self.root.join(&self.config.coverage_config)
    }

    /// Instrumented simulation binary produced by the coverage compiler.
    pub fn coverage_binary(&self) -> PathBuf {
        self.coverage_workdir().join(format!(
            "V{}{}",
            self.config.testbench_module,
            env::consts::EXE_SUFFIX
        ))
    }

    /// Annotated copy of the top-module source written by the reporter.
    pub fn annotated_source(&self) -> PathBuf {
        self.coverage_workdir().join(self.config.top_source())
    }

    /// Files removed by `clean`, including Windows-style binary names.
    pub fn clean_files(&self) -> Vec<PathBuf> {
        vec![
            self.rtl_binary(),
            self.gates_binary(),
            self.netlist(),
            self.synthesis_marker(),
            self.coverage_db(),
            self.coverage_info(),
            self.root.join(format!("{}.exe", self.config.rtl_binary)),
            self.root.join(format!("{}.exe", self.config.gates_binary)),
        ]
    }

    /// Directories removed whole by `clean`.
    pub fn clean_dirs(&self) -> Vec<PathBuf> {
        vec![self.coverage_report_dir()]
    }

    /// Render `path` relative to the project root when possible.
    pub fn display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => relative.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }
}
