//! Toolchain discovery.
//!
//! A bundled OSS CAD Suite install next to the program (or in the project)
//! is preferred over whatever is on `PATH`. Discovery runs once at startup;
//! the resulting [`SearchPath`] is handed to the process runner instead of
//! being written back into this process's environment.
use crate::error::PipelineError;
use crate::runner::{CommandSpec, ProcessRunner, RunOptions};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Directory name of a bundled toolchain install.
pub const BUNDLED_DIR_NAME: &str = "oss-cad-suite";

/// External tools the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    Synthesizer,
    SynthesizerConfig,
    Compiler,
    SimulationRunner,
    CoverageCompiler,
    CoverageReporter,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Synthesizer,
        Tool::SynthesizerConfig,
        Tool::Compiler,
        Tool::SimulationRunner,
        Tool::CoverageCompiler,
        Tool::CoverageReporter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Synthesizer => "yosys",
            Tool::SynthesizerConfig => "yosys-config",
            Tool::Compiler => "iverilog",
            Tool::SimulationRunner => "vvp",
            Tool::CoverageCompiler => "verilator",
            Tool::CoverageReporter => "verilator_coverage",
        }
    }

    /// Name of the executable file on this platform.
    ///
    /// `yosys-config` ships as a script and never carries the suffix.
    pub fn file_name(self) -> String {
        match self {
            Tool::SynthesizerConfig => self.name().to_string(),
            _ => format!("{}{}", self.name(), env::consts::EXE_SUFFIX),
        }
    }
}

/// Executable search path for spawned tools: bundled directories first,
/// then the inherited `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    prepended: Vec<PathBuf>,
    joined: OsString,
}

impl SearchPath {
    pub fn new(prepended: Vec<PathBuf>, inherited: Option<OsString>) -> Result<Self, PipelineError> {
        let mut entries = prepended.clone();
        if let Some(inherited) = inherited.as_ref().filter(|value| !value.is_empty()) {
            entries.extend(env::split_paths(inherited));
        }
        let joined = env::join_paths(entries)?;
        Ok(Self { prepended, joined })
    }

    /// Directories added in front of the inherited `PATH`.
    pub fn prepended(&self) -> &[PathBuf] {
        &self.prepended
    }

    pub fn as_os_str(&self) -> &OsStr {
        &self.joined
    }

    pub fn entries(&self) -> Vec<PathBuf> {
        env::split_paths(&self.joined).collect()
    }
}

/// Resolved executable path for every [`Tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    paths: BTreeMap<Tool, PathBuf>,
}

impl ToolPaths {
    /// Resolve each tool: bundled `bin/` first, then the search path, then
    /// the bare name so a missing tool only fails when it is used.
    pub fn resolve(bin_dir: &Path, search_path: &SearchPath, cwd: &Path) -> Self {
        let paths = Tool::ALL
            .into_iter()
            .map(|tool| (tool, resolve_tool(tool, bin_dir, search_path, cwd)))
            .collect();
        Self { paths }
    }

    pub fn get(&self, tool: Tool) -> &Path {
        self.paths
            .get(&tool)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(tool.name()))
    }
}

fn resolve_tool(tool: Tool, bin_dir: &Path, search_path: &SearchPath, cwd: &Path) -> PathBuf {
    let bundled = bin_dir.join(tool.file_name());
    if bundled.is_file() {
        return bundled;
    }
    match which::which_in(tool.name(), Some(search_path.as_os_str()), cwd) {
        Ok(found) => found,
        Err(_) => {
            tracing::debug!(tool = tool.name(), "tool not found on search path");
            PathBuf::from(tool.file_name())
        }
    }
}

/// Inputs for [`Toolchain::discover`].
#[derive(Debug, Clone)]
pub struct ToolchainOptions {
    /// Explicit toolchain root, taking precedence over the defaults.
    pub root_override: Option<PathBuf>,
    pub project_dir: PathBuf,
    /// Inherited `PATH` value.
    pub inherited_path: Option<OsString>,
}

/// Candidate toolchain roots, most preferred first.
pub fn candidate_roots(options: &ToolchainOptions) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(root) = &options.root_override {
        roots.push(root.clone());
    }
    if let Some(exe_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir.join(BUNDLED_DIR_NAME));
    }
    roots.push(options.project_dir.join(BUNDLED_DIR_NAME));
    roots
}

/// The located toolchain: tool paths, the search path for children, and the
/// lazily resolved synthesizer data directory.
#[derive(Debug)]
pub struct Toolchain {
    root: PathBuf,
    search_path: SearchPath,
    tools: ToolPaths,
    data_dir: OnceCell<PathBuf>,
}

impl Toolchain {
    /// Pick the first existing candidate root and resolve tools against it.
    pub fn discover(options: &ToolchainOptions) -> Result<Self, PipelineError> {
        let candidates = candidate_roots(options);
        let root = candidates
            .iter()
            .find(|root| root.is_dir())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| options.project_dir.join(BUNDLED_DIR_NAME));
        if let Some(requested) = &options.root_override {
            if !requested.is_dir() {
                tracing::warn!(root = %requested.display(), "requested toolchain directory does not exist");
            }
        }
        Self::from_root(root, options.inherited_path.clone(), &options.project_dir)
    }

    /// Build a toolchain rooted at `root`, which may not exist.
    pub fn from_root(
        root: PathBuf,
        inherited_path: Option<OsString>,
        cwd: &Path,
    ) -> Result<Self, PipelineError> {
        let prepended: Vec<PathBuf> = [root.join("bin"), root.join("lib")]
            .into_iter()
            .filter(|dir| dir.is_dir())
            .filter_map(|dir| dir.canonicalize().ok())
            .collect();
        if prepended.is_empty() {
            tracing::info!(root = %root.display(), "no bundled toolchain, using PATH");
        } else {
            tracing::info!(root = %root.display(), "using bundled toolchain");
        }
        let search_path = SearchPath::new(prepended, inherited_path)?;
        let tools = ToolPaths::resolve(&root.join("bin"), &search_path, cwd);
        Ok(Self {
            root,
            search_path,
            tools,
            data_dir: OnceCell::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn tool(&self, tool: Tool) -> &Path {
        self.tools.get(tool)
    }

    /// Where a bundled install keeps the synthesizer's data files.
    pub fn bundled_data_dir(&self) -> PathBuf {
        self.root.join("share").join("yosys")
    }

    /// Resolve the synthesizer data directory.
    ///
    /// Tries the bundled layout first, then asks `yosys-config --datdir`.
    /// The answer is cached for the rest of the run.
    pub fn synth_data_dir(&self, runner: &ProcessRunner) -> Result<PathBuf, PipelineError> {
        if let Some(dir) = self.data_dir.get() {
            return Ok(dir.clone());
        }
        println!("[...] Finding Yosys data directory...");
        let dir = self.query_data_dir(runner)?;
        tracing::info!(datdir = %dir.display(), "resolved synthesizer data directory");
        Ok(self.data_dir.get_or_init(|| dir).clone())
    }

    fn query_data_dir(&self, runner: &ProcessRunner) -> Result<PathBuf, PipelineError> {
        let bundled = self.bundled_data_dir();
        if bundled.is_dir() {
            return Ok(bundled);
        }

        let query = CommandSpec::new(self.tool(Tool::SynthesizerConfig)).arg("--datdir");
        match runner.run(&query, RunOptions::captured().allowing_failure()) {
            Ok(Some(datdir)) if !datdir.is_empty() => return Ok(PathBuf::from(datdir)),
            Ok(_) => tracing::warn!("yosys-config printed no data directory"),
            Err(PipelineError::Process(err)) => {
                tracing::warn!(error = %err, "yosys-config query failed");
            }
            Err(err) => return Err(err),
        }
        Err(PipelineError::ToolchainUnresolved {
            checked: bundled,
            tried: query.command_line(),
        })
    }

    /// Path of the simulation primitive library inside `datdir`.
    pub fn sim_library(datdir: &Path) -> PathBuf {
        datdir.join("simlib.v")
    }
}
