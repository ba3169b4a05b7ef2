//! Project configuration.
//!
//! Design names and the artifact layout come from an optional
//! `simflow.json` in the project directory. Every field has a default, so a
//! project that follows the stock layout needs no config file at all.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};

/// Config file looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "simflow.json";

/// Design and artifact names for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Top-level design module; `<top_module>.v` is the synthesis input.
    pub top_module: String,
    pub rtl_sources: Vec<String>,
    pub testbench: String,
    /// Module name of the testbench, used as the coverage top module.
    pub testbench_module: String,
    /// Synthesized gate-level netlist.
    pub netlist: String,
    pub rtl_binary: String,
    pub gates_binary: String,
    /// Coverage working directory; holds the compiled model and annotations.
    pub coverage_workdir: String,
    /// Entry in the coverage working directory that `clean` never removes.
    pub placeholder: String,
    /// Optional coverage-compiler override file, passed only when present.
    pub coverage_config: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            top_module: "fpmul".to_string(),
            rtl_sources: vec!["fpmul.v".to_string()],
            testbench: "fpmul_stim1_new.v".to_string(),
            testbench_module: "fpmul_stim1_v_tf".to_string(),
            netlist: "fpmul_syn.v".to_string(),
            rtl_binary: "simrtl".to_string(),
            gates_binary: "simgates".to_string(),
            coverage_workdir: "obj_dir".to_string(),
            placeholder: ".hello".to_string(),
            coverage_config: "config.vlt".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Source file the synthesizer reads.
    pub fn top_source(&self) -> String {
        format!("{}.v", self.top_module)
    }
}

/// Load the project config.
///
/// An explicit path must exist. Without one, `simflow.json` in
/// `project_dir` is used when present and defaults otherwise.
pub fn load_config(project_dir: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = project_dir.join(CONFIG_FILE_NAME);
            if !default_path.is_file() {
                tracing::debug!(path = %default_path.display(), "no project config, using defaults");
                return Ok(ProjectConfig::default());
            }
            default_path
        }
    };
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: ProjectConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse project config {}", path.display()))?;
    validate_config(&config)?;
    tracing::info!(path = %path.display(), top = %config.top_module, "loaded project config");
    Ok(config)
}

/// Validate names and relative paths.
pub fn validate_config(config: &ProjectConfig) -> Result<()> {
    let names = [
        ("top_module", &config.top_module),
        ("testbench_module", &config.testbench_module),
        ("placeholder", &config.placeholder),
    ];
    for (label, value) in names {
        if value.trim().is_empty() {
            return Err(anyhow!("{label} must be non-empty"));
        }
    }
    if config.rtl_sources.is_empty() {
        return Err(anyhow!("rtl_sources must list at least one file"));
    }
    for source in &config.rtl_sources {
        validate_relative_path(source, "rtl_sources")?;
    }
    let files = [
        ("testbench", &config.testbench),
        ("netlist", &config.netlist),
        ("rtl_binary", &config.rtl_binary),
        ("gates_binary", &config.gates_binary),
        ("coverage_workdir", &config.coverage_workdir),
        ("coverage_config", &config.coverage_config),
    ];
    for (label, value) in files {
        validate_relative_path(value, label)?;
    }
    if config.rtl_binary == config.gates_binary {
        return Err(anyhow!(
            "rtl_binary and gates_binary must differ (both {:?})",
            config.rtl_binary
        ));
    }
    if Path::new(&config.placeholder).components().count() != 1 {
        return Err(anyhow!(
            "placeholder must be a single entry name (got {:?})",
            config.placeholder
        ));
    }
    Ok(())
}

fn validate_relative_path(rel: &str, label: &str) -> Result<()> {
    if rel.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    let path = Path::new(rel);
    if path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} entries must be relative paths without '..' (got {rel:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::ParentDir))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
