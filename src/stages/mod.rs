//! Stage executors.
//!
//! Each stage is a fixed sequence of tool invocations. The only inter-stage
//! dependency is gate-level simulation synthesizing a missing netlist first.
mod coverage;
mod simulate;
mod synthesize;

use crate::config::ProjectConfig;
use crate::paths::ArtifactPaths;
use crate::runner::ProcessRunner;
use crate::toolchain::Toolchain;

pub use coverage::{coverage_run, CoverageOutput};
pub use simulate::{simulate_gates, simulate_rtl};
pub use synthesize::{synthesis_script, synthesize, SIM_LIBRARY_MARKER};

/// Everything a stage needs, borrowed from the pipeline controller.
pub struct StageContext<'a> {
    pub runner: &'a ProcessRunner,
    pub toolchain: &'a Toolchain,
    pub config: &'a ProjectConfig,
    pub paths: &'a ArtifactPaths,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::StageContext;
    use crate::config::ProjectConfig;
    use crate::fakes::ScriptedExecutor;
    use crate::paths::ArtifactPaths;
    use crate::runner::ProcessRunner;
    use crate::toolchain::{Toolchain, BUNDLED_DIR_NAME};
    use std::fs;
    use tempfile::TempDir;

    /// A temporary project with a bundled toolchain that ships `simlib.v`.
    pub(crate) struct Harness {
        _temp: TempDir,
        pub executor: ScriptedExecutor,
        pub runner: ProcessRunner,
        pub toolchain: Toolchain,
        pub config: ProjectConfig,
        pub paths: ArtifactPaths,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            let temp = tempfile::tempdir().expect("tempdir");
            let root = temp.path().join(BUNDLED_DIR_NAME);
            let datdir = root.join("share").join("yosys");
            fs::create_dir_all(&datdir).expect("create datdir");
            fs::write(datdir.join("simlib.v"), "module \\$and (A, B, Y);\nendmodule\n")
                .expect("write simlib");

            let executor = ScriptedExecutor::new();
            let runner = ProcessRunner::new(Box::new(executor.clone()));
            let toolchain = Toolchain::from_root(root, None, temp.path()).expect("toolchain");
            let config = ProjectConfig::default();
            let paths = ArtifactPaths::new(temp.path().to_path_buf(), &config);
            Self {
                _temp: temp,
                executor,
                runner,
                toolchain,
                config,
                paths,
            }
        }

        /// Make the synthesizer produce the netlist like the real tool would.
        pub(crate) fn synthesizer_writes_netlist(&self) {
            self.executor.writes(
                "yosys",
                self.paths.netlist(),
                "module fpmul(a, b, y);\nendmodule\n",
            );
        }

        pub(crate) fn context(&self) -> StageContext<'_> {
            StageContext {
                runner: &self.runner,
                toolchain: &self.toolchain,
                config: &self.config,
                paths: &self.paths,
            }
        }
    }
}
