//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Log file the stub tools append their names to.
pub const CALL_LOG: &str = "calls.log";

/// A throwaway project directory with its own bundled toolchain root.
pub struct TestProject {
    temp: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("oss-cad-suite")).expect("create toolchain root");
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn toolchain_root(&self) -> PathBuf {
        self.root().join("oss-cad-suite")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, contents).expect("write file");
    }

    /// Install a `/bin/sh` stub for `name` in the bundled `bin/` directory.
    ///
    /// Every stub records its name in `calls.log` before running `body`.
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn stub_tool(&self, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.toolchain_root().join("bin");
        fs::create_dir_all(&bin).expect("create bin dir");
        let path = bin.join(name);
        let script = format!("#!/bin/sh\necho {name} >> {CALL_LOG}\n{body}\n");
        fs::write(&path, script).expect("write stub");
        let mut perms = fs::metadata(&path).expect("stub metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod stub");
    }

    /// Ship a simulation library in the bundled data directory.
    #[allow(dead_code)]
    pub fn install_sim_library(&self, contents: &str) {
        self.write("oss-cad-suite/share/yosys/simlib.v", contents);
    }

    /// Tool names recorded by the stubs, in call order.
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path(CALL_LOG))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Run `simflow` against this project.
    pub fn simflow(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_simflow"))
            .args(args)
            .arg("--project-dir")
            .arg(self.root())
            .arg("--toolchain-dir")
            .arg(self.toolchain_root())
            .env_remove("SIMFLOW_TOOLCHAIN_DIR")
            .env_remove("RUST_LOG")
            .output()
            .expect("run simflow")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
