//! In-memory test doubles for the process layer.
use crate::runner::{CommandResult, CommandSpec, Executor};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Default)]
struct ScriptState {
    calls: Vec<CommandSpec>,
    responses: HashMap<String, CommandResult>,
    missing: HashSet<String>,
    outputs: HashMap<String, Vec<(PathBuf, String)>>,
}

/// Executor that records every call and answers from a script.
///
/// Programs are matched by file name. Unscripted programs succeed with empty
/// output. Clones share state, so a test can keep a handle after boxing one
/// into a runner.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `program` with `result`.
    pub fn respond(&self, program: &str, result: CommandResult) {
        self.state
            .borrow_mut()
            .responses
            .insert(program.to_string(), result);
    }

    /// Fail every call to `program` as if it were not installed.
    pub fn missing(&self, program: &str) {
        self.state.borrow_mut().missing.insert(program.to_string());
    }

    /// Write `contents` to `path` whenever `program` runs successfully.
    pub fn writes(&self, program: &str, path: PathBuf, contents: &str) {
        self.state
            .borrow_mut()
            .outputs
            .entry(program.to_string())
            .or_default()
            .push((path, contents.to_string()));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.state.borrow().calls.clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::program_name).collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.programs().iter().filter(|name| *name == program).count()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, spec: &CommandSpec, capture_output: bool) -> io::Result<CommandResult> {
        let name = spec.program_name();
        let mut state = self.state.borrow_mut();
        state.calls.push(spec.clone());
        if state.missing.contains(&name) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{name}: not found"),
            ));
        }
        let mut result = state
            .responses
            .get(&name)
            .cloned()
            .unwrap_or_else(CommandResult::success);
        if result.succeeded() {
            for (path, contents) in state.outputs.get(&name).into_iter().flatten() {
                fs::write(path, contents)?;
            }
        }
        if !capture_output {
            result.stdout = None;
            result.stderr = None;
        }
        Ok(result)
    }
}
