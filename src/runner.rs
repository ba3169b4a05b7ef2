//! External process execution and failure classification.
//!
//! Commands are always spawned directly from an argument vector; no shell is
//! involved. The [`Executor`] seam keeps the runner testable without real
//! EDA tools installed.
use crate::error::{Diagnosis, PipelineError, ProcessError, ProcessErrorKind};
use crate::toolchain::SearchPath;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// One external invocation: a program and its literal arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// File name of the program, used to match commands in logs and tests.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Render the invocation as a copy-pasteable command line.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().cloned());
        shell_words::join(parts)
    }
}

/// Outcome of an invocation that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn from_status(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
            signal: exit_signal(&status),
            stdout: None,
            stderr: None,
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Starts external programs. Implementations must not go through a shell.
pub trait Executor {
    /// Run `spec` to completion. With `capture_output` unset the child
    /// inherits the parent's standard streams.
    fn execute(&self, spec: &CommandSpec, capture_output: bool) -> io::Result<CommandResult>;
}

/// Executor backed by `std::process::Command`.
///
/// Every child runs in `working_dir` with `PATH` set to the search path
/// computed at startup.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    working_dir: PathBuf,
    search_path: SearchPath,
}

impl SystemExecutor {
    pub fn new(working_dir: PathBuf, search_path: SearchPath) -> Self {
        Self {
            working_dir,
            search_path,
        }
    }
}

impl Executor for SystemExecutor {
    fn execute(&self, spec: &CommandSpec, capture_output: bool) -> io::Result<CommandResult> {
        let mut command = Command::new(spec.program());
        command
            .args(spec.arguments())
            .current_dir(&self.working_dir)
            .env("PATH", self.search_path.as_os_str());

        if !capture_output {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()?;
            return Ok(CommandResult::from_status(status));
        }

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        let mut result = CommandResult::from_status(output.status);
        result.stdout = Some(String::from_utf8_lossy(&output.stdout).into_owned());
        result.stderr = Some(String::from_utf8_lossy(&output.stderr).into_owned());
        Ok(result)
    }
}

/// Per-invocation switches for [`ProcessRunner::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub capture_output: bool,
    pub allow_failure: bool,
}

impl RunOptions {
    /// Stream output live and treat failure as fatal.
    pub fn streamed() -> Self {
        Self::default()
    }

    /// Capture output and treat failure as fatal.
    pub fn captured() -> Self {
        Self {
            capture_output: true,
            allow_failure: false,
        }
    }

    /// Hand failures back to the caller instead of ending the run.
    pub fn allowing_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }
}

/// Runs commands and classifies their failures.
pub struct ProcessRunner {
    executor: Box<dyn Executor>,
}

impl ProcessRunner {
    pub fn new(executor: Box<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Run a command.
    ///
    /// Returns the trimmed standard output when `capture_output` is set.
    /// On failure, `allow_failure` yields the recoverable
    /// [`PipelineError::Process`]; otherwise the failure is diagnosed into
    /// [`PipelineError::ToolFailed`], which ends the run.
    pub fn run(
        &self,
        spec: &CommandSpec,
        options: RunOptions,
    ) -> Result<Option<String>, PipelineError> {
        tracing::debug!(command = %spec.command_line(), capture = options.capture_output, "running");
        match self.invoke(spec, options.capture_output) {
            Ok(stdout) => Ok(stdout),
            Err(err) if options.allow_failure => {
                tracing::debug!(error = %err, "tolerated command failure");
                Err(PipelineError::Process(err))
            }
            Err(err) => Err(PipelineError::ToolFailed(Diagnosis::from_process_error(
                &err,
            ))),
        }
    }

    fn invoke(&self, spec: &CommandSpec, capture_output: bool) -> Result<Option<String>, ProcessError> {
        let result = self
            .executor
            .execute(spec, capture_output)
            .map_err(|err| spawn_error(spec, &err))?;
        if result.succeeded() {
            let stdout = if capture_output {
                Some(result.stdout.unwrap_or_default().trim().to_string())
            } else {
                None
            };
            return Ok(stdout);
        }
        Err(exit_error(spec, result))
    }
}

fn spawn_error(spec: &CommandSpec, err: &io::Error) -> ProcessError {
    let kind = if err.kind() == io::ErrorKind::NotFound {
        ProcessErrorKind::NotFound
    } else {
        ProcessErrorKind::Spawn
    };
    ProcessError {
        kind,
        command_line: spec.command_line(),
        exit_code: None,
        signal: None,
        stderr: None,
        detail: Some(err.to_string()),
    }
}

fn exit_error(spec: &CommandSpec, result: CommandResult) -> ProcessError {
    let kind = if result.exit_code.is_none() && result.signal.is_some() {
        ProcessErrorKind::Signaled
    } else {
        ProcessErrorKind::NonZeroExit
    };
    ProcessError {
        kind,
        command_line: spec.command_line(),
        exit_code: result.exit_code,
        signal: result.signal,
        stderr: result.stderr,
        detail: None,
    }
}
