//! Error types shared by the runner, the toolchain locator, and the stages.
//!
//! Two tiers exist: [`PipelineError::Process`] is the recoverable tier and is
//! only produced when a caller asked for `allow_failure`; every other variant
//! is fatal and ends the run with exit status 1.
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code reported on Windows when a required DLL cannot be loaded
/// (`STATUS_DLL_NOT_FOUND`, 0xC0000135).
pub const MISSING_SHARED_LIBRARY_EXIT_CODE: i32 = -1_073_741_515;

/// Why an external invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorKind {
    /// The executable could not be found.
    NotFound,
    /// The program ran and exited with a non-zero code.
    NonZeroExit,
    /// The program was terminated by a signal (Unix only).
    Signaled,
    /// The program could not be started for another reason.
    Spawn,
}

/// Failure of a single external invocation.
#[derive(Debug, Clone)]
pub struct ProcessError {
    pub kind: ProcessErrorKind,
    /// The failing command line, rendered exactly as it was invoked.
    pub command_line: String,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    /// Captured standard error, when output capture was enabled.
    pub stderr: Option<String>,
    /// Spawn error text for `NotFound`/`Spawn`.
    pub detail: Option<String>,
}

impl ProcessError {
    fn summary(&self) -> String {
        match self.kind {
            ProcessErrorKind::NotFound => format!("{}: command not found", self.command_line),
            ProcessErrorKind::NonZeroExit => format!(
                "{}: exited with code {}",
                self.command_line,
                self.exit_code.unwrap_or(-1)
            ),
            ProcessErrorKind::Signaled => format!(
                "{}: terminated by signal {}",
                self.command_line,
                self.signal.unwrap_or(0)
            ),
            ProcessErrorKind::Spawn => format!(
                "{}: failed to start: {}",
                self.command_line,
                self.detail.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ProcessError {}

/// Rendered report for a fatal tool failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub command_line: String,
    pub exit_code: Option<i32>,
    pub hint: Option<String>,
    pub stderr: Option<String>,
}

impl Diagnosis {
    pub fn from_process_error(err: &ProcessError) -> Self {
        let hint = match err.kind {
            ProcessErrorKind::NotFound => Some("Command not found in PATH.".to_string()),
            ProcessErrorKind::NonZeroExit
                if err.exit_code == Some(MISSING_SHARED_LIBRARY_EXIT_CODE) =>
            {
                Some("Missing DLLs (0xC0000135).".to_string())
            }
            ProcessErrorKind::Signaled => err
                .signal
                .map(|signal| format!("Terminated by signal {signal}.")),
            ProcessErrorKind::Spawn => err.detail.clone(),
            ProcessErrorKind::NonZeroExit => None,
        };
        let stderr = err
            .stderr
            .as_deref()
            .map(str::trim_end)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Self {
            command_line: err.command_line.clone(),
            exit_code: err.exit_code,
            hint,
            stderr,
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command failed: {}", self.command_line)?;
        if let Some(code) = self.exit_code {
            write!(f, "\nReturn Code: {code}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n-> Diagnosis: {hint}")?;
        }
        if let Some(stderr) = &self.stderr {
            write!(f, "\nError Output:\n{stderr}")?;
        }
        Ok(())
    }
}

/// Errors surfaced by the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Recoverable tool failure, returned only for `allow_failure` invocations.
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("{0}")]
    ToolFailed(Diagnosis),

    #[error("Simulation library not found at {}", path.display())]
    MissingSimLibrary { path: PathBuf },

    #[error(
        "Could not determine synthesizer data directory.\nChecked relative path: {}\nTried command: {tried}",
        checked.display()
    )]
    ToolchainUnresolved { checked: PathBuf, tried: String },

    #[error("cannot build tool search path")]
    SearchPath(#[from] std::env::JoinPathsError),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Process(_))
    }
}
