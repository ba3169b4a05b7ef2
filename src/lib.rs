//! Synthesis and simulation pipeline driver for HDL designs.
//!
//! Sequences Yosys, Icarus Verilog, and Verilator into a handful of fixed
//! build targets and turns Verilator's annotated coverage output into a line
//! coverage percentage.
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod runner;
pub mod stages;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod fakes;

pub use config::ProjectConfig;
pub use coverage::CoverageCounters;
pub use error::{Diagnosis, PipelineError, ProcessError, ProcessErrorKind};
pub use pipeline::{BuildTarget, Pipeline, PipelineOptions, SummaryFormat};
pub use runner::{CommandResult, CommandSpec, Executor, ProcessRunner, RunOptions};
pub use toolchain::{SearchPath, Tool, ToolPaths, Toolchain};
