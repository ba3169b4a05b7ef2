//! CLI argument parsing.
//!
//! One optional positional target; without it the usage text is printed and
//! the process exits successfully.
use crate::pipeline::BuildTarget;
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "simflow",
    version,
    about = "Build and simulate an HDL design with Yosys, Icarus Verilog, and Verilator",
    after_help = "Commands:\n  clean        Remove generated files\n  syn          Run Yosys synthesis (creates the gate-level netlist)\n  simrtl       Run RTL simulation\n  simgates     Run gate-level simulation (uses the synthesized netlist)\n  rtlCoverage  Run the Verilator coverage flow (annotated sources in obj_dir)\n\nExamples:\n  simflow syn\n  simflow simgates --project-dir designs/fpmul\n  simflow rtlCoverage --json"
)]
pub struct RootArgs {
    /// Build target to run
    #[arg(value_enum, value_name = "TARGET")]
    pub target: Option<BuildTarget>,

    /// Project directory containing the design sources
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Project config file (defaults to simflow.json in the project directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Bundled toolchain root (an OSS CAD Suite install)
    #[arg(long, value_name = "DIR", env = "SIMFLOW_TOOLCHAIN_DIR")]
    pub toolchain_dir: Option<PathBuf>,

    /// Print the coverage summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
