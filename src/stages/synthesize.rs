//! Gate-level synthesis with Yosys.
use super::StageContext;
use crate::error::PipelineError;
use crate::runner::{CommandSpec, RunOptions};
use crate::toolchain::{Tool, Toolchain};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Comment written between the netlist and the appended primitive library.
pub const SIM_LIBRARY_MARKER: &str = "\n// Appended simlib.v \n";

/// Yosys script: flatten, map to generic gates, clean up, and write a
/// netlist without attributes so the output is deterministic.
pub fn synthesis_script(top_source: &str, top_module: &str, netlist: &str) -> String {
    [
        format!("read_verilog {top_source}"),
        format!("synth -top {top_module} -flatten"),
        "abc -g gates".to_string(),
        "opt_clean".to_string(),
        "rename -hide */w:*".to_string(),
        format!("write_verilog -noattr {netlist}"),
    ]
    .join("; ")
}

/// Synthesize the top module and make the netlist simulatable by appending
/// the synthesizer's primitive cell library to it.
pub fn synthesize(ctx: &StageContext<'_>) -> Result<(), PipelineError> {
    println!("--- Synthesizing ---");
    let config = ctx.config;
    let script = synthesis_script(&config.top_source(), &config.top_module, &config.netlist);
    let yosys = CommandSpec::new(ctx.toolchain.tool(Tool::Synthesizer))
        .arg("-p")
        .arg(script);
    ctx.runner.run(&yosys, RunOptions::streamed())?;

    let datdir = ctx.toolchain.synth_data_dir(ctx.runner)?;
    let sim_library = Toolchain::sim_library(&datdir);
    if !sim_library.is_file() {
        return Err(PipelineError::MissingSimLibrary { path: sim_library });
    }

    let netlist = ctx.paths.netlist();
    println!(
        "Appending {} to {}...",
        sim_library.display(),
        ctx.paths.display(&netlist)
    );
    append_library(&sim_library, &netlist).map_err(|err| {
        PipelineError::io(
            format!("Error appending library file to {}", netlist.display()),
            err,
        )
    })?;

    let marker = ctx.paths.synthesis_marker();
    fs::write(&marker, b"")
        .map_err(|err| PipelineError::io(format!("write {}", marker.display()), err))?;
    tracing::info!(netlist = %netlist.display(), "synthesis complete");
    Ok(())
}

fn append_library(library: &Path, netlist: &Path) -> io::Result<()> {
    let mut source = File::open(library)?;
    let mut target = OpenOptions::new().append(true).create(true).open(netlist)?;
    target.write_all(SIM_LIBRARY_MARKER.as_bytes())?;
    io::copy(&mut source, &mut target)?;
    target.flush()
}
