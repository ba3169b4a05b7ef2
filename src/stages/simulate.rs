//! RTL and gate-level simulation with Icarus Verilog.
use super::synthesize::synthesize;
use super::StageContext;
use crate::error::PipelineError;
use crate::runner::{CommandSpec, RunOptions};
use crate::toolchain::Tool;

/// Compile the testbench with the RTL sources and run the result.
pub fn simulate_rtl(ctx: &StageContext<'_>) -> Result<(), PipelineError> {
    println!("--- RTL Simulation ---");
    let config = ctx.config;
    let mut sources = vec![config.testbench.clone()];
    sources.extend(config.rtl_sources.iter().cloned());
    compile_and_run(ctx, &config.rtl_binary, sources)
}

/// Compile the testbench with the synthesized netlist and run the result.
///
/// Synthesizes first when the netlist is missing.
pub fn simulate_gates(ctx: &StageContext<'_>) -> Result<(), PipelineError> {
    if !ctx.paths.netlist().is_file() {
        tracing::info!(
            netlist = %ctx.paths.display(&ctx.paths.netlist()),
            "netlist missing, synthesizing first"
        );
        synthesize(ctx)?;
    }
    println!("--- Gate Simulation ---");
    let config = ctx.config;
    let sources = vec![config.testbench.clone(), config.netlist.clone()];
    compile_and_run(ctx, &config.gates_binary, sources)
}

fn compile_and_run(
    ctx: &StageContext<'_>,
    binary: &str,
    sources: Vec<String>,
) -> Result<(), PipelineError> {
    let compile = CommandSpec::new(ctx.toolchain.tool(Tool::Compiler))
        .arg("-o")
        .arg(binary)
        .args(sources);
    ctx.runner.run(&compile, RunOptions::streamed())?;

    let run = CommandSpec::new(ctx.toolchain.tool(Tool::SimulationRunner)).arg(binary);
    ctx.runner.run(&run, RunOptions::streamed())?;
    Ok(())
}
