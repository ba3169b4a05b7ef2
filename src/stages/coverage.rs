//! RTL line coverage with Verilator.
use super::StageContext;
use crate::coverage::{self, CoverageCounters};
use crate::error::PipelineError;
use crate::paths::{COVERAGE_DB, COVERAGE_INFO};
use crate::runner::{CommandSpec, RunOptions};
use crate::toolchain::Tool;

/// Result of the coverage stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageOutput {
    /// Statistics computed from the annotated top-module source.
    Counted(CoverageCounters),
    /// The annotated source was missing or unreadable; the database and
    /// info file are still on disk.
    Skipped,
}

/// Build an instrumented model, run it, convert the database, annotate the
/// sources, and count annotated lines of the top module.
pub fn coverage_run(ctx: &StageContext<'_>) -> Result<CoverageOutput, PipelineError> {
    println!("--- RTL Coverage (Verilator) ---");
    let config = ctx.config;
    let paths = ctx.paths;
    let reporter = ctx.toolchain.tool(Tool::CoverageReporter);

    let mut verilate = CommandSpec::new(ctx.toolchain.tool(Tool::CoverageCompiler))
        .arg("--binary")
        .arg("--coverage");
    if paths.coverage_config().is_file() {
        verilate = verilate.arg(config.coverage_config.clone());
    }
    let verilate = verilate
        .args(config.rtl_sources.iter().cloned())
        .arg(config.testbench.clone())
        .arg("--top-module")
        .arg(config.testbench_module.clone());
    println!("Running Verilator compilation...");
    ctx.runner.run(&verilate, RunOptions::streamed())?;

    let binary = paths.coverage_binary();
    println!("Running simulation binary: {}...", paths.display(&binary));
    ctx.runner
        .run(&CommandSpec::new(binary), RunOptions::streamed())?;

    println!("Generating coverage info...");
    let write_info = CommandSpec::new(reporter)
        .arg("--write-info")
        .arg(COVERAGE_INFO)
        .arg(COVERAGE_DB);
    ctx.runner.run(&write_info, RunOptions::streamed())?;

    println!(
        "Generating annotated source code in {}/...",
        config.coverage_workdir
    );
    let annotate = CommandSpec::new(reporter)
        .arg("--annotate-points")
        .arg("--annotate")
        .arg(config.coverage_workdir.clone())
        .arg(COVERAGE_DB);
    ctx.runner.run(&annotate, RunOptions::streamed())?;

    let annotated = paths.annotated_source();
    match coverage::analyze_file(&annotated) {
        Ok(Some(counters)) => Ok(CoverageOutput::Counted(counters)),
        Ok(None) => {
            tracing::debug!(path = %paths.display(&annotated), "annotated file not found");
            println!("[WARN] Annotated file not found: {}", paths.display(&annotated));
            Ok(CoverageOutput::Skipped)
        }
        Err(err) => {
            tracing::debug!(path = %paths.display(&annotated), error = %err, "cannot read annotated file");
            println!("[WARN] Failed to calculate coverage stats: {err}");
            Ok(CoverageOutput::Skipped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandResult;
    use crate::stages::test_support::Harness;
    use std::fs;

    const ANNOTATED: &str = "\
         module fpmul(a, b, y);\n\
+000010  assign a = b;\n\
+000010  assign c = d;\n\
+000010  always @(posedge clk)\n\
-000000  if (reset)\n\
-000000    q <= 0;\n\
-000002  else\n\
         endmodule\n";

    #[test]
    fn coverage_flow_runs_every_step_in_order() {
        let harness = Harness::new();
        fs::create_dir_all(harness.paths.coverage_workdir()).expect("create workdir");
        harness.executor.writes(
            "verilator_coverage",
            harness.paths.annotated_source(),
            ANNOTATED,
        );

        let output = coverage_run(&harness.context()).expect("coverage succeeds");

        let binary_name = harness
            .paths
            .coverage_binary()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .expect("binary name");
        assert_eq!(
            harness.executor.programs(),
            vec![
                "verilator".to_string(),
                binary_name,
                "verilator_coverage".to_string(),
                "verilator_coverage".to_string(),
            ]
        );
        let calls = harness.executor.calls();
        assert_eq!(
            calls[0].arguments(),
            [
                "--binary",
                "--coverage",
                "fpmul.v",
                "fpmul_stim1_new.v",
                "--top-module",
                "fpmul_stim1_v_tf",
            ]
            .map(String::from)
        );
        assert_eq!(calls[1].program(), harness.paths.coverage_binary());
        assert_eq!(
            calls[2].arguments(),
            ["--write-info", "coverage.info", "coverage.dat"].map(String::from)
        );
        assert_eq!(
            calls[3].arguments(),
            ["--annotate-points", "--annotate", "obj_dir", "coverage.dat"].map(String::from)
        );

        assert_eq!(
            output,
            CoverageOutput::Counted(CoverageCounters {
                positive: 3,
                total_negative: 3,
                real_negative: 2,
            })
        );
    }

    #[test]
    fn project_override_file_is_passed_when_present() {
        let harness = Harness::new();
        fs::write(harness.paths.coverage_config(), "`verilator_config\n").expect("write vlt");

        coverage_run(&harness.context()).expect("coverage succeeds");

        let calls = harness.executor.calls();
        assert_eq!(calls[0].arguments()[2], "config.vlt");
    }

    #[test]
    fn missing_annotation_is_a_warning_not_a_failure() {
        let harness = Harness::new();
        let output = coverage_run(&harness.context()).expect("coverage succeeds");
        assert_eq!(output, CoverageOutput::Skipped);
        assert_eq!(harness.executor.count("verilator_coverage"), 2);
    }

    #[test]
    fn instrumented_binary_failure_is_fatal() {
        let harness = Harness::new();
        let binary_name = harness
            .paths
            .coverage_binary()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .expect("binary name");
        harness
            .executor
            .respond(&binary_name, CommandResult::exited(1));

        let err = coverage_run(&harness.context()).expect_err("simulation fails");
        assert!(err.is_fatal());
        assert_eq!(harness.executor.count("verilator_coverage"), 0);
    }
}
