use anyhow::Result;
use clap::{CommandFactory, Parser};
use simflow::cli::RootArgs;
use simflow::config::load_config;
use simflow::logging::init_tracing;
use simflow::{BuildTarget, Pipeline, PipelineOptions, SummaryFormat};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let Some(target) = args.target else {
        if let Err(err) = RootArgs::command().print_help() {
            eprintln!("{err}");
        }
        return ExitCode::SUCCESS;
    };

    match run(&args, target) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\n[ERROR] {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &RootArgs, target: BuildTarget) -> Result<()> {
    let config = load_config(&args.project_dir, args.config.as_deref())?;
    let summary_format = if args.json {
        SummaryFormat::Json
    } else {
        SummaryFormat::Text
    };
    let pipeline = Pipeline::new(
        config,
        PipelineOptions {
            project_dir: args.project_dir.clone(),
            toolchain_dir: args.toolchain_dir.clone(),
            summary_format,
        },
    )?;
    pipeline.run(target)?;
    Ok(())
}
