use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use logparser::logging::init_logging;
use logparser::{run, ParserConfig, RunContext};

#[derive(Parser)]
#[command(name = "logparser")]
#[command(version)]
#[command(
    about = "Parses generated logs in ./Logs into hitch, memory and error CSV reports",
    long_about = "Parses every CreateArbitraryLog*.log file in ./Logs and writes HitchReport.csv, \
                  MemoryReport.csv and ErrorReport.csv into the current directory. Existing \
                  reports are never overwritten; a numeric suffix is added instead.\n\n\
                  Diagnostics go to stderr. Set RUST_LOG or LOGPARSER_LOG_LEVEL to adjust verbosity."
)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();
    init_logging();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cwd = env::current_dir().context("failed to resolve the working directory")?;
    info!("current working directory is {}", cwd.display());

    let ctx = RunContext::new(ParserConfig::default());
    let summary = run(&ctx);

    println!(
        "Total Execution Time: {:.2} seconds",
        summary.stats.total_time.as_secs_f64()
    );

    summary.ensure_output_available(&ctx.config.output.dir)
}
