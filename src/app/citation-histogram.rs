use anyhow::Result;
use citation_histogram::cmd::histogram::Args;
use citation_histogram::logging::init_logging;
use citation_histogram::standalone::run_job;
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = args.into_config()?;

    let summary = run_job(&config)?;
    println!(
        "{} records, {} distinct citation counts written to {}",
        summary.counters.input_records,
        summary.counters.reduce_output_records,
        config.output.display()
    );
    Ok(())
}
