use anyhow::Result;
use chrono::Local;
use clap::Parser;

use blast_progress_monitor::cli::{resolve_jobs, Args};
use blast_progress_monitor::report::write_reports;
use blast_progress_monitor::{assess, logging, JobReport};

// --------------------------------------------------
fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

// --------------------------------------------------
// Resolve every job first, then measure them one after another.
fn run(args: Args) -> Result<()> {
    logging::init(args.verbose, args.quiet);

    let jobs = resolve_jobs(&args)?;
    let reports: Vec<JobReport> = jobs
        .iter()
        .map(|job| assess(job, Local::now(), args.hit_counting))
        .collect();

    write_reports(std::io::stdout().lock(), &reports, args.format)?;
    Ok(())
}
