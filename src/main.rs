// src/main.rs

mod cli;

use chrono::{TimeZone, Utc};
use clap::Parser;
use cli::Args;
use git2::Oid;
use git_lineage::filter::IgnorePredicate;
use git_lineage::sink::JsonLinesSink;
use git_lineage::{analyze, ExtractionContext, RepositoryState};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    match run(&args) {
        Ok(()) => {
            info!(elapsed = ?start_time.elapsed(), "Total time");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Error extracting repository");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> git_lineage::Result<()> {
    let config = args.config();

    let ignore = IgnorePredicate::load(args.ignore_file.as_deref(), args.ignore_patterns.as_slice())?;

    let previous = args.state_in.as_deref().map(read_state).transpose()?;
    let known = match &args.known {
        Some(path) => read_known(path)?,
        None => HashSet::new(),
    };

    let ctx = ExtractionContext::new(args.repo_id)
        .with_ignore(ignore)
        .with_description(args.repo.display().to_string());

    let progress = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})") {
        progress.set_style(style.progress_chars("=> "));
    }
    progress.set_message("Extracting commits");

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = JsonLinesSink::new(BufWriter::new(out));

    let report = analyze(&args.repo, &ctx, previous.as_ref(), known, &config, &mut sink, &progress)?;
    sink.finish()?;

    info!(
        discovered = report.discovered,
        extracted = report.extracted,
        records = report.records,
        failed = report.failed.len(),
        "Run finished"
    );
    if let Some((first, last)) = report.time_span {
        let first = Utc.timestamp_opt(first, 0).single();
        let last = Utc.timestamp_opt(last, 0).single();
        if let (Some(first), Some(last)) = (first, last) {
            info!(from = %first.to_rfc2822(), to = %last.to_rfc2822(), "Extracted commit time span");
        }
    }

    if let Some(path) = &args.state_out {
        fs::write(path, serde_json::to_string_pretty(&report.state)?)?;
        info!(path = %path.display(), "Saved repository state");
    }
    Ok(())
}

fn read_state(path: &Path) -> git_lineage::Result<RepositoryState> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn read_known(path: &Path) -> git_lineage::Result<HashSet<Oid>> {
    let contents = fs::read_to_string(path)?;
    let mut known = HashSet::new();
    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        known.insert(Oid::from_str(line)?);
    }
    Ok(known)
}
