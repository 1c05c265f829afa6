//! `aml-checkr`: screen a person, company or wallet for anti-money-laundering risk.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install logging ([`telemetry`]).
//! 2. Load config ([`config::load_config`]); `--classifier` overrides the backend.
//! 3. Classify the subject as wallet or entity ([`detector::detect_subject`]).
//! 4. Query news, sanctions, MiCA and UBO sources concurrently ([`scan`], [`sources`]).
//! 5. Keep adverse headlines only ([`classifier`]) and score everything ([`risk`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0`, or `1` when the tier reaches `--fail-on`.

mod cache;
mod classifier;
mod cli;
mod config;
mod detector;
mod models;
mod report;
mod risk;
mod scan;
mod sources;
mod telemetry;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use classifier::Classifier;
use cli::{default_pdf_name, Cli, ReportFormat, PDF_DEFAULT_SENTINEL};
use config::load_config;
use detector::detect_subject;
use models::{RiskTier, ScanReport, Signal};
use scan::Scanner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose, cli.quiet);

    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = load_config(&working_dir, cli.config.as_deref())?;
    if let Some(backend) = &cli.classifier {
        config.classifier.backend = backend.into();
    }

    let skip: HashSet<Signal> = cli.skip_source.iter().map(Into::into).collect();
    let classifier = classifier::shared(&config.classifier, &config.http);
    let scanner = Scanner::new(config, classifier)?;

    // --pdf implies PDF format
    let report_format = match &cli.pdf {
        Some(_) => ReportFormat::Pdf,
        None => cli.report.clone(),
    };

    let mut worst = RiskTier::Low;

    if let Some(subject) = cli.subject.as_deref() {
        let report = scan_with_spinner(&scanner, subject, &skip, cli.quiet).await;
        emit(&report, &report_format, &cli)?;
        worst = worst.max(report.assessment.tier);
    } else if !cli.interactive {
        eprintln!(
            "{} no subject given; pass a name, company or wallet address, or use --interactive",
            "error:".red().bold()
        );
        std::process::exit(2);
    }

    if cli.interactive {
        worst = worst.max(run_interactive(&scanner, &skip, &report_format, &cli).await?);
    }

    if cli.fail_on.is_tripped_by(worst) {
        std::process::exit(1);
    }

    Ok(())
}

/// Scan subjects read from stdin until an empty line, `quit`, `exit` or EOF.
/// Returns the highest tier seen.
async fn run_interactive(
    scanner: &Scanner<'_, Classifier>,
    skip: &HashSet<Signal>,
    format: &ReportFormat,
    cli: &Cli,
) -> Result<RiskTier> {
    let mut worst = RiskTier::Low;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", "subject>".cyan().bold());
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let report = scan_with_spinner(scanner, line, skip, cli.quiet).await;
        emit(&report, format, cli)?;
        worst = worst.max(report.assessment.tier);
    }

    Ok(worst)
}

async fn scan_with_spinner(
    scanner: &Scanner<'_, Classifier>,
    raw: &str,
    skip: &HashSet<Signal>,
    quiet: bool,
) -> ScanReport {
    let subject = detect_subject(raw);

    let spinner = if !quiet {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Screening {} ({})", subject.raw, subject.kind));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let report = scanner.scan(&subject, skip).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    report
}

fn emit(report: &ScanReport, format: &ReportFormat, cli: &Cli) -> Result<()> {
    match format {
        ReportFormat::Terminal => report::terminal::render(report, cli.verbose, cli.quiet),
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
            Ok(())
        }
        ReportFormat::Pdf => {
            let path = pdf_path(cli.pdf.as_deref(), &report.subject.raw, cli.interactive);
            report::pdf::render(report, &path)
        }
    }
}

/// Explicit `--pdf FILE` for single scans; interactive sessions name one file per subject.
fn pdf_path(requested: Option<&Path>, subject: &str, interactive: bool) -> PathBuf {
    match requested {
        Some(path) if !interactive && path != Path::new(PDF_DEFAULT_SENTINEL) => path.to_path_buf(),
        _ => default_pdf_name(subject),
    }
}
