use std::path::PathBuf;

use clap::Parser;

use crate::config::ClassifierBackend;
use crate::models::{RiskTier, Signal};

/// Sentinel for `--pdf` without a value; replaced by a subject-derived file name.
pub const PDF_DEFAULT_SENTINEL: &str = "<subject>";

#[derive(Parser, Debug)]
#[command(
    name = "aml-checkr",
    about = "Screen a person, company or wallet against news, sanctions and registry sources",
    version
)]
pub struct Cli {
    /// Name, company or wallet address to screen
    pub subject: Option<String>,

    /// Config file [default: ./.aml-checkr/config.toml, fallback ~/.config/aml-checkr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// PDF output path; use without value to write aml-report-<subject>.pdf
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = PDF_DEFAULT_SENTINEL)]
    pub pdf: Option<PathBuf>,

    /// Do not query a source (repeatable)
    #[arg(long = "skip-source", value_name = "SOURCE")]
    pub skip_source: Vec<SourceArg>,

    /// Headline classifier backend, overriding the config
    #[arg(long, value_name = "BACKEND")]
    pub classifier: Option<ClassifierArg>,

    /// Exit with status 1 when the risk tier reaches this level
    #[arg(long, default_value = "high", value_name = "TIER")]
    pub fail_on: FailOn,

    /// Read subjects from stdin, one per line, until an empty line or `quit`
    #[arg(short, long)]
    pub interactive: bool,

    /// Show every record and info-level logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Pdf,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum SourceArg {
    News,
    Sanctions,
    Registry,
    Ubo,
}

impl From<&SourceArg> for Signal {
    fn from(arg: &SourceArg) -> Self {
        match arg {
            SourceArg::News => Signal::News,
            SourceArg::Sanctions => Signal::Sanctions,
            SourceArg::Registry => Signal::Registry,
            SourceArg::Ubo => Signal::Ubo,
        }
    }
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ClassifierArg {
    Remote,
    Keyword,
    Off,
}

impl From<&ClassifierArg> for ClassifierBackend {
    fn from(arg: &ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Remote => ClassifierBackend::Remote,
            ClassifierArg::Keyword => ClassifierBackend::Keyword,
            ClassifierArg::Off => ClassifierBackend::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum FailOn {
    High,
    Moderate,
    Never,
}

impl FailOn {
    pub fn is_tripped_by(self, tier: RiskTier) -> bool {
        match self {
            FailOn::High => tier >= RiskTier::High,
            FailOn::Moderate => tier >= RiskTier::Moderate,
            FailOn::Never => false,
        }
    }
}

/// `aml-report-<slug>.pdf`, where the slug keeps ASCII alphanumerics and dashes.
pub fn default_pdf_name(subject: &str) -> PathBuf {
    let slug: String = subject
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "subject".to_string() } else { slug };
    PathBuf::from(format!("aml-report-{}.pdf", slug))
}
