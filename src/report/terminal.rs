use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{RiskTier, ScanReport, SourceAvailability};

/// Render a colored terminal report.
pub fn render(report: &ScanReport, verbose: bool, quiet: bool) -> Result<()> {
    let assessment = &report.assessment;

    if quiet {
        println!(
            "{}  Score: {}  Tier: {}",
            report.subject.raw,
            assessment.score,
            colored_tier(assessment.tier),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "aml-checkr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        " Screening: {} ({})\n",
        report.subject.raw,
        report.subject.kind
    );

    // Summary box
    let checked = report
        .source_status()
        .iter()
        .filter(|(_, availability, _)| *availability == SourceAvailability::Checked)
        .count();

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Risk score         : {:>3} / 100", assessment.score)
    );
    println!(
        " │  {:<48} │",
        format!("Risk tier          : {}", assessment.tier)
    );
    println!(
        " │  {:<48} │",
        format!("Sources checked    : {} of 4", checked)
    );
    println!(
        " │  {:<48} │",
        format!(
            "Scanned at         : {}",
            report.scanned_at.format("%Y-%m-%d %H:%M UTC")
        )
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if assessment.explanation.is_empty() {
        println!(" {} No adverse signals found.\n", "✓".green());
    } else {
        println!(" {} Score breakdown:\n", tier_badge(assessment.tier));
        for contribution in &assessment.explanation {
            println!(
                "   {} {:<14} {}",
                format!("+{:>3}", contribution.delta).bold(),
                contribution.signal.to_string(),
                contribution.rationale
            );
        }
        println!();
    }

    render_sources(report, verbose);

    if report.has_findings() {
        println!(" {} Evidence:\n", "[EVIDENCE]".cyan().bold());
        render_evidence(report);
        println!();
    }

    Ok(())
}

/// Availability table; checked sources are listed only in verbose mode.
fn render_sources(report: &ScanReport, verbose: bool) {
    let rows: Vec<_> = report
        .source_status()
        .into_iter()
        .filter(|(_, availability, _)| verbose || *availability != SourceAvailability::Checked)
        .collect();
    if rows.is_empty() {
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Detail").add_attribute(Attribute::Bold),
        ]);

    for (signal, availability, detail) in rows {
        let (status_str, status_color) = match availability {
            SourceAvailability::Checked => ("✓ checked", Color::Green),
            SourceAvailability::Unavailable => ("✗ unavailable", Color::Red),
            SourceAvailability::Skipped => ("– skipped", Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(signal.to_string()),
            Cell::new(status_str)
                .fg(status_color)
                .set_alignment(CellAlignment::Center),
            Cell::new(detail.unwrap_or("")),
        ]);
    }

    println!(" {} Sources:\n", "[SOURCES]".bold());
    println!("{}\n", table);
}

fn render_evidence(report: &ScanReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Link").add_attribute(Attribute::Bold),
        ]);

    for row in report.evidence_rows() {
        let kind_color = match row.kind {
            "Sanction" => Color::Red,
            "News" => Color::Yellow,
            "MiCA" => Color::Magenta,
            _ => Color::Cyan,
        };
        table.add_row(vec![
            Cell::new(row.kind).fg(kind_color),
            Cell::new(&row.description),
            Cell::new(row.link.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{}", table);
}

fn colored_tier(tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::Low => tier.to_string().green(),
        RiskTier::Moderate => tier.to_string().yellow(),
        RiskTier::High => tier.to_string().red().bold(),
    }
}

fn tier_badge(tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::Low => "[LOW]".green().bold(),
        RiskTier::Moderate => "[MODERATE]".yellow().bold(),
        RiskTier::High => "[HIGH]".red().bold(),
    }
}
