use std::path::Path;

use anyhow::{Context, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Polygon, Rgb,
};
use printpdf::path::{PaintMode, WindingOrder};

use crate::models::{RiskTier, ScanReport, Signal, SourceAvailability, SourceOutcome};

type Rgb3 = (f32, f32, f32);

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 18.0;
const COVER_HDR_H: f32 = 72.0;
const FOOTER_Y: f32 = 22.0;

// ── Palette ───────────────────────────────────────────────────────────────────
const BG:           Rgb3 = (1.00, 1.00, 1.00);
const PANEL:        Rgb3 = (1.00, 1.00, 1.00);
const PANEL_ALT:    Rgb3 = (0.95, 0.96, 0.98);
const PANEL_BORDER: Rgb3 = (0.85, 0.87, 0.92);
const ACCENT_NAVY:  Rgb3 = (0.10, 0.20, 0.45);
const ACCENT_TEAL:  Rgb3 = (0.05, 0.52, 0.58);
const TEXT_PRI:     Rgb3 = (0.07, 0.08, 0.14);
const TEXT_SEC:     Rgb3 = (0.36, 0.40, 0.52);
const TEXT_MUT:     Rgb3 = (0.58, 0.63, 0.72);
const WHITE:        Rgb3 = (1.00, 1.00, 1.00);
const WHITE_DIM:    Rgb3 = (0.80, 0.90, 0.95);

const LOW_BG:  Rgb3 = (0.90, 0.98, 0.92);
const LOW_FG:  Rgb3 = (0.07, 0.52, 0.22);
const MOD_BG:  Rgb3 = (1.00, 0.95, 0.87);
const MOD_FG:  Rgb3 = (0.70, 0.40, 0.02);
const HIGH_BG: Rgb3 = (1.00, 0.91, 0.91);
const HIGH_FG: Rgb3 = (0.76, 0.09, 0.13);

const R_PANEL: f32 = 2.5;
const R_BADGE: f32 = 1.5;

const LINE_H: f32 = 4.6;
const ROW_PAD: f32 = 4.0;

// ── Public entry point ────────────────────────────────────────────────────────

/// Render a PDF report: cover → risk breakdown → evidence table pages.
pub fn render(report: &ScanReport, output_path: &Path) -> Result<()> {
    let doc = PdfDocument::empty(format!("AML Report - {}", report.subject.raw));

    add_cover_page(&doc, report)?;
    add_breakdown_page(&doc, report)?;
    add_evidence_pages(&doc, report)?;

    let bytes = doc.save_to_bytes()?;
    std::fs::write(output_path, &bytes)
        .with_context(|| format!("Failed to write PDF to {}", output_path.display()))?;

    println!("PDF report written to: {}", output_path.display());
    Ok(())
}

// ── Cover page ────────────────────────────────────────────────────────────────

fn add_cover_page(doc: &PdfDocumentReference, report: &ScanReport) -> Result<()> {
    let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Cover");
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let font_b = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let font_r = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    fill_rect(&layer, 0.0, 0.0, PAGE_W, PAGE_H, BG);
    let hdr_bot = PAGE_H - COVER_HDR_H;
    fill_gradient_h(&layer, 0.0, hdr_bot, PAGE_W, COVER_HDR_H, ACCENT_NAVY, ACCENT_TEAL, 28);

    set_color(&layer, WHITE_DIM);
    layer.use_text(
        format!("aml-checkr v{}", env!("CARGO_PKG_VERSION")),
        7.5, Mm(PAGE_W - MARGIN - 30.0), Mm(PAGE_H - 10.5), &font_r,
    );

    set_color(&layer, WHITE);
    layer.use_text("AML Due Diligence", 28.0, Mm(MARGIN), Mm(PAGE_H - 26.0), &font_b);
    set_color(&layer, WHITE_DIM);
    layer.use_text("Report", 28.0, Mm(MARGIN), Mm(PAGE_H - 41.0), &font_b);

    // Subject chip
    let chip_y = hdr_bot - 18.0;
    let chip_h = 12.0f32;
    let chip_w = 120.0f32;
    fill_rounded_rect(&layer, MARGIN, chip_y, chip_w, chip_h, R_BADGE, PANEL);
    stroke_rounded_rect(&layer, MARGIN, chip_y, chip_w, chip_h, R_BADGE, PANEL_BORDER);
    fill_rect(&layer, MARGIN, chip_y, 2.5, chip_h, ACCENT_TEAL);

    set_color(&layer, TEXT_MUT);
    layer.use_text(
        format!("SUBJECT  ·  {}", report.subject.kind).to_uppercase(),
        6.0, Mm(MARGIN + 5.0), Mm(chip_y + chip_h - 3.8), &font_b,
    );
    set_color(&layer, TEXT_PRI);
    layer.use_text(
        truncate(&report.subject.raw, 44),
        9.5, Mm(MARGIN + 5.0), Mm(chip_y + 2.8), &font_b,
    );

    set_color(&layer, TEXT_SEC);
    layer.use_text(
        format!("Scanned  {}", timestamp(report)),
        9.0, Mm(MARGIN), Mm(chip_y - 8.0), &font_r,
    );

    // Score card
    let rule_y = chip_y - 16.5;
    draw_hline(&layer, MARGIN, PAGE_W - MARGIN, rule_y, PANEL_BORDER);
    set_color(&layer, TEXT_MUT);
    layer.use_text("RISK ASSESSMENT", 6.5, Mm(MARGIN), Mm(rule_y - 7.0), &font_b);

    let (tier_bg, tier_fg) = tier_colors(report.assessment.tier);
    let score_y = rule_y - 44.0;
    let score_h = 32.0f32;
    let score_w = PAGE_W - 2.0 * MARGIN;
    fill_rounded_rect(&layer, MARGIN, score_y, score_w, score_h, R_PANEL, tier_bg);
    fill_rect(&layer, MARGIN, score_y, 3.0, score_h, tier_fg);

    set_color(&layer, tier_fg);
    layer.use_text(
        report.assessment.score.to_string(),
        30.0, Mm(MARGIN + 8.0), Mm(score_y + 10.0), &font_b,
    );
    set_color(&layer, TEXT_SEC);
    layer.use_text("/ 100", 11.0, Mm(MARGIN + 30.0), Mm(score_y + 10.0), &font_r);
    set_color(&layer, tier_fg);
    layer.use_text(
        format!("{} risk", report.assessment.tier).to_uppercase(),
        16.0, Mm(MARGIN + 70.0), Mm(score_y + 15.0), &font_b,
    );
    set_color(&layer, TEXT_SEC);
    layer.use_text(
        contribution_summary(report),
        8.0, Mm(MARGIN + 70.0), Mm(score_y + 8.0), &font_r,
    );

    // Per-source stat cards
    let section_y = score_y - 9.0;
    set_color(&layer, TEXT_MUT);
    layer.use_text("SOURCES", 6.5, Mm(MARGIN), Mm(section_y - 1.0), &font_b);

    let card_y = section_y - 32.0;
    let card_h = 26.0f32;
    let gap = 4.0f32;
    let card_w = (PAGE_W - 2.0 * MARGIN - gap * 3.0) / 4.0;

    let cards: [(&str, String, Rgb3); 4] = [
        ("NEWS", outcome_count(&report.news), MOD_FG),
        ("SANCTIONS", outcome_count(&report.sanctions), HIGH_FG),
        ("MICA", outcome_count(&report.registry), ACCENT_NAVY),
        ("UBO", outcome_count(&report.ubo), ACCENT_TEAL),
    ];

    for (i, (label, value, accent)) in cards.iter().enumerate() {
        let cx = MARGIN + (card_w + gap) * i as f32;
        draw_stat_card(&layer, cx, card_y, card_w, card_h, label, value, *accent,
                       &font_r, &font_b);
    }

    // Contents
    let contents_y = card_y - 13.0;
    draw_hline(&layer, MARGIN, PAGE_W - MARGIN, contents_y, PANEL_BORDER);
    set_color(&layer, TEXT_MUT);
    layer.use_text("WHAT'S IN THIS REPORT", 6.5, Mm(MARGIN), Mm(contents_y - 7.5), &font_b);

    let items = [
        ("Risk Breakdown", "Points per signal with rationale and source availability"),
        ("Evidence", "Every headline, sanctions match and registry record behind the score"),
    ];
    for (j, (title, desc)) in items.iter().enumerate() {
        let iy = contents_y - 15.0 - j as f32 * 10.0;
        fill_rounded_rect(&layer, MARGIN, iy + 2.0, 2.0, 2.0, 1.0, ACCENT_TEAL);
        set_color(&layer, TEXT_PRI);
        layer.use_text(*title, 8.5, Mm(MARGIN + 5.0), Mm(iy + 2.0), &font_b);
        set_color(&layer, TEXT_SEC);
        layer.use_text(*desc, 8.0, Mm(MARGIN + 5.0), Mm(iy - 3.5), &font_r);
    }

    draw_footer(&layer, &font_r, Some(timestamp(report).as_str()));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_stat_card(
    layer: &PdfLayerReference,
    x: f32, y: f32, w: f32, h: f32,
    label: &str,
    value: &str,
    accent: Rgb3,
    font_r: &IndirectFontRef,
    font_b: &IndirectFontRef,
) {
    fill_rounded_rect(layer, x, y, w, h, R_BADGE, PANEL);
    stroke_rounded_rect(layer, x, y, w, h, R_BADGE, PANEL_BORDER);
    fill_rect(layer, x, y + h - 2.0, w, 2.0, accent);

    set_color(layer, accent);
    layer.use_text(value, 20.0, Mm(x + 5.0), Mm(y + h * 0.38), font_b);

    set_color(layer, TEXT_MUT);
    layer.use_text(label, 6.5, Mm(x + 5.0), Mm(y + 3.5), font_r);
}

// ── Risk breakdown page ───────────────────────────────────────────────────────

struct BreakdownRow {
    signal: Signal,
    delta: u32,
    rationale: Vec<String>,
    availability: SourceAvailability,
    detail: Vec<String>,
    height: f32,
}

fn add_breakdown_page(doc: &PdfDocumentReference, report: &ScanReport) -> Result<()> {
    let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Risk Breakdown");
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let font_b = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let font_r = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    fill_rect(&layer, 0.0, 0.0, PAGE_W, PAGE_H, BG);
    fill_gradient_h(&layer, 0.0, PAGE_H - 2.5, PAGE_W, 2.5, ACCENT_NAVY, ACCENT_TEAL, 21);

    set_color(&layer, TEXT_PRI);
    layer.use_text("Risk Breakdown", 20.0, Mm(MARGIN), Mm(278.5), &font_b);
    set_color(&layer, TEXT_SEC);
    layer.use_text(
        format!(
            "Total {} / 100, {} tier. Signals are summed and capped at 100.",
            report.assessment.score, report.assessment.tier
        ),
        9.0, Mm(MARGIN), Mm(271.5), &font_r,
    );
    draw_hline(&layer, MARGIN, PAGE_W - MARGIN, 267.5, PANEL_BORDER);

    //  SIGNAL     POINTS     RATIONALE            SOURCE
    //  18…58      58…76      76…150               150…192  (mm)
    let col_x = [MARGIN, MARGIN + 40.0, MARGIN + 58.0, MARGIN + 132.0];
    const RATIONALE_WRAP: usize = 44;
    const DETAIL_WRAP: usize = 24;
    const HDR_H: f32 = 9.0;
    const TABLE_TOP: f32 = 258.0;

    let rows: Vec<BreakdownRow> = report
        .source_status()
        .into_iter()
        .map(|(signal, availability, detail)| {
            let contribution = report
                .assessment
                .explanation
                .iter()
                .find(|c| c.signal == signal);
            let rationale = match (contribution, availability) {
                (Some(c), _) => c.rationale.clone(),
                (None, SourceAvailability::Checked) => "No adverse findings".to_string(),
                (None, _) => "Not evaluated".to_string(),
            };
            let rationale = wrap_text(&rationale, RATIONALE_WRAP);
            let detail = detail.map(|d| wrap_text(d, DETAIL_WRAP)).unwrap_or_default();
            let lines = rationale.len().max(detail.len() + 1).max(2) as f32;
            BreakdownRow {
                signal,
                delta: contribution.map(|c| c.delta).unwrap_or(0),
                rationale,
                availability,
                detail,
                height: lines * LINE_H + ROW_PAD * 2.0,
            }
        })
        .collect();

    let total_h = HDR_H + rows.iter().map(|r| r.height).sum::<f32>();
    let table_bot = TABLE_TOP - total_h;
    let table_w = PAGE_W - 2.0 * MARGIN;

    fill_rounded_rect(&layer, MARGIN, table_bot, table_w, total_h, R_PANEL, PANEL);
    stroke_rounded_rect(&layer, MARGIN, table_bot, table_w, total_h, R_PANEL, PANEL_BORDER);

    set_color(&layer, TEXT_SEC);
    for (x, label) in col_x.iter().zip(["SIGNAL", "POINTS", "RATIONALE", "SOURCE"]) {
        layer.use_text(label, 7.0, Mm(x + 3.0), Mm(TABLE_TOP - 6.2), &font_b);
    }
    draw_hline(&layer, MARGIN + R_PANEL, PAGE_W - MARGIN - R_PANEL, TABLE_TOP - HDR_H, PANEL_BORDER);

    let mut y_top = TABLE_TOP - HDR_H;
    for (i, row) in rows.iter().enumerate() {
        let y_bot = y_top - row.height;
        if i % 2 == 1 {
            fill_rect(&layer, MARGIN, y_bot, table_w, row.height, PANEL_ALT);
        }
        let first_line = y_top - ROW_PAD - 0.9 * LINE_H;

        set_color(&layer, TEXT_PRI);
        layer.use_text(row.signal.to_string(), 8.5, Mm(col_x[0] + 3.0), Mm(first_line), &font_b);

        let (pts_bg, pts_fg) = match row.delta {
            0 => (LOW_BG, LOW_FG),
            d if d >= 50 => (HIGH_BG, HIGH_FG),
            _ => (MOD_BG, MOD_FG),
        };
        fill_rounded_rect(&layer, col_x[1] + 2.0, first_line - 1.4, 13.0, 5.0, R_BADGE, pts_bg);
        set_color(&layer, pts_fg);
        layer.use_text(format!("+{}", row.delta), 8.0, Mm(col_x[1] + 4.0), Mm(first_line), &font_b);

        set_color(&layer, TEXT_SEC);
        for (j, line) in row.rationale.iter().enumerate() {
            let ly = first_line - j as f32 * LINE_H;
            layer.use_text(line.as_str(), 8.0, Mm(col_x[2] + 3.0), Mm(ly), &font_r);
        }

        let (status_str, status_fg) = match row.availability {
            SourceAvailability::Checked => ("CHECKED", LOW_FG),
            SourceAvailability::Unavailable => ("UNAVAILABLE", HIGH_FG),
            SourceAvailability::Skipped => ("SKIPPED", TEXT_MUT),
        };
        set_color(&layer, status_fg);
        layer.use_text(status_str, 7.5, Mm(col_x[3] + 3.0), Mm(first_line), &font_b);
        set_color(&layer, TEXT_MUT);
        for (j, line) in row.detail.iter().enumerate() {
            let ly = first_line - (j as f32 + 1.0) * LINE_H;
            layer.use_text(line.as_str(), 6.5, Mm(col_x[3] + 3.0), Mm(ly), &font_r);
        }

        if i < rows.len() - 1 {
            draw_hline(&layer, MARGIN + R_PANEL, PAGE_W - MARGIN - R_PANEL, y_bot, PANEL_BORDER);
        }
        y_top = y_bot;
    }

    draw_footer(&layer, &font_r, None);
    Ok(())
}

// ── Evidence table pages ──────────────────────────────────────────────────────

fn add_evidence_pages(doc: &PdfDocumentReference, report: &ScanReport) -> Result<()> {
    let font_b = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let font_r = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    const BASE_ROW_H: f32 = 7.0;
    const EXTRA_LINE_H: f32 = 3.5;
    const HDR_Y: f32 = 268.5;
    const FIRST_Y: f32 = 259.5;
    const BOT_MARGIN: f32 = 25.0;
    const DESC_WRAP: usize = 58;
    const LINK_WRAP: usize = 30;

    //  TYPE       DESCRIPTION                 LINK
    //  18…40      40…128                      128…192  (mm)
    let col_x = [MARGIN, MARGIN + 22.0, MARGIN + 110.0];
    let headers = ["TYPE", "DESCRIPTION", "LINK"];

    let rows: Vec<(&'static str, Vec<String>, Vec<String>, f32)> = report
        .evidence_rows()
        .into_iter()
        .map(|row| {
            let desc = wrap_text(&row.description, DESC_WRAP);
            let link = row
                .link
                .as_deref()
                .map(|l| chunk_text(l, LINK_WRAP, 3))
                .unwrap_or_else(|| vec!["-".to_string()]);
            let extra = desc.len().max(link.len()).saturating_sub(1);
            (row.kind, desc, link, BASE_ROW_H + extra as f32 * EXTRA_LINE_H)
        })
        .collect();

    let new_page = |page_num: u32| -> (PdfPageIndex, PdfLayerIndex) {
        let (pi, li) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Evidence");
        let layer = doc.get_page(pi).get_layer(li);

        fill_rect(&layer, 0.0, 0.0, PAGE_W, PAGE_H, BG);
        fill_gradient_h(&layer, 0.0, PAGE_H - 2.5, PAGE_W, 2.5, ACCENT_NAVY, ACCENT_TEAL, 21);

        set_color(&layer, TEXT_PRI);
        layer.use_text("Evidence", 14.0, Mm(MARGIN), Mm(282.5), &font_b);
        set_color(&layer, TEXT_MUT);
        layer.use_text(
            format!("Page {}", page_num),
            8.0, Mm(PAGE_W - MARGIN - 14.0), Mm(283.0), &font_r,
        );
        draw_hline(&layer, MARGIN, PAGE_W - MARGIN, 277.5, PANEL_BORDER);

        fill_rounded_rect(&layer, MARGIN, HDR_Y - 7.5, PAGE_W - 2.0 * MARGIN, 9.5, R_BADGE, PANEL);
        stroke_rounded_rect(&layer, MARGIN, HDR_Y - 7.5, PAGE_W - 2.0 * MARGIN, 9.5, R_BADGE, PANEL_BORDER);
        set_color(&layer, TEXT_MUT);
        for (x, h) in col_x.iter().zip(headers) {
            layer.use_text(h, 7.0, Mm(x + 1.5), Mm(HDR_Y - 4.0), &font_b);
        }

        draw_footer(&layer, &font_r, None);
        (pi, li)
    };

    let mut page_num: u32 = 1;
    let mut page = new_page(page_num);
    let mut cur_y = FIRST_Y;

    if rows.is_empty() {
        let layer = doc.get_page(page.0).get_layer(page.1);
        set_color(&layer, TEXT_SEC);
        layer.use_text(
            "No evidence was recorded for this subject.",
            9.0, Mm(MARGIN + 1.5), Mm(FIRST_Y - 4.0), &font_r,
        );
        return Ok(());
    }

    for (row_idx, (kind, desc_lines, link_lines, row_h)) in rows.iter().enumerate() {
        if cur_y - row_h < BOT_MARGIN {
            page_num += 1;
            page = new_page(page_num);
            cur_y = FIRST_Y;
        }
        let layer = doc.get_page(page.0).get_layer(page.1);

        if row_idx % 2 == 0 {
            fill_rect(&layer, MARGIN, cur_y - row_h + 1.5, PAGE_W - 2.0 * MARGIN, *row_h, PANEL_ALT);
        }

        let text_y = cur_y - 4.0;
        let (kind_bg, kind_fg) = kind_colors(kind);
        fill_rounded_rect(&layer, col_x[0] + 1.0, text_y - 1.3, 18.0, 4.8, R_BADGE, kind_bg);
        set_color(&layer, kind_fg);
        layer.use_text(*kind, 7.0, Mm(col_x[0] + 3.0), Mm(text_y), &font_b);

        set_color(&layer, TEXT_PRI);
        for (j, line) in desc_lines.iter().enumerate() {
            let ly = text_y - j as f32 * EXTRA_LINE_H;
            layer.use_text(line.as_str(), 8.0, Mm(col_x[1] + 1.5), Mm(ly), &font_r);
        }

        set_color(&layer, ACCENT_TEAL);
        for (j, line) in link_lines.iter().enumerate() {
            let ly = text_y - j as f32 * EXTRA_LINE_H;
            layer.use_text(line.as_str(), 6.5, Mm(col_x[2] + 1.5), Mm(ly), &font_r);
        }

        draw_hline(&layer, MARGIN, PAGE_W - MARGIN, cur_y - row_h + 1.5, PANEL_BORDER);
        cur_y -= row_h;
    }

    Ok(())
}

// ── Report helpers ────────────────────────────────────────────────────────────

fn timestamp(report: &ScanReport) -> String {
    report.scanned_at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn tier_colors(tier: RiskTier) -> (Rgb3, Rgb3) {
    match tier {
        RiskTier::Low => (LOW_BG, LOW_FG),
        RiskTier::Moderate => (MOD_BG, MOD_FG),
        RiskTier::High => (HIGH_BG, HIGH_FG),
    }
}

fn kind_colors(kind: &str) -> (Rgb3, Rgb3) {
    match kind {
        "Sanction" => (HIGH_BG, HIGH_FG),
        "News" => (MOD_BG, MOD_FG),
        _ => (PANEL_ALT, ACCENT_NAVY),
    }
}

/// Record count for a checked source, `n/a` otherwise.
fn outcome_count<T>(outcome: &SourceOutcome<T>) -> String {
    if outcome.is_checked() {
        outcome.records().len().to_string()
    } else {
        "n/a".to_string()
    }
}

fn contribution_summary(report: &ScanReport) -> String {
    if report.assessment.explanation.is_empty() {
        return "No adverse signals found".to_string();
    }
    report
        .assessment
        .explanation
        .iter()
        .map(|c| format!("{} +{}", c.signal, c.delta))
        .collect::<Vec<_>>()
        .join("  ·  ")
}

fn draw_footer(layer: &PdfLayerReference, font: &IndirectFontRef, right: Option<&str>) {
    draw_hline(layer, MARGIN, PAGE_W - MARGIN, FOOTER_Y, PANEL_BORDER);
    set_color(layer, TEXT_MUT);
    layer.use_text(
        format!("Generated by aml-checkr v{}", env!("CARGO_PKG_VERSION")),
        7.5, Mm(MARGIN), Mm(15.0), font,
    );
    if let Some(text) = right {
        layer.use_text(text, 7.5, Mm(PAGE_W - MARGIN - 34.0), Mm(15.0), font);
    }
}

// ── Drawing helpers ───────────────────────────────────────────────────────────

fn rgb((r, g, b): Rgb3) -> Color {
    Color::Rgb(Rgb { r, g, b, icc_profile: None })
}

fn set_color(layer: &PdfLayerReference, color: Rgb3) {
    layer.set_fill_color(rgb(color));
}

fn fill_polygon(layer: &PdfLayerReference, ring: Vec<(Point, bool)>, color: Rgb3) {
    layer.set_fill_color(rgb(color));
    layer.add_polygon(Polygon {
        rings: vec![ring],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
    layer.set_fill_color(rgb((0.0, 0.0, 0.0)));
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, color: Rgb3) {
    let ring = vec![
        (Point::new(Mm(x), Mm(y)), false),
        (Point::new(Mm(x + w), Mm(y)), false),
        (Point::new(Mm(x + w), Mm(y + h)), false),
        (Point::new(Mm(x), Mm(y + h)), false),
    ];
    fill_polygon(layer, ring, color);
}

/// Clockwise ring approximating a rounded rectangle, 8 segments per corner.
fn rounded_rect_ring(x: f32, y: f32, w: f32, h: f32, r: f32) -> Vec<(Point, bool)> {
    const SEGS: usize = 8;
    let r = r.min(w / 2.0).min(h / 2.0);
    let corners = [
        (x + w - r, y + r, 270.0f32),
        (x + w - r, y + h - r, 0.0f32),
        (x + r, y + h - r, 90.0f32),
        (x + r, y + r, 180.0f32),
    ];

    corners
        .iter()
        .flat_map(|&(cx, cy, start)| {
            (0..=SEGS).map(move |i| {
                let angle = (start + 90.0 * i as f32 / SEGS as f32).to_radians();
                (Point::new(Mm(cx + r * angle.cos()), Mm(cy + r * angle.sin())), false)
            })
        })
        .collect()
}

fn fill_rounded_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, r: f32, color: Rgb3) {
    fill_polygon(layer, rounded_rect_ring(x, y, w, h, r), color);
}

fn stroke_rounded_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, r: f32, color: Rgb3) {
    layer.set_outline_color(rgb(color));
    layer.set_outline_thickness(0.4);
    layer.add_polygon(Polygon {
        rings: vec![rounded_rect_ring(x, y, w, h, r)],
        mode: PaintMode::Stroke,
        winding_order: WindingOrder::NonZero,
    });
    layer.set_outline_color(rgb((0.0, 0.0, 0.0)));
    layer.set_outline_thickness(1.0);
}

fn draw_hline(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32, color: Rgb3) {
    layer.set_outline_color(rgb(color));
    layer.set_outline_thickness(0.3);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
    layer.set_outline_color(rgb((0.0, 0.0, 0.0)));
    layer.set_outline_thickness(1.0);
}

/// Left-to-right gradient built from `steps` vertical strips.
#[allow(clippy::too_many_arguments)]
fn fill_gradient_h(
    layer: &PdfLayerReference,
    x: f32, y: f32, w: f32, h: f32,
    from: Rgb3,
    to: Rgb3,
    steps: usize,
) {
    let step_w = w / steps as f32;
    for i in 0..steps {
        let t = i as f32 / (steps - 1).max(1) as f32;
        let color = (
            from.0 + (to.0 - from.0) * t,
            from.1 + (to.1 - from.1) * t,
            from.2 + (to.2 - from.2) * t,
        );
        // strips overlap to hide rounding seams
        fill_rect(layer, x + i as f32 * step_w, y, step_w + 0.6, h, color);
    }
}

// ── Text helpers ──────────────────────────────────────────────────────────────

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Word wrap; words longer than `max_chars` get a line of their own.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Hard-split unbreakable text such as URLs, ending in `…` past `max_lines`.
fn chunk_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut lines: Vec<String> = chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(width.saturating_sub(1)).collect();
            *last = format!("{}…", kept);
        }
    }
    lines
}
