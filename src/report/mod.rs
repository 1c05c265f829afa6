//! Report renderers for scan results.
//!
//! - [`terminal`]: colored summary box, score breakdown and evidence table; respects `--verbose` / `--quiet`.
//! - [`pdf`]: cover page with score card, risk breakdown page and evidence table pages.
//!
//! JSON output is the serialized [`ScanReport`](crate::models::ScanReport) and needs no renderer.

pub mod pdf;
pub mod terminal;
