//! Async HTTP adapters for the external screening sources.
//!
//! Each module exposes one fetch function that returns the parsed, filtered
//! records or a [`SourceError`]. Callers never see the error directly:
//! [`settle`] turns it into [`SourceOutcome::Unavailable`] so a failing source
//! cannot abort a scan.

pub mod mica;
pub mod news;
pub mod sanctions;
pub mod ubo;

use reqwest::{Client, Response};

use crate::config::HttpConfig;
use crate::models::{Signal, SourceOutcome};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unparsable payload: {0}")]
    Payload(String),
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// One client shared by all fetchers; the timeout bounds every request.
pub fn build_client(http: &HttpConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(http.timeout())
        .user_agent(&http.user_agent)
        .build()
}

fn ensure_success(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::Status(status.as_u16()))
    }
}

/// Collapse a fetch result into the outcome reported for `signal`.
pub fn settle<T>(signal: Signal, result: Result<Vec<T>, SourceError>) -> SourceOutcome<T> {
    match result {
        Ok(records) => {
            tracing::debug!(%signal, count = records.len(), "source checked");
            SourceOutcome::Checked(records)
        }
        Err(e) => {
            tracing::warn!(%signal, error = %e, "source unavailable");
            SourceOutcome::Unavailable(e.to_string())
        }
    }
}

/// Lowercase, strip punctuation and collapse whitespace.
pub(crate) fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
