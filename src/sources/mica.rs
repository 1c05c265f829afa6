use reqwest::Client;

use super::{ensure_success, SourceError};
use crate::config::RegistryConfig;
use crate::models::{RegistryRecord, ScanSubject};
use crate::risk::status::map_status;

/// Look the subject up in the MiCA crypto-asset service provider register.
///
/// The register answers Solr queries as CSV; any other content type is
/// treated as an unusable answer.
pub async fn screen_mica(
    client: &Client,
    config: &RegistryConfig,
    subject: &ScanSubject,
) -> Result<Vec<RegistryRecord>, SourceError> {
    let query = format!("{}:\"{}\"", config.name_column, subject.raw.replace('"', ""));
    let rows = config.rows.to_string();

    let response = client
        .get(&config.endpoint)
        .query(&[("q", query.as_str()), ("wt", "csv"), ("rows", rows.as_str())])
        .send()
        .await?;
    let response = ensure_success(response)?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.contains("text/csv") {
        return Err(SourceError::Payload(format!(
            "expected text/csv, got '{}'",
            content_type
        )));
    }

    let body = response.text().await?;
    parse_csv(&body, config, &subject.raw)
}

fn parse_csv(
    body: &str,
    config: &RegistryConfig,
    fallback_name: &str,
) -> Result<Vec<RegistryRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let name_idx = column(&config.name_column);
    let status_idx = column(&config.status_column);
    let authority_idx = column(&config.authority_column);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }
        let field = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let status_raw = field(status_idx).unwrap_or_else(|| "Not found".to_string());
        records.push(RegistryRecord {
            legal_name: field(name_idx).unwrap_or_else(|| fallback_name.to_string()),
            status: map_status(&status_raw, &config.status_rules),
            status_raw,
            authority: field(authority_idx).unwrap_or_default(),
            link: config.register_url.clone(),
        });
    }

    Ok(records)
}
