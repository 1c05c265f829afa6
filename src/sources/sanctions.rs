use reqwest::Client;
use serde::Deserialize;
use strsim::jaro_winkler;

use super::{ensure_success, normalize_name, SourceError};
use crate::config::SanctionsConfig;
use crate::models::{SanctionHit, ScanSubject};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default, alias = "entityId")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    /// Numeric similarity on the search API, a boolean verdict on the match API.
    #[serde(default, rename = "match")]
    match_value: Option<serde_json::Value>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    datasets: Vec<String>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(default)]
    topics: Vec<String>,
}

/// Fuzzy-search the sanctions list and keep candidates whose match confidence exceeds `threshold`.
pub async fn screen_sanctions(
    client: &Client,
    config: &SanctionsConfig,
    subject: &ScanSubject,
    threshold: f64,
) -> Result<Vec<SanctionHit>, SourceError> {
    let mut request = client
        .get(&config.endpoint)
        .query(&[("q", subject.raw.as_str()), ("topics", "sanction")]);

    if let Ok(key) = std::env::var(&config.api_key_env) {
        if !key.trim().is_empty() {
            request = request.header("Authorization", format!("ApiKey {}", key.trim()));
        }
    }

    let response = ensure_success(request.send().await?)?;
    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| SourceError::Payload(e.to_string()))?;

    Ok(accept_candidates(body.results, &subject.raw, threshold, &config.entity_base_url))
}

fn accept_candidates(
    candidates: Vec<Candidate>,
    query: &str,
    threshold: f64,
    entity_base_url: &str,
) -> Vec<SanctionHit> {
    let normalized_query = normalize_name(query);

    candidates
        .into_iter()
        .filter_map(|c| {
            let name = c.name.clone().or_else(|| c.caption.clone())?;
            let confidence = match_confidence(&c, &normalized_query, &name);
            if confidence <= threshold {
                tracing::debug!(%name, confidence, "sanctions candidate below threshold");
                return None;
            }

            let reason = c
                .reason
                .clone()
                .filter(|r| !r.trim().is_empty())
                .or_else(|| (!c.properties.topics.is_empty()).then(|| c.properties.topics.join(", ")))
                .unwrap_or_else(|| "Sanctioned".to_string());
            let source = if c.datasets.is_empty() {
                "OpenSanctions".to_string()
            } else {
                c.datasets.join(", ")
            };
            let link = c
                .id
                .as_deref()
                .map(|id| format!("{}/{}/", entity_base_url.trim_end_matches('/'), id))
                .unwrap_or_default();

            Some(SanctionHit {
                name,
                reason,
                source,
                match_confidence: confidence,
                link,
            })
        })
        .collect()
}

/// Upstream numeric `match`, else upstream `score`, else Jaro-Winkler over normalized names.
fn match_confidence(candidate: &Candidate, normalized_query: &str, name: &str) -> f64 {
    candidate
        .match_value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .or(candidate.score)
        .unwrap_or_else(|| jaro_winkler(normalized_query, &normalize_name(name)))
        .clamp(0.0, 1.0)
}
