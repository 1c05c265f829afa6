use reqwest::Client;
use serde_json::Value;

use super::{ensure_success, SourceError};
use crate::config::UboConfig;
use crate::models::{DisclosureStatus, ScanSubject, UboRecord};

const NAME_KEYS: &[&str] = &["companyName", "company_name", "name"];
const ID_KEYS: &[&str] = &["businessId", "business_id", "registrationNumber", "id"];
const FLAG_KEYS: &[&str] = &[
    "uboFiled",
    "ubo_filed",
    "beneficialOwnersFiled",
    "beneficial_owners_filed",
];

/// Ask the business registry whether the subject's beneficial owners have been disclosed.
///
/// Companies without a disclosure flag count as [`DisclosureStatus::Missing`].
pub async fn screen_ubo(
    client: &Client,
    config: &UboConfig,
    endpoint: &str,
    subject: &ScanSubject,
) -> Result<Vec<UboRecord>, SourceError> {
    let mut request = client.get(endpoint).query(&[("name", subject.raw.as_str())]);
    if let Ok(key) = std::env::var(&config.api_key_env) {
        if !key.trim().is_empty() {
            request = request.bearer_auth(key.trim());
        }
    }

    let response = ensure_success(request.send().await?)?;
    let body: Value = response
        .json()
        .await
        .map_err(|e| SourceError::Payload(e.to_string()))?;
    parse_companies(&body)
}

fn parse_companies(body: &Value) -> Result<Vec<UboRecord>, SourceError> {
    let companies = match body {
        Value::Array(items) => items,
        Value::Object(map) => ["companies", "results"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| SourceError::Payload("no company list in response".to_string()))?,
        _ => return Err(SourceError::Payload("unexpected UBO response".to_string())),
    };

    Ok(companies.iter().filter_map(company_record).collect())
}

fn company_record(company: &Value) -> Option<UboRecord> {
    let company_name = first_string(company, NAME_KEYS)?;
    let business_id = first_string(company, ID_KEYS).unwrap_or_default();
    let filed = FLAG_KEYS
        .iter()
        .find_map(|key| company.get(*key).and_then(truthy))
        .unwrap_or(false);

    Some(UboRecord {
        company_name,
        business_id,
        disclosure_status: if filed {
            DisclosureStatus::Filed
        } else {
            DisclosureStatus::Missing
        },
    })
}

/// Plain strings, or `{"value": "..."}` wrappers as some registries nest identifiers.
fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let value = obj.get(*key)?;
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Object(inner) => inner.get("value")?.as_str()?.to_string(),
            _ => return None,
        };
        Some(text.trim().to_string()).filter(|t| !t.is_empty())
    })
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "filed" => Some(true),
            "false" | "no" | "0" | "missing" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
