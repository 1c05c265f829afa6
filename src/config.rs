use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::RegistryStatus;

/// Root configuration structure, deserialized from `.aml-checkr/config.toml`.
///
/// Every section is optional; missing sections and keys fall back to the
/// built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: Thresholds,
    pub http: HttpConfig,
    pub news: NewsConfig,
    pub sanctions: SanctionsConfig,
    pub registry: RegistryConfig,
    pub ubo: UboConfig,
    pub classifier: ClassifierConfig,
    pub cache: CacheConfig,
}

/// Acceptance cutoffs. Both comparisons are strict (`>`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum summed negative-category probability for a headline to count as evidence.
    pub news_risk_mass: f64,
    /// Minimum fuzzy-match confidence for a sanctions candidate.
    pub sanctions_match: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            news_risk_mass: 0.6,
            sanctions_match: 0.85,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 8,
            user_agent: format!(
                "aml-checkr/{} (due-diligence screening tool)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Google News RSS search endpoint.
    pub endpoint: String,
    pub language: String,
    pub country: String,
    pub max_headlines: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://news.google.com/rss/search".to_string(),
            language: "fi".to_string(),
            country: "FI".to_string(),
            max_headlines: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SanctionsConfig {
    /// OpenSanctions search endpoint (dataset included in the path).
    pub endpoint: String,
    /// Environment variable holding the API key; requests go out unauthenticated when unset.
    pub api_key_env: String,
    pub entity_base_url: String,
}

impl Default for SanctionsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.opensanctions.org/search/default".to_string(),
            api_key_env: "OPENSANCTIONS_API_KEY".to_string(),
            entity_base_url: "https://www.opensanctions.org/entities".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// ESMA MiCA CASP register (Solr `select` handler).
    pub endpoint: String,
    pub rows: u32,
    pub name_column: String,
    pub status_column: String,
    pub authority_column: String,
    /// Public page linked from reports.
    pub register_url: String,
    /// Ordered substring rules; the first matching rule wins.
    pub status_rules: Vec<StatusRule>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://registers.esma.europa.eu/solr/esma_registers_mica_casp/select"
                .to_string(),
            rows: 3,
            name_column: "legal_name".to_string(),
            status_column: "authorisation_status".to_string(),
            authority_column: "competent_authority".to_string(),
            register_url:
                "https://registers.esma.europa.eu/publication/searchRegister?core=esma_registers_mica_casp"
                    .to_string(),
            status_rules: default_status_rules(),
        }
    }
}

/// Maps a case-insensitive substring of the registry's free-text status to a [`RegistryStatus`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusRule {
    pub pattern: String,
    pub status: RegistryStatus,
}

impl StatusRule {
    fn new(pattern: &str, status: RegistryStatus) -> Self {
        Self {
            pattern: pattern.to_string(),
            status,
        }
    }
}

/// Built-in mapping table. Negative phrasings come first so that
/// "not authorised" never reaches the "authorised" rule.
pub fn default_status_rules() -> Vec<StatusRule> {
    use RegistryStatus::*;
    vec![
        StatusRule::new("not authorised", NonCompliant),
        StatusRule::new("not authorized", NonCompliant),
        StatusRule::new("unauthorised", NonCompliant),
        StatusRule::new("unauthorized", NonCompliant),
        StatusRule::new("non-compliant", NonCompliant),
        StatusRule::new("non compliant", NonCompliant),
        StatusRule::new("withdrawn", NonCompliant),
        StatusRule::new("revoked", NonCompliant),
        StatusRule::new("suspended", NonCompliant),
        StatusRule::new("refused", NonCompliant),
        StatusRule::new("rejected", NonCompliant),
        StatusRule::new("deregistered", NonCompliant),
        StatusRule::new("not registered", NonCompliant),
        StatusRule::new("unregistered", NonCompliant),
        StatusRule::new("not licensed", NonCompliant),
        StatusRule::new("unlicensed", NonCompliant),
        StatusRule::new("pending", Pending),
        StatusRule::new("in progress", Pending),
        StatusRule::new("under review", Pending),
        StatusRule::new("applied", Pending),
        StatusRule::new("application", Pending),
        StatusRule::new("authorised", Authorized),
        StatusRule::new("authorized", Authorized),
        StatusRule::new("granted", Authorized),
        StatusRule::new("registered", Authorized),
        StatusRule::new("licensed", Authorized),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UboConfig {
    /// Business-registry endpoint; the UBO lookup is skipped when unset.
    pub endpoint: Option<String>,
    pub api_key_env: String,
}

impl Default for UboConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: "UBO_REGISTRY_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Hosted zero-shot inference endpoint.
    Remote,
    /// Offline keyword lexicon.
    Keyword,
    /// No classification; every headline stays unevaluated.
    Off,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub endpoint: String,
    pub model: String,
    pub token_env: String,
    /// Inference can be slow on cold models; this overrides `http.timeout_secs`.
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Remote,
            endpoint: "https://router.huggingface.co/hf-inference/models".to_string(),
            model: "MoritzLaurer/mDeBERTa-v3-base-mnli-xnli".to_string(),
            token_env: "HF_TOKEN".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub news_ttl_secs: u64,
    /// Applies to sanctions, registry and UBO lookups.
    pub registry_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            news_ttl_secs: 15 * 60,
            registry_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `./.aml-checkr/config.toml`
/// 3. `~/.config/aml-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(working_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let local_config = working_dir.join(".aml-checkr").join("config.toml");
    if local_config.exists() {
        return read_config(&local_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("aml-checkr").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.thresholds.news_risk_mass, 0.6);
        assert_eq!(cfg.thresholds.sanctions_match, 0.85);
        assert_eq!(cfg.http.timeout_secs, 8);
        assert_eq!(cfg.news.max_headlines, 20);
        assert!(cfg.ubo.endpoint.is_none());
        assert_eq!(cfg.classifier.backend, ClassifierBackend::Remote);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[thresholds]
news_risk_mass = 0.65

[classifier]
backend = "keyword"
"#,
        )
        .unwrap();
        assert_eq!(cfg.thresholds.news_risk_mass, 0.65);
        assert_eq!(cfg.thresholds.sanctions_match, 0.85);
        assert_eq!(cfg.classifier.backend, ClassifierBackend::Keyword);
        assert_eq!(cfg.classifier.model, "MoritzLaurer/mDeBERTa-v3-base-mnli-xnli");
        assert_eq!(cfg.registry.status_rules, default_status_rules());
    }

    #[test]
    fn test_custom_status_rules_replace_table() {
        let cfg: Config = toml::from_str(
            r#"
[[registry.status_rules]]
pattern = "valid"
status = "authorized"

[[registry.status_rules]]
pattern = "lapsed"
status = "non_compliant"
"#,
        )
        .unwrap();
        assert_eq!(cfg.registry.status_rules.len(), 2);
        assert_eq!(cfg.registry.status_rules[1].status, RegistryStatus::NonCompliant);
    }

    #[test]
    fn test_load_config_override_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[ubo]\nendpoint = \"http://localhost:9000/companies\"\n").unwrap();

        let cfg = load_config(dir.path(), Some(&path)).unwrap();
        assert_eq!(cfg.ubo.endpoint.as_deref(), Some("http://localhost:9000/companies"));
    }

    #[test]
    fn test_load_config_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".aml-checkr")).unwrap();
        std::fs::write(
            dir.path().join(".aml-checkr").join("config.toml"),
            "[http]\ntimeout_secs = 3\n",
        )
        .unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.http.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[thresholds]\nnews_risk_mass = \"high\"\n").unwrap();
        assert!(load_config(dir.path(), Some(&path)).is_err());
    }
}
