//! One screening run: fan out to every source, filter news through the
//! classifier, then score.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::cache::{cache_key, remember, ScanCache};
use crate::classifier::evidence::filter_headlines;
use crate::classifier::HeadlineClassifier;
use crate::config::Config;
use crate::models::{
    NewsHit, RegistryRecord, SanctionHit, ScanReport, ScanSubject, Signal, SourceOutcome,
    UboRecord,
};
use crate::risk::aggregator::aggregate;
use crate::sources::{self, mica, news, sanctions, settle, ubo};

/// Holds everything that outlives a single scan: the HTTP client, the
/// lookup cache and a reference to the process-wide classifier.
pub struct Scanner<'c, C> {
    client: Client,
    config: Config,
    cache: ScanCache,
    classifier: &'c C,
}

impl<'c, C: HeadlineClassifier> Scanner<'c, C> {
    pub fn new(config: Config, classifier: &'c C) -> reqwest::Result<Self> {
        let client = sources::build_client(&config.http)?;
        let cache = ScanCache::new(
            Duration::from_secs(config.cache.news_ttl_secs),
            Duration::from_secs(config.cache.registry_ttl_secs),
        );
        Ok(Self {
            client,
            config,
            cache,
            classifier,
        })
    }

    /// Screen `subject` against every source not listed in `skip`.
    ///
    /// Never fails: a source that cannot be reached is reported as
    /// unavailable and contributes nothing to the score.
    pub async fn scan(&self, subject: &ScanSubject, skip: &HashSet<Signal>) -> ScanReport {
        let (news, sanctions, registry, ubo) = if subject.is_empty() {
            tracing::warn!("empty subject; no sources queried");
            let reason = || "empty subject".to_string();
            (
                SourceOutcome::Skipped(reason()),
                SourceOutcome::Skipped(reason()),
                SourceOutcome::Skipped(reason()),
                SourceOutcome::Skipped(reason()),
            )
        } else {
            futures::join!(
                self.news(subject, skip),
                self.sanctions(subject, skip),
                self.registry(subject, skip),
                self.ubo(subject, skip),
            )
        };

        let assessment = aggregate(
            news.records(),
            sanctions.records(),
            registry.records(),
            ubo.records(),
        );
        tracing::info!(
            subject = %subject.raw,
            score = assessment.score,
            tier = %assessment.tier,
            "scan complete"
        );

        ScanReport {
            subject: subject.clone(),
            scanned_at: Utc::now(),
            news,
            sanctions,
            registry,
            ubo,
            assessment,
        }
    }

    async fn news(&self, subject: &ScanSubject, skip: &HashSet<Signal>) -> SourceOutcome<NewsHit> {
        if skip.contains(&Signal::News) {
            return skipped_by_request();
        }
        let key = cache_key(Signal::News, subject);
        if let Some(hits) = self.cache.news.get(&key) {
            tracing::debug!("news served from cache");
            return SourceOutcome::Checked(hits);
        }

        let fetched = settle(
            Signal::News,
            news::search_news(&self.client, &self.config.news, subject).await,
        );
        let outcome = match fetched {
            SourceOutcome::Checked(candidates) => {
                let threshold = self.config.thresholds.news_risk_mass;
                match filter_headlines(self.classifier, candidates, threshold).await {
                    Ok(evidence) => SourceOutcome::Checked(evidence),
                    Err(e) => {
                        tracing::warn!(
                            classifier = self.classifier.name(),
                            error = %e,
                            "headlines left unevaluated"
                        );
                        SourceOutcome::Unavailable(format!("classifier unavailable: {}", e))
                    }
                }
            }
            other => other,
        };

        remember(&self.cache.news, key, &outcome);
        outcome
    }

    async fn sanctions(
        &self,
        subject: &ScanSubject,
        skip: &HashSet<Signal>,
    ) -> SourceOutcome<SanctionHit> {
        if skip.contains(&Signal::Sanctions) {
            return skipped_by_request();
        }
        let key = cache_key(Signal::Sanctions, subject);
        if let Some(hits) = self.cache.sanctions.get(&key) {
            return SourceOutcome::Checked(hits);
        }

        let threshold = self.config.thresholds.sanctions_match;
        let outcome = settle(
            Signal::Sanctions,
            sanctions::screen_sanctions(&self.client, &self.config.sanctions, subject, threshold)
                .await,
        );
        remember(&self.cache.sanctions, key, &outcome);
        outcome
    }

    async fn registry(
        &self,
        subject: &ScanSubject,
        skip: &HashSet<Signal>,
    ) -> SourceOutcome<RegistryRecord> {
        if skip.contains(&Signal::Registry) {
            return skipped_by_request();
        }
        let key = cache_key(Signal::Registry, subject);
        if let Some(records) = self.cache.registry.get(&key) {
            return SourceOutcome::Checked(records);
        }

        let outcome = settle(
            Signal::Registry,
            mica::screen_mica(&self.client, &self.config.registry, subject).await,
        );
        remember(&self.cache.registry, key, &outcome);
        outcome
    }

    async fn ubo(&self, subject: &ScanSubject, skip: &HashSet<Signal>) -> SourceOutcome<UboRecord> {
        if skip.contains(&Signal::Ubo) {
            return skipped_by_request();
        }
        let Some(endpoint) = self.config.ubo.endpoint.as_deref() else {
            return SourceOutcome::Skipped("no UBO registry configured".to_string());
        };

        let key = cache_key(Signal::Ubo, subject);
        if let Some(records) = self.cache.ubo.get(&key) {
            return SourceOutcome::Checked(records);
        }

        let outcome = settle(
            Signal::Ubo,
            ubo::screen_ubo(&self.client, &self.config.ubo, endpoint, subject).await,
        );
        remember(&self.cache.ubo, key, &outcome);
        outcome
    }
}

fn skipped_by_request<T>() -> SourceOutcome<T> {
    SourceOutcome::Skipped("skipped by request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::keyword::KeywordClassifier;
    use crate::classifier::Classifier;
    use crate::detector::detect_subject;
    use crate::models::{RiskTier, SourceAvailability, SubjectKind};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<rss version="2.0"><channel><title>feed</title>
<item><title>Acme Oy accused of fraud and money laundering</title><link>https://yle.fi/a/1</link></item>
<item><title>Acme Oy opens office in Oulu</title><link>https://yle.fi/a/2</link></item>
</channel></rss>"#;

    const CSV: &str = "legal_name,authorisation_status,competent_authority\nAcme Oy,Withdrawn,FIN-FSA\n";

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.news.endpoint = format!("{}/rss", server.uri());
        config.sanctions.endpoint = format!("{}/sanctions", server.uri());
        config.sanctions.api_key_env = "AML_CHECKR_TEST_UNSET_KEY".to_string();
        config.registry.endpoint = format!("{}/mica", server.uri());
        config.ubo.endpoint = Some(format!("{}/ubo", server.uri()));
        config.ubo.api_key_env = "AML_CHECKR_TEST_UNSET_UBO_KEY".to_string();
        config
    }

    async fn mount_all(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sanctions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": "Q1", "name": "Acme Oy", "match": 0.92, "reason": "EU list"}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mica"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(CSV, "text/csv"),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ubo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"companyName": "Acme Oy", "businessId": "1234567-8"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_full_scan_scores_every_signal() {
        let server = MockServer::start().await;
        mount_all(&server).await;

        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let report = scanner.scan(&detect_subject("Acme Oy"), &HashSet::new()).await;

        assert_eq!(report.news.records().len(), 1);
        assert_eq!(report.sanctions.records().len(), 1);
        assert_eq!(report.registry.records().len(), 1);
        assert_eq!(report.ubo.records().len(), 1);
        // 10 + 50 + 20 + 10
        assert_eq!(report.assessment.score, 90);
        assert_eq!(report.assessment.tier, RiskTier::High);
        assert_eq!(report.assessment.explanation.len(), 4);
    }

    #[tokio::test]
    async fn test_failing_source_is_unavailable_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sanctions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_all(&server).await;

        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let report = scanner.scan(&detect_subject("Acme Oy"), &HashSet::new()).await;

        assert_eq!(report.sanctions.availability(), SourceAvailability::Unavailable);
        assert_eq!(report.assessment.score, 40);
        assert_eq!(report.assessment.tier, RiskTier::Moderate);
    }

    #[tokio::test]
    async fn test_skip_list_and_wallet_subject() {
        let server = MockServer::start().await;
        mount_all(&server).await;

        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let skip: HashSet<Signal> = [Signal::News, Signal::Registry].into_iter().collect();
        let wallet = detect_subject("0x52908400098527886E0F7030069857D2E4169EE7");
        let report = scanner.scan(&wallet, &skip).await;

        assert_eq!(report.news.availability(), SourceAvailability::Skipped);
        assert_eq!(report.registry.availability(), SourceAvailability::Skipped);
        assert!(report.ubo.is_checked());
        assert!(report.sanctions.is_checked());
    }

    #[tokio::test]
    async fn test_wallet_with_pending_registry_and_missing_ubo() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<rss version="2.0"><channel><title>feed</title></channel></rss>"#,
                "application/rss+xml",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sanctions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mica"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "legal_name,authorisation_status,competent_authority\nrHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh,Pending,FIN-FSA\n",
                "text/csv",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ubo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"companyName": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh", "businessId": "7654321-0"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let wallet = detect_subject("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh");
        assert_eq!(wallet.kind, SubjectKind::Wallet);
        let report = scanner.scan(&wallet, &HashSet::new()).await;

        assert_eq!(report.registry.records().len(), 1);
        assert_eq!(report.ubo.records().len(), 1);
        // 20 registry + 10 UBO
        assert_eq!(report.assessment.score, 30);
        assert_eq!(report.assessment.tier, RiskTier::Low);
    }

    #[tokio::test]
    async fn test_missing_ubo_endpoint_skips_lookup() {
        let server = MockServer::start().await;
        mount_all(&server).await;

        let mut config = config_for(&server);
        config.ubo.endpoint = None;
        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config, &classifier).unwrap();
        let report = scanner.scan(&detect_subject("Acme Oy"), &HashSet::new()).await;

        assert_eq!(report.ubo.availability(), SourceAvailability::Skipped);
    }

    #[tokio::test]
    async fn test_empty_subject_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let report = scanner.scan(&detect_subject("   "), &HashSet::new()).await;

        assert_eq!(report.assessment.score, 0);
        assert_eq!(report.assessment.tier, RiskTier::Low);
        assert!(report.assessment.explanation.is_empty());
        assert!(!report.has_findings());
    }

    #[tokio::test]
    async fn test_disabled_classifier_marks_news_unavailable() {
        let server = MockServer::start().await;
        mount_all(&server).await;

        let classifier = Classifier::Off;
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let report = scanner.scan(&detect_subject("Acme Oy"), &HashSet::new()).await;

        assert_eq!(report.news.availability(), SourceAvailability::Unavailable);
        assert!(report
            .news
            .detail()
            .is_some_and(|d| d.starts_with("classifier unavailable")));
        assert!(report.news.records().is_empty());
        assert_eq!(report.assessment.score, 80);
    }

    #[tokio::test]
    async fn test_second_scan_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mica"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(CSV, "text/csv"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let classifier = KeywordClassifier::new();
        let scanner = Scanner::new(config_for(&server), &classifier).unwrap();
        let skip: HashSet<Signal> = [Signal::News, Signal::Sanctions, Signal::Ubo]
            .into_iter()
            .collect();

        let first = scanner.scan(&detect_subject("Acme Oy"), &skip).await;
        let second = scanner.scan(&detect_subject("  acme   OY "), &skip).await;
        assert_eq!(first.registry, second.registry);
        assert_eq!(second.assessment.score, 20);
    }
}
