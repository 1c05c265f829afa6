use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identifier submitted for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSubject {
    pub raw: String,
    pub kind: SubjectKind,
}

impl ScanSubject {
    /// Normalized form used for cache keys: trimmed, lowercase, single spaces.
    pub fn normalized(&self) -> String {
        self.raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    Wallet,
    Entity,
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectKind::Wallet => write!(f, "Wallet"),
            SubjectKind::Entity => write!(f, "Person / Company"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsHit {
    pub title: String,
    pub link: String,
    pub source: String,
    /// Set only once the headline passed classification.
    pub risk_score: Option<f64>,
    pub top_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionHit {
    pub name: String,
    pub reason: String,
    pub source: String,
    pub match_confidence: f64,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub legal_name: String,
    pub status: RegistryStatus,
    /// Status text exactly as the registry published it.
    pub status_raw: String,
    pub authority: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryStatus {
    Authorized,
    Pending,
    NonCompliant,
    Unknown,
}

impl std::fmt::Display for RegistryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryStatus::Authorized => write!(f, "Authorized"),
            RegistryStatus::Pending => write!(f, "Pending"),
            RegistryStatus::NonCompliant => write!(f, "Non-Compliant"),
            RegistryStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UboRecord {
    pub company_name: String,
    pub business_id: String,
    pub disclosure_status: DisclosureStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisclosureStatus {
    Filed,
    Missing,
}

impl std::fmt::Display for DisclosureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisclosureStatus::Filed => write!(f, "Filed"),
            DisclosureStatus::Missing => write!(f, "Missing"),
        }
    }
}

/// What one source produced for a scan.
///
/// `Checked(vec![])` means the source answered and found nothing;
/// `Unavailable` means it could not be asked. Reports keep the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SourceOutcome<T> {
    Checked(Vec<T>),
    Unavailable(String),
    Skipped(String),
}

impl<T> SourceOutcome<T> {
    /// Records found, or an empty slice for sources that were not checked.
    pub fn records(&self) -> &[T] {
        match self {
            SourceOutcome::Checked(records) => records,
            _ => &[],
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, SourceOutcome::Checked(_))
    }

    pub fn availability(&self) -> SourceAvailability {
        match self {
            SourceOutcome::Checked(_) => SourceAvailability::Checked,
            SourceOutcome::Unavailable(_) => SourceAvailability::Unavailable,
            SourceOutcome::Skipped(_) => SourceAvailability::Skipped,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            SourceOutcome::Checked(_) => None,
            SourceOutcome::Unavailable(reason) | SourceOutcome::Skipped(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceAvailability {
    Checked,
    Unavailable,
    Skipped,
}

impl std::fmt::Display for SourceAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceAvailability::Checked => write!(f, "checked"),
            SourceAvailability::Unavailable => write!(f, "unavailable"),
            SourceAvailability::Skipped => write!(f, "skipped"),
        }
    }
}

/// The four signal axes, in the order they are scored and explained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    News,
    Sanctions,
    Registry,
    Ubo,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::News => write!(f, "News"),
            Signal::Sanctions => write!(f, "Sanctions"),
            Signal::Registry => write!(f, "MiCA Registry"),
            Signal::Ubo => write!(f, "UBO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Moderate => write!(f, "Moderate"),
            RiskTier::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub signal: Signal,
    pub delta: u32,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub tier: RiskTier,
    pub explanation: Vec<Contribution>,
}

/// Everything one scan produced; the input to every report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub subject: ScanSubject,
    pub scanned_at: DateTime<Utc>,
    pub news: SourceOutcome<NewsHit>,
    pub sanctions: SourceOutcome<SanctionHit>,
    pub registry: SourceOutcome<RegistryRecord>,
    pub ubo: SourceOutcome<UboRecord>,
    pub assessment: RiskAssessment,
}

impl ScanReport {
    /// Availability and optional detail per signal, in scoring order.
    pub fn source_status(&self) -> Vec<(Signal, SourceAvailability, Option<&str>)> {
        vec![
            (Signal::News, self.news.availability(), self.news.detail()),
            (Signal::Sanctions, self.sanctions.availability(), self.sanctions.detail()),
            (Signal::Registry, self.registry.availability(), self.registry.detail()),
            (Signal::Ubo, self.ubo.availability(), self.ubo.detail()),
        ]
    }

    pub fn has_findings(&self) -> bool {
        !self.news.records().is_empty()
            || !self.sanctions.records().is_empty()
            || !self.registry.records().is_empty()
            || !self.ubo.records().is_empty()
    }

    /// Flattened (type, description, link) rows for evidence tables.
    pub fn evidence_rows(&self) -> Vec<EvidenceRow> {
        let mut rows = Vec::new();
        for hit in self.news.records() {
            let detail = match (&hit.top_category, hit.risk_score) {
                (Some(cat), Some(score)) => format!("{} [{} {:.0}]", hit.title, cat, score),
                _ => hit.title.clone(),
            };
            rows.push(EvidenceRow {
                kind: "News",
                description: detail,
                link: Some(hit.link.clone()).filter(|l| !l.is_empty()),
            });
        }
        for hit in self.sanctions.records() {
            rows.push(EvidenceRow {
                kind: "Sanction",
                description: format!(
                    "{} ({}, match {:.0}%)",
                    hit.name,
                    hit.reason,
                    hit.match_confidence * 100.0
                ),
                link: Some(hit.link.clone()).filter(|l| !l.is_empty()),
            });
        }
        for rec in self.registry.records() {
            rows.push(EvidenceRow {
                kind: "MiCA",
                description: format!("{} - {} ({})", rec.legal_name, rec.status, rec.status_raw),
                link: Some(rec.link.clone()).filter(|l| !l.is_empty()),
            });
        }
        for rec in self.ubo.records() {
            rows.push(EvidenceRow {
                kind: "UBO",
                description: format!(
                    "{} ({}) - beneficial owners {}",
                    rec.company_name,
                    rec.business_id,
                    rec.disclosure_status.to_string().to_lowercase()
                ),
                link: None,
            });
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceRow {
    pub kind: &'static str,
    pub description: String,
    pub link: Option<String>,
}
