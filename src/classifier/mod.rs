//! Zero-shot classification of news headlines into risk categories.
//!
//! - [`remote`]: hosted zero-shot NLI model over HTTP.
//! - [`keyword`]: offline lexicon fallback.
//! - [`evidence`]: turns per-category scores into retained [`NewsHit`](crate::models::NewsHit) evidence.
//!
//! The active backend is built once per process ([`shared`]) and reused by
//! every scan, including all scans of an interactive session.

pub mod evidence;
pub mod keyword;
pub mod remote;

use std::future::Future;

use once_cell::sync::OnceCell;

use crate::config::{ClassifierBackend, ClassifierConfig, HttpConfig};

/// Negative categories whose probabilities make up a headline's risk mass.
pub const RISK_CATEGORIES: [&str; 6] = [
    "fraud",
    "scam",
    "money laundering",
    "sanctions",
    "terrorism",
    "corruption",
];

pub const NEUTRAL_CATEGORY: &str = "neutral";

/// All candidate labels sent to the classifier, neutral last.
pub fn candidate_labels() -> Vec<&'static str> {
    let mut labels = RISK_CATEGORIES.to_vec();
    labels.push(NEUTRAL_CATEGORY);
    labels
}

/// Independent (multi-label) probabilities for one headline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryScores {
    pub scores: Vec<(String, f64)>,
}

impl CategoryScores {
    pub fn new(scores: Vec<(String, f64)>) -> Self {
        Self { scores }
    }

    /// Sum of probabilities over the non-neutral categories.
    pub fn risk_mass(&self) -> f64 {
        self.risk_scores().map(|(_, p)| p).sum()
    }

    /// Highest-probability non-neutral category, if any scored above zero.
    pub fn top_risk_category(&self) -> Option<&str> {
        self.risk_scores()
            .filter(|(_, p)| *p > 0.0)
            .fold(None, |best: Option<(&str, f64)>, (label, p)| match best {
                Some((_, best_p)) if best_p >= p => best,
                _ => Some((label, p)),
            })
            .map(|(label, _)| label)
    }

    fn risk_scores(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores
            .iter()
            .filter(|(label, _)| RISK_CATEGORIES.contains(&label.as_str()))
            .map(|(label, p)| (label.as_str(), *p))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier is disabled")]
    Disabled,
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected classifier response: {0}")]
    Payload(String),
}

/// A backend that scores headlines against [`candidate_labels`].
pub trait HeadlineClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return one [`CategoryScores`] per headline, in input order.
    fn classify(
        &self,
        headlines: &[String],
    ) -> impl Future<Output = Result<Vec<CategoryScores>, ClassifierError>> + Send;
}

/// The configured backend.
pub enum Classifier {
    Remote(remote::RemoteClassifier),
    Keyword(keyword::KeywordClassifier),
    Off,
}

impl Classifier {
    /// Build the backend named in the config. A remote backend whose HTTP
    /// client cannot be built degrades to [`Classifier::Off`].
    pub fn from_config(config: &ClassifierConfig, http: &HttpConfig) -> Self {
        match config.backend {
            ClassifierBackend::Remote => match remote::RemoteClassifier::new(config, http) {
                Ok(c) => Classifier::Remote(c),
                Err(e) => {
                    tracing::warn!(error = %e, "remote classifier unavailable; headlines stay unevaluated");
                    Classifier::Off
                }
            },
            ClassifierBackend::Keyword => Classifier::Keyword(keyword::KeywordClassifier::new()),
            ClassifierBackend::Off => Classifier::Off,
        }
    }
}

impl HeadlineClassifier for Classifier {
    fn name(&self) -> &'static str {
        match self {
            Classifier::Remote(c) => c.name(),
            Classifier::Keyword(c) => c.name(),
            Classifier::Off => "off",
        }
    }

    async fn classify(&self, headlines: &[String]) -> Result<Vec<CategoryScores>, ClassifierError> {
        match self {
            Classifier::Remote(c) => c.classify(headlines).await,
            Classifier::Keyword(c) => c.classify(headlines).await,
            Classifier::Off => Err(ClassifierError::Disabled),
        }
    }
}

static SHARED: OnceCell<Classifier> = OnceCell::new();

/// Process-wide classifier, built from the first config it is called with.
pub fn shared(config: &ClassifierConfig, http: &HttpConfig) -> &'static Classifier {
    SHARED.get_or_init(|| {
        let classifier = Classifier::from_config(config, http);
        tracing::info!(backend = classifier.name(), "classifier initialised");
        classifier
    })
}
