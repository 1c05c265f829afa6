use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{candidate_labels, CategoryScores, ClassifierError, HeadlineClassifier};
use crate::config::{ClassifierConfig, HttpConfig};

/// Headlines per inference request.
const BATCH_SIZE: usize = 10;

/// Zero-shot NLI model behind a Hugging Face style inference endpoint.
pub struct RemoteClassifier {
    client: Client,
    url: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    candidate_labels: Vec<&'static str>,
    multi_label: bool,
}

/// The endpoint answers in one of several shapes depending on input count and API generation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<ZeroShotOutput>),
    One(ZeroShotOutput),
    LabelLists(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct ZeroShotOutput {
    labels: Vec<String>,
    scores: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl RemoteClassifier {
    pub fn new(config: &ClassifierConfig, http: &HttpConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&http.user_agent)
            .build()?;

        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            client,
            url: format!("{}/{}", config.endpoint.trim_end_matches('/'), config.model),
            token,
        })
    }

    async fn classify_batch(&self, batch: &[String]) -> Result<Vec<CategoryScores>, ClassifierError> {
        let body = InferenceRequest {
            inputs: batch,
            parameters: InferenceParameters {
                candidate_labels: candidate_labels(),
                multi_label: true,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: InferenceResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Payload(e.to_string()))?;
        let scores = into_scores(parsed)?;

        if scores.len() != batch.len() {
            return Err(ClassifierError::Payload(format!(
                "expected {} results, got {}",
                batch.len(),
                scores.len()
            )));
        }
        Ok(scores)
    }
}

impl HeadlineClassifier for RemoteClassifier {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn classify(&self, headlines: &[String]) -> Result<Vec<CategoryScores>, ClassifierError> {
        let batches = join_all(headlines.chunks(BATCH_SIZE).map(|b| self.classify_batch(b))).await;

        let mut out = Vec::with_capacity(headlines.len());
        for batch in batches {
            out.extend(batch?);
        }
        Ok(out)
    }
}

fn into_scores(response: InferenceResponse) -> Result<Vec<CategoryScores>, ClassifierError> {
    let from_output = |o: ZeroShotOutput| -> Result<CategoryScores, ClassifierError> {
        if o.labels.len() != o.scores.len() {
            return Err(ClassifierError::Payload(
                "labels and scores differ in length".to_string(),
            ));
        }
        Ok(CategoryScores::new(o.labels.into_iter().zip(o.scores).collect()))
    };
    let from_pairs = |pairs: Vec<LabelScore>| {
        CategoryScores::new(pairs.into_iter().map(|p| (p.label, p.score)).collect())
    };

    match response {
        InferenceResponse::Many(outputs) => outputs.into_iter().map(from_output).collect(),
        InferenceResponse::One(output) => Ok(vec![from_output(output)?]),
        InferenceResponse::LabelLists(lists) => Ok(lists.into_iter().map(from_pairs).collect()),
        InferenceResponse::Flat(pairs) => Ok(vec![from_pairs(pairs)]),
    }
}
