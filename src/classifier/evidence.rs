use super::{CategoryScores, ClassifierError, HeadlineClassifier};
use crate::models::NewsHit;

/// Classify candidate headlines and keep those whose risk mass exceeds `threshold`.
///
/// An empty candidate list never reaches the classifier. Any classifier
/// failure is returned as-is; the caller decides how to degrade.
pub async fn filter_headlines<C: HeadlineClassifier>(
    classifier: &C,
    candidates: Vec<NewsHit>,
    threshold: f64,
) -> Result<Vec<NewsHit>, ClassifierError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let titles: Vec<String> = candidates.iter().map(|c| c.title.clone()).collect();
    let scores = classifier.classify(&titles).await?;
    if scores.len() != candidates.len() {
        return Err(ClassifierError::Payload(format!(
            "{} headlines in, {} results out",
            candidates.len(),
            scores.len()
        )));
    }

    Ok(select_evidence(candidates, &scores, threshold))
}

/// Keep candidates with `risk_mass > threshold` (strict), stamping each with
/// its rounded 0–100 risk score and top category.
pub fn select_evidence(
    candidates: Vec<NewsHit>,
    scores: &[CategoryScores],
    threshold: f64,
) -> Vec<NewsHit> {
    candidates
        .into_iter()
        .zip(scores)
        .filter_map(|(mut hit, score)| {
            let mass = score.risk_mass();
            if mass <= threshold {
                return None;
            }
            hit.risk_score = Some((mass * 100.0).round().clamp(0.0, 100.0));
            hit.top_category = score.top_risk_category().map(str::to_string);
            Some(hit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns preset scores and counts how often it was asked.
    struct FixedClassifier {
        scores: Vec<CategoryScores>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(masses: &[(&str, f64)]) -> Self {
            Self {
                scores: masses
                    .iter()
                    .map(|(label, p)| {
                        CategoryScores::new(vec![
                            (label.to_string(), *p),
                            ("neutral".to_string(), 1.0 - p),
                        ])
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HeadlineClassifier for FixedClassifier {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn classify(&self, _headlines: &[String]) -> Result<Vec<CategoryScores>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scores.clone())
        }
    }

    fn hits(n: usize) -> Vec<NewsHit> {
        (0..n)
            .map(|i| NewsHit {
                title: format!("Headline {}", i),
                link: format!("https://news.example/{}", i),
                source: "Example".to_string(),
                risk_score: None,
                top_category: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        let classifier = FixedClassifier::new(&[("fraud", 0.6), ("fraud", 0.61)]);
        let kept = filter_headlines(&classifier, hits(2), 0.6).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Headline 1");
        assert_eq!(kept[0].risk_score, Some(61.0));
    }

    #[tokio::test]
    async fn test_kept_hits_carry_score_and_category() {
        let classifier = FixedClassifier::new(&[("money laundering", 0.7), ("scam", 0.8), ("scam", 0.1)]);
        let kept = filter_headlines(&classifier, hits(3), 0.6).await.unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].risk_score, Some(70.0));
        assert_eq!(kept[0].top_category.as_deref(), Some("money laundering"));
        assert_eq!(kept[1].risk_score, Some(80.0));
        assert_eq!(kept[1].top_category.as_deref(), Some("scam"));
    }

    #[tokio::test]
    async fn test_empty_input_skips_classifier() {
        let classifier = FixedClassifier::new(&[]);
        let kept = filter_headlines(&classifier, Vec::new(), 0.6).await.unwrap();
        assert!(kept.is_empty());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_result_count_mismatch_is_an_error() {
        let classifier = FixedClassifier::new(&[("fraud", 0.9)]);
        let result = filter_headlines(&classifier, hits(2), 0.6).await;
        assert!(matches!(result, Err(ClassifierError::Payload(_))));
    }

    #[test]
    fn test_multi_label_mass_is_summed_and_capped_in_score() {
        let scores = vec![CategoryScores::new(vec![
            ("fraud".to_string(), 0.9),
            ("money laundering".to_string(), 0.8),
            ("neutral".to_string(), 0.1),
        ])];
        let kept = select_evidence(hits(1), &scores, 0.6);
        assert_eq!(kept[0].risk_score, Some(100.0));
        assert_eq!(kept[0].top_category.as_deref(), Some("fraud"));
    }

    #[test]
    fn test_configurable_threshold() {
        let scores = vec![CategoryScores::new(vec![("scam".to_string(), 0.62)])];
        assert_eq!(select_evidence(hits(1), &scores, 0.6).len(), 1);
        assert!(select_evidence(hits(1), &scores, 0.65).is_empty());
    }
}
