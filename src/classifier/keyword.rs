use super::{CategoryScores, ClassifierError, HeadlineClassifier, NEUTRAL_CATEGORY};

const WEIGHT_PER_MATCH: f64 = 0.45;

/// Lowercase stems per risk category (English and Finnish).
const LEXICON: [(&str, &[&str]); 6] = [
    ("fraud", &["fraud", "embezzl", "forgery", "petos", "kavallu", "väärennö"]),
    ("scam", &["scam", "ponzi", "pyramid scheme", "rug pull", "huijau", "huijari"]),
    ("money laundering", &["launder", "rahanpes"]),
    ("sanctions", &["sanction", "ofac", "asset freeze", "pakote", "pakottei"]),
    ("terrorism", &["terroris", "terror financing", "extremis", "terrori"]),
    ("corruption", &["corrupt", "bribe", "briber", "kickback", "korruptio", "lahjo"]),
];

/// Scores each category by how many distinct stems of its lexicon a headline contains.
///
/// A category scores `min(1, 0.45 × matches)`; neutral is `1 − max(category)`.
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, headline: &str) -> CategoryScores {
        let lower = headline.to_lowercase();
        let mut scores: Vec<(String, f64)> = LEXICON
            .iter()
            .map(|(category, stems)| {
                let matches = distinct_matches(&lower, stems);
                let p = (matches as f64 * WEIGHT_PER_MATCH).min(1.0);
                (category.to_string(), p)
            })
            .collect();

        let max = scores.iter().map(|(_, p)| *p).fold(0.0, f64::max);
        scores.push((NEUTRAL_CATEGORY.to_string(), 1.0 - max));
        CategoryScores::new(scores)
    }
}

/// Count stems found in `text`, ignoring a stem whose match is already covered
/// by a longer matched stem ("terrori" inside "terroris").
fn distinct_matches(text: &str, stems: &[&str]) -> usize {
    let found: Vec<&str> = stems.iter().copied().filter(|stem| text.contains(*stem)).collect();
    found
        .iter()
        .filter(|stem| {
            !found
                .iter()
                .any(|other| other.len() > stem.len() && other.contains(**stem))
        })
        .count()
}

impl HeadlineClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn classify(&self, headlines: &[String]) -> Result<Vec<CategoryScores>, ClassifierError> {
        Ok(headlines.iter().map(|h| self.score(h)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_headline() {
        let s = KeywordClassifier::new().score("Acme Ltd opens new office in Tampere");
        assert_eq!(s.risk_mass(), 0.0);
        assert_eq!(s.top_risk_category(), None);
    }

    #[test]
    fn test_multi_label_headline() {
        let s = KeywordClassifier::new()
            .score("Prosecutors allege fraud and money laundering at Acme Ltd");
        // fraud 0.45 + money laundering 0.45
        assert!((s.risk_mass() - 0.9).abs() < 1e-9);
        assert!(s.risk_mass() > 0.6);
    }

    #[test]
    fn test_single_word_scores_alike_in_every_category() {
        let classifier = KeywordClassifier::default();
        for headline in [
            "Acme Ltd linked to terrorism",
            "Acme Ltd bribery probe",
            "Acme Ltd charged with fraud",
            "Acme Ltd sanctioned by EU",
            "Acme Ltd launders funds",
            "Acme Ltd runs a scam",
        ] {
            let s = classifier.score(headline);
            assert!((s.risk_mass() - 0.45).abs() < 1e-9, "{headline}: {}", s.risk_mass());
        }
    }

    #[test]
    fn test_finnish_headline() {
        let s = KeywordClassifier::new().score("Yhtiön johtajaa epäillään törkeästä rahanpesusta");
        assert_eq!(s.top_risk_category(), Some("money laundering"));
    }

    #[tokio::test]
    async fn test_classify_preserves_order() {
        let headlines = vec![
            "Bribery probe widens".to_string(),
            "Quarterly results".to_string(),
        ];
        let out = KeywordClassifier::new().classify(&headlines).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].top_risk_category(), Some("corruption"));
        assert_eq!(out[1].risk_mass(), 0.0);
    }
}
