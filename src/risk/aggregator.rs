use crate::models::{
    Contribution, DisclosureStatus, NewsHit, RegistryRecord, RegistryStatus, RiskAssessment,
    RiskTier, SanctionHit, Signal, UboRecord,
};

const NEWS_POINTS_PER_HIT: u32 = 10;
const NEWS_CAP: u32 = 30;
const SANCTIONS_POINTS_PER_HIT: u32 = 50;
const SANCTIONS_CAP: u32 = 100;
const REGISTRY_FLAG: u32 = 20;
const UBO_FLAG: u32 = 10;
const MAX_SCORE: u32 = 100;

/// Scores above this are [`RiskTier::High`].
pub const HIGH_TIER_ABOVE: u32 = 70;
/// Scores above this (and not above [`HIGH_TIER_ABOVE`]) are [`RiskTier::Moderate`].
pub const MODERATE_TIER_ABOVE: u32 = 30;

/// Fold all evidence into a single score, tier and explanation trail.
///
/// Pure and deterministic: contributions are computed independently, summed
/// in the fixed order news → sanctions → registry → UBO and clamped to
/// `0..=100`. Signals contributing nothing are left out of the explanation.
pub fn aggregate(
    news: &[NewsHit],
    sanctions: &[SanctionHit],
    registry: &[RegistryRecord],
    ubo: &[UboRecord],
) -> RiskAssessment {
    let contributions = [
        news_contribution(news),
        sanctions_contribution(sanctions),
        registry_contribution(registry),
        ubo_contribution(ubo),
    ];

    let explanation: Vec<Contribution> = contributions.into_iter().flatten().collect();
    let total: u32 = explanation.iter().map(|c| c.delta).sum();
    let score = total.min(MAX_SCORE);

    RiskAssessment {
        score,
        tier: tier_for(score),
        explanation,
    }
}

/// Tier breakpoints are exclusive lower bounds: 70 is Moderate, 30 is Low.
pub fn tier_for(score: u32) -> RiskTier {
    if score > HIGH_TIER_ABOVE {
        RiskTier::High
    } else if score > MODERATE_TIER_ABOVE {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

fn saturating_points(count: usize, per_hit: u32, cap: u32) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    count.saturating_mul(per_hit).min(cap)
}

fn news_contribution(news: &[NewsHit]) -> Option<Contribution> {
    let delta = saturating_points(news.len(), NEWS_POINTS_PER_HIT, NEWS_CAP);
    if delta == 0 {
        return None;
    }

    let mut rationale = format!(
        "{} negative news headline{} classified as adverse",
        news.len(),
        plural(news.len())
    );
    if let Some(category) = dominant_category(news) {
        rationale.push_str(&format!(" (mostly {})", category));
    }
    if news.len() > (NEWS_CAP / NEWS_POINTS_PER_HIT) as usize {
        rationale.push_str(&format!(", capped at {}", NEWS_CAP));
    }

    Some(Contribution {
        signal: Signal::News,
        delta,
        rationale,
    })
}

fn sanctions_contribution(sanctions: &[SanctionHit]) -> Option<Contribution> {
    let delta = saturating_points(sanctions.len(), SANCTIONS_POINTS_PER_HIT, SANCTIONS_CAP);
    if delta == 0 {
        return None;
    }

    let names: Vec<&str> = sanctions.iter().take(3).map(|s| s.name.as_str()).collect();
    let rationale = format!(
        "{} sanctions list match{}: {}{}",
        sanctions.len(),
        if sanctions.len() == 1 { "" } else { "es" },
        names.join(", "),
        if sanctions.len() > names.len() { ", …" } else { "" }
    );

    Some(Contribution {
        signal: Signal::Sanctions,
        delta,
        rationale,
    })
}

fn registry_contribution(registry: &[RegistryRecord]) -> Option<Contribution> {
    let flagged: Vec<&RegistryRecord> = registry
        .iter()
        .filter(|r| r.status != RegistryStatus::Authorized)
        .collect();
    let first = flagged.first()?;

    let rationale = if flagged.len() == 1 {
        format!("MiCA register lists {} as {}", first.legal_name, first.status)
    } else {
        format!(
            "{} MiCA register entries without authorization (e.g. {}: {})",
            flagged.len(),
            first.legal_name,
            first.status
        )
    };

    Some(Contribution {
        signal: Signal::Registry,
        delta: REGISTRY_FLAG,
        rationale,
    })
}

fn ubo_contribution(ubo: &[UboRecord]) -> Option<Contribution> {
    let missing = ubo
        .iter()
        .find(|u| u.disclosure_status == DisclosureStatus::Missing)?;

    Some(Contribution {
        signal: Signal::Ubo,
        delta: UBO_FLAG,
        rationale: format!(
            "No beneficial-ownership disclosure filed for {} ({})",
            missing.company_name, missing.business_id
        ),
    })
}

/// Most frequent `top_category`; ties resolve to the category seen first.
fn dominant_category(news: &[NewsHit]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for category in news.iter().filter_map(|n| n.top_category.as_deref()) {
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, &(c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn news(n: usize) -> Vec<NewsHit> {
        (0..n)
            .map(|i| NewsHit {
                title: format!("Headline {}", i),
                link: format!("https://news.example/{}", i),
                source: "Example".to_string(),
                risk_score: Some(70.0),
                top_category: Some("fraud".to_string()),
            })
            .collect()
    }

    fn sanctions(n: usize) -> Vec<SanctionHit> {
        (0..n)
            .map(|i| SanctionHit {
                name: format!("Entity {}", i),
                reason: "Sanctioned".to_string(),
                source: "OpenSanctions".to_string(),
                match_confidence: 0.9,
                link: String::new(),
            })
            .collect()
    }

    fn registry(status: RegistryStatus) -> Vec<RegistryRecord> {
        vec![RegistryRecord {
            legal_name: "Acme Ltd".to_string(),
            status,
            status_raw: status.to_string(),
            authority: "FIN-FSA".to_string(),
            link: String::new(),
        }]
    }

    fn ubo(status: DisclosureStatus) -> Vec<UboRecord> {
        vec![UboRecord {
            company_name: "Acme Ltd".to_string(),
            business_id: "1234567-8".to_string(),
            disclosure_status: status,
        }]
    }

    #[test]
    fn test_empty_evidence_scores_zero() {
        let a = aggregate(&[], &[], &[], &[]);
        assert_eq!(a.score, 0);
        assert_eq!(a.tier, RiskTier::Low);
        assert!(a.explanation.is_empty());
    }

    #[test]
    fn test_tier_breakpoints() {
        assert_eq!(tier_for(0), RiskTier::Low);
        assert_eq!(tier_for(30), RiskTier::Low);
        assert_eq!(tier_for(31), RiskTier::Moderate);
        assert_eq!(tier_for(70), RiskTier::Moderate);
        assert_eq!(tier_for(71), RiskTier::High);
        assert_eq!(tier_for(100), RiskTier::High);
    }

    #[test]
    fn test_news_saturates_at_thirty() {
        let scores: Vec<u32> = (0..6).map(|n| aggregate(&news(n), &[], &[], &[]).score).collect();
        assert_eq!(scores, vec![0, 10, 20, 30, 30, 30]);
    }

    #[test]
    fn test_sanctions_contribution() {
        assert_eq!(aggregate(&[], &sanctions(1), &[], &[]).score, 50);
        assert_eq!(aggregate(&[], &sanctions(2), &[], &[]).score, 100);
        assert_eq!(aggregate(&[], &sanctions(5), &[], &[]).score, 100);
    }

    #[test]
    fn test_registry_flag_is_binary() {
        let one = registry(RegistryStatus::Pending);
        let mut three = registry(RegistryStatus::NonCompliant);
        three.extend(registry(RegistryStatus::Unknown));
        three.extend(registry(RegistryStatus::Pending));

        assert_eq!(aggregate(&[], &[], &one, &[]).score, 20);
        assert_eq!(aggregate(&[], &[], &three, &[]).score, 20);
        assert_eq!(aggregate(&[], &[], &registry(RegistryStatus::Authorized), &[]).score, 0);
    }

    #[test]
    fn test_mixed_registry_records_flag_once() {
        let mut records = registry(RegistryStatus::Authorized);
        records.extend(registry(RegistryStatus::Pending));
        let a = aggregate(&[], &[], &records, &[]);
        assert_eq!(a.score, 20);
        assert_eq!(a.explanation.len(), 1);
    }

    #[test]
    fn test_ubo_flag_is_binary() {
        let mut two = ubo(DisclosureStatus::Missing);
        two.extend(ubo(DisclosureStatus::Missing));
        assert_eq!(aggregate(&[], &[], &[], &ubo(DisclosureStatus::Missing)).score, 10);
        assert_eq!(aggregate(&[], &[], &[], &two).score, 10);
        assert_eq!(aggregate(&[], &[], &[], &ubo(DisclosureStatus::Filed)).score, 0);
    }

    #[test]
    fn test_explanation_order_and_deltas() {
        let a = aggregate(
            &news(1),
            &sanctions(1),
            &registry(RegistryStatus::NonCompliant),
            &ubo(DisclosureStatus::Missing),
        );
        let trail: Vec<(Signal, u32)> = a.explanation.iter().map(|c| (c.signal, c.delta)).collect();
        assert_eq!(
            trail,
            vec![
                (Signal::News, 10),
                (Signal::Sanctions, 50),
                (Signal::Registry, 20),
                (Signal::Ubo, 10),
            ]
        );
        assert_eq!(a.score, 90);
        assert!(a.explanation[0].rationale.contains("fraud"));
    }

    #[test]
    fn test_zero_contributions_are_omitted() {
        let a = aggregate(&[], &sanctions(1), &registry(RegistryStatus::Authorized), &[]);
        assert_eq!(a.explanation.len(), 1);
        assert_eq!(a.explanation[0].signal, Signal::Sanctions);
    }

    // Scenario: company with two adverse headlines and a granted MiCA authorization.
    #[test]
    fn test_company_with_adverse_news_and_granted_license() {
        let mut hits = news(2);
        hits[0].risk_score = Some(70.0);
        hits[1].risk_score = Some(80.0);
        let mut reg = registry(RegistryStatus::Authorized);
        reg[0].status_raw = "Granted".to_string();

        let a = aggregate(&hits, &[], &reg, &[]);
        assert_eq!(a.score, 20);
        assert_eq!(a.tier, RiskTier::Low);
    }

    #[test]
    fn test_person_with_single_sanctions_hit() {
        let a = aggregate(&[], &sanctions(1), &[], &[]);
        assert_eq!(a.score, 50);
        assert_eq!(a.tier, RiskTier::Moderate);
    }

    #[test]
    fn test_wallet_pending_registry_and_missing_ubo_stays_low() {
        let a = aggregate(
            &[],
            &[],
            &registry(RegistryStatus::Pending),
            &ubo(DisclosureStatus::Missing),
        );
        assert_eq!(a.score, 30);
        assert_eq!(a.tier, RiskTier::Low);
    }

    #[test]
    fn test_everything_flagged_clamps_to_hundred() {
        let a = aggregate(
            &news(5),
            &sanctions(2),
            &registry(RegistryStatus::NonCompliant),
            &ubo(DisclosureStatus::Missing),
        );
        let raw_sum: u32 = a.explanation.iter().map(|c| c.delta).sum();
        assert_eq!(raw_sum, 160);
        assert_eq!(a.score, 100);
        assert_eq!(a.tier, RiskTier::High);
        assert!(a.explanation[0].rationale.contains("capped at 30"));
    }

    #[test]
    fn test_idempotent_serialization() {
        let inputs = (
            news(2),
            sanctions(1),
            registry(RegistryStatus::Pending),
            ubo(DisclosureStatus::Missing),
        );
        let a = aggregate(&inputs.0, &inputs.1, &inputs.2, &inputs.3);
        let b = aggregate(&inputs.0, &inputs.1, &inputs.2, &inputs.3);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    fn status_strategy() -> impl Strategy<Value = RegistryStatus> {
        prop_oneof![
            Just(RegistryStatus::Authorized),
            Just(RegistryStatus::Pending),
            Just(RegistryStatus::NonCompliant),
            Just(RegistryStatus::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn prop_score_bounded_and_tier_consistent(
            n_news in 0usize..40,
            n_sanctions in 0usize..6,
            statuses in proptest::collection::vec(status_strategy(), 0..4),
            missing in proptest::collection::vec(any::<bool>(), 0..3),
        ) {
            let reg: Vec<RegistryRecord> = statuses.iter().flat_map(|s| registry(*s)).collect();
            let owners: Vec<UboRecord> = missing
                .iter()
                .flat_map(|m| ubo(if *m { DisclosureStatus::Missing } else { DisclosureStatus::Filed }))
                .collect();

            let a = aggregate(&news(n_news), &sanctions(n_sanctions), &reg, &owners);
            prop_assert!(a.score <= 100);
            prop_assert_eq!(a.tier, tier_for(a.score));
            prop_assert!(a.explanation.iter().all(|c| c.delta > 0));

            let expected = (n_news as u32 * 10).min(30)
                + (n_sanctions as u32 * 50).min(100)
                + if statuses.iter().any(|s| *s != RegistryStatus::Authorized) { 20 } else { 0 }
                + if missing.iter().any(|m| *m) { 10 } else { 0 };
            prop_assert_eq!(a.score, expected.min(100));
        }

        #[test]
        fn prop_news_monotone(n in 0usize..20) {
            let lower = aggregate(&news(n), &[], &[], &[]).score;
            let upper = aggregate(&news(n + 1), &[], &[], &[]).score;
            prop_assert!(lower <= upper);
        }
    }
}
