use crate::config::StatusRule;
use crate::models::RegistryStatus;

/// Map a registry's free-text authorization status through the ordered rule table.
///
/// Matching is a case-insensitive substring test; the first rule that matches
/// wins. Text that matches no rule (including empty text) is [`RegistryStatus::Unknown`].
pub fn map_status(raw: &str, rules: &[StatusRule]) -> RegistryStatus {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return RegistryStatus::Unknown;
    }

    rules
        .iter()
        .find(|rule| {
            let pattern = rule.pattern.trim().to_lowercase();
            !pattern.is_empty() && lower.contains(&pattern)
        })
        .map(|rule| rule.status)
        .unwrap_or(RegistryStatus::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_status_rules;

    fn map(raw: &str) -> RegistryStatus {
        map_status(raw, &default_status_rules())
    }

    #[test]
    fn test_authorized_phrasings() {
        assert_eq!(map("Authorised"), RegistryStatus::Authorized);
        assert_eq!(map("Granted"), RegistryStatus::Authorized);
        assert_eq!(map("AUTHORIZED CASP"), RegistryStatus::Authorized);
    }

    #[test]
    fn test_negations_win_over_positive_substrings() {
        assert_eq!(map("Not authorised"), RegistryStatus::NonCompliant);
        assert_eq!(map("Authorisation withdrawn"), RegistryStatus::NonCompliant);
        assert_eq!(map("Deregistered"), RegistryStatus::NonCompliant);
        assert_eq!(map("Non-Compliant"), RegistryStatus::NonCompliant);
        assert_eq!(map("Unregistered"), RegistryStatus::NonCompliant);
        assert_eq!(map("Not registered"), RegistryStatus::NonCompliant);
        assert_eq!(map("Unlicensed"), RegistryStatus::NonCompliant);
        assert_eq!(map("Not licensed"), RegistryStatus::NonCompliant);
        assert_eq!(map("Registered"), RegistryStatus::Authorized);
    }

    #[test]
    fn test_pending() {
        assert_eq!(map("Pending"), RegistryStatus::Pending);
        assert_eq!(map("Application under review"), RegistryStatus::Pending);
    }

    #[test]
    fn test_unmatched_is_unknown() {
        assert_eq!(map(""), RegistryStatus::Unknown);
        assert_eq!(map("Not found"), RegistryStatus::Unknown);
        assert_eq!(map("Lorem ipsum"), RegistryStatus::Unknown);
    }

    #[test]
    fn test_custom_rules() {
        let rules = vec![StatusRule {
            pattern: "lapsed".to_string(),
            status: RegistryStatus::NonCompliant,
        }];
        assert_eq!(map_status("Licence lapsed", &rules), RegistryStatus::NonCompliant);
        assert_eq!(map_status("Granted", &rules), RegistryStatus::Unknown);
    }
}
