use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ScanSubject, SubjectKind};

/// XRP Ledger classic address: `r` followed by 24–34 characters of the ripple base58 alphabet.
static XRP_ADDRESS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^r[1-9A-HJ-NP-Za-km-z]{24,34}$").ok());

/// EVM address: `0x` followed by 40 hex digits.
static EVM_ADDRESS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").ok());

/// Classify the raw subject string by shape only; nothing is validated beyond that.
pub fn detect_subject(raw: &str) -> ScanSubject {
    let trimmed = raw.trim();
    let kind = if looks_like_wallet(trimmed) {
        SubjectKind::Wallet
    } else {
        SubjectKind::Entity
    };

    ScanSubject {
        raw: trimmed.to_string(),
        kind,
    }
}

fn looks_like_wallet(s: &str) -> bool {
    if s.contains(char::is_whitespace) {
        return false;
    }
    [&*XRP_ADDRESS, &*EVM_ADDRESS]
        .iter()
        .any(|re| re.as_ref().is_some_and(|re| re.is_match(s)))
}
