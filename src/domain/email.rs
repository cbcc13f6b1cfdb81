//! Email address detection.

use super::{Candidate, EntityKind, EntityMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Email pattern: `local@domain.tld` with an optional second-level suffix,
/// over ASCII word, dot and hyphen characters.
pub const EMAIL_PATTERN: &str =
    r"[A-Za-z0-9_.\-]+@[A-Za-z0-9_.\-]+\.[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)?";

/// Email address matcher. Every pattern hit is accepted.
#[derive(Debug, Clone, Default)]
pub struct EmailMatcher;

impl EmailMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("Valid email regex"));
        &PATTERN
    }
}

impl EntityMatcher for EmailMatcher {
    fn kind(&self) -> EntityKind {
        EntityKind::Email
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<Candidate<'a>> {
        Self::regex()
            .find_iter(text)
            .map(|m| Candidate {
                offset: m.start(),
                text: m.as_str(),
            })
            .collect()
    }

    fn accepts(&self, _candidate: &str) -> bool {
        true
    }
}
