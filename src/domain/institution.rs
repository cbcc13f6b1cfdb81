//! Institution and affiliation detection.
//!
//! Two batteries: university-name shapes (English and Turkish) and other
//! organization kinds (institutes, faculties, departments, laboratories,
//! research centers, companies).

use super::{capture_candidates, char_len, Candidate, EntityKind, EntityMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// University-name shapes.
pub const UNIVERSITY_PATTERNS: &[&str] = &[
    r"(\w+\s+Üniversitesi)",
    r"(\w+\s+University)",
    r"(İstanbul\s+\w+\s+Üniversitesi)",
    r"(Kocaeli\s+\w+\s+Üniversitesi)",
    r"(University\s+of\s+\w+)",
    r"(\w+\s+Institute\s+of\s+Technology)",
    r"(\w+\s+College)",
];

/// Other organization shapes.
pub const ORGANIZATION_PATTERNS: &[&str] = &[
    r"([\w\s]+\s+Enstitüsü)",
    r"([\w\s]+\s+Fakültesi)",
    r"([\w\s]+\s+Bölümü)",
    r"([\w\s]+\s+Laboratuvarı)",
    r"([\w\s]+\s+Institute)",
    r"(Faculty\s+of\s+\w+)",
    r"([\w\s]+\s+Department)",
    r"(Department\s+of\s+\w+(?:\s+\w+)?)",
    r"([\w\s]+\s+Laboratory)",
    r"([\w\s]+\s+Araştırma Merkezi)",
    r"([\w\s]+\s+Research Center)",
    r"([\w\s]+\s+Corporation)",
    r"([\w\s]+\s+Inc\.)",
    r"([\w\s]+\s+Ltd\.)",
    r"([\w\s&]+\s+Company)",
];

/// Institution matcher.
#[derive(Debug, Clone, Default)]
pub struct InstitutionMatcher;

impl InstitutionMatcher {
    pub fn new() -> Self {
        Self
    }

    fn patterns() -> &'static [Regex] {
        static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
            UNIVERSITY_PATTERNS
                .iter()
                .chain(ORGANIZATION_PATTERNS)
                .map(|p| Regex::new(p).expect("Valid institution regex"))
                .collect()
        });
        &PATTERNS
    }
}

impl EntityMatcher for InstitutionMatcher {
    fn kind(&self) -> EntityKind {
        EntityKind::Institution
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<Candidate<'a>> {
        Self::patterns()
            .iter()
            .flat_map(|pattern| capture_candidates(pattern, text))
            .collect()
    }

    fn accepts(&self, candidate: &str) -> bool {
        char_len(candidate) > 5
    }
}
