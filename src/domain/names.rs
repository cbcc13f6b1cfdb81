//! Author-name detection.
//!
//! Names are found by an ordered battery of rules: labeled fields such as
//! `Author: ...` whose value is split into a list, and shape rules such as
//! two capitalized words, `X et al.`, `X and Y` and middle-initial forms.

use super::{capture_candidates, char_len, trimmed, Candidate, EntityKind, EntityMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// How a rule's capture is turned into candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleShape {
    /// The capture is a list of names (`John Smith, Jane Doe and ...`).
    LabeledList,
    /// The capture is one candidate.
    Single,
}

/// One entry of the name battery.
#[derive(Debug, Clone, Copy)]
pub struct NameRule {
    pub label: &'static str,
    pub pattern: &'static str,
    pub shape: RuleShape,
}

/// The name battery, applied in this order.
pub const NAME_RULES: &[NameRule] = &[
    NameRule {
        label: "author-field",
        pattern: r"\b(?:Authors|Author|Yazarlar|Yazar)\b:?\s*([\w\s,\.]+)",
        shape: RuleShape::LabeledList,
    },
    NameRule {
        label: "name-field",
        pattern: r"\b(?:İsim|Soyad|Ad)[\s:]+([\w\s]+)",
        shape: RuleShape::LabeledList,
    },
    NameRule {
        label: "two-word-affiliated",
        pattern: r"([A-Z][a-z]+\s+[A-Z][a-z]+)(?:\s*,\s*\d)?",
        shape: RuleShape::Single,
    },
    NameRule {
        label: "surname-initial",
        pattern: r"([A-Z][a-z]+\s+[A-Z]\.)\s",
        shape: RuleShape::Single,
    },
    NameRule {
        label: "two-word-hyphenated",
        pattern: r"([A-Z][a-z]+\s+[A-Z][a-z\-]+)",
        shape: RuleShape::Single,
    },
    NameRule {
        label: "middle-initial",
        pattern: r"([A-Z][a-z]+\s+[A-Z]\.\s+[A-Z][a-z]+)",
        shape: RuleShape::Single,
    },
    NameRule {
        label: "et-al",
        pattern: r"([A-Z][a-z]+\s+et\s+al\.)",
        shape: RuleShape::Single,
    },
    NameRule {
        label: "and-pair",
        pattern: r"([A-Z][a-z]+\s+and\s+[A-Z][a-z]+)",
        shape: RuleShape::Single,
    },
];

/// Words that mark a capitalized pair as an organization rather than a person.
pub const ORGANIZATION_WORDS: &[&str] = &[
    "University",
    "Üniversitesi",
    "Institute",
    "Enstitüsü",
    "College",
    "Department",
    "Bölümü",
    "Faculty",
    "Fakültesi",
    "Laboratory",
    "Laboratuvarı",
    "Center",
    "Centre",
    "Merkezi",
    "Corporation",
    "Company",
    "Inc",
    "Ltd",
];

/// Author-name matcher.
#[derive(Debug, Clone, Default)]
pub struct NameMatcher;

impl NameMatcher {
    pub fn new() -> Self {
        Self
    }

    fn rules() -> &'static [(NameRule, Regex)] {
        static RULES: Lazy<Vec<(NameRule, Regex)>> = Lazy::new(|| {
            NAME_RULES
                .iter()
                .map(|rule| (*rule, Regex::new(rule.pattern).expect("Valid name regex")))
                .collect()
        });
        &RULES
    }

    /// Splits a labeled-field value into its individual names.
    ///
    /// Separators are commas, semicolons, line breaks, the conjunctions
    /// `and`/`ve`, and a period that ends a word of two or more letters
    /// (so `J. Smith` stays whole).
    pub fn split_list(value: &str, base: usize) -> Vec<Candidate<'_>> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut prev_lower_run = 0usize;
        let mut iter = value.char_indices().peekable();

        while let Some((idx, ch)) = iter.next() {
            let boundary = match ch {
                ',' | ';' | '\n' | '\r' => Some(idx + ch.len_utf8()),
                '.' if prev_lower_run >= 2 => Some(idx + 1),
                _ => None,
            };

            if ch.is_lowercase() {
                prev_lower_run += 1;
            } else if ch.is_alphabetic() {
                prev_lower_run = 1;
            } else {
                prev_lower_run = 0;
            }

            if let Some(next) = boundary {
                pieces.push((start, idx));
                start = next;
                continue;
            }

            if ch.is_whitespace() {
                for conj in [" and ", " ve "] {
                    if value[idx..].starts_with(conj) {
                        pieces.push((start, idx));
                        start = idx + conj.len();
                        for _ in 0..conj.chars().count() - 1 {
                            iter.next();
                        }
                        prev_lower_run = 0;
                        break;
                    }
                }
            }
        }
        pieces.push((start, value.len()));

        pieces
            .into_iter()
            .filter(|(s, e)| s < e)
            .filter_map(|(s, e)| trimmed(value, s, e))
            .map(|c| Candidate {
                offset: base + c.offset,
                text: c.text,
            })
            .collect()
    }

    fn is_organization(candidate: &str) -> bool {
        candidate
            .split(|c: char| c.is_whitespace() || c == '.' || c == ',')
            .any(|word| ORGANIZATION_WORDS.contains(&word))
    }
}

impl EntityMatcher for NameMatcher {
    fn kind(&self) -> EntityKind {
        EntityKind::Name
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<Candidate<'a>> {
        let mut out = Vec::new();
        for (rule, pattern) in Self::rules() {
            match rule.shape {
                RuleShape::Single => out.extend(capture_candidates(pattern, text)),
                RuleShape::LabeledList => {
                    for caps in pattern.captures_iter(text) {
                        if let Some(m) = caps.get(1) {
                            out.extend(Self::split_list(m.as_str(), m.start()).into_iter().map(
                                |c| Candidate {
                                    offset: c.offset,
                                    text: &text[c.offset..c.offset + c.text.len()],
                                },
                            ));
                        }
                    }
                }
            }
        }
        out
    }

    fn accepts(&self, candidate: &str) -> bool {
        candidate.contains(' ')
            && char_len(candidate) > 4
            && !Self::is_organization(candidate)
    }
}
