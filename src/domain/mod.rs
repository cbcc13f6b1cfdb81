//! Domain models and business logic for identifying-entity detection.
//!
//! This module holds the pattern batteries that find author names, email
//! addresses and institutions in paper text, and the protected-section
//! tables that keep reference lists and similar sections untouched.

pub mod detector;
pub mod email;
pub mod institution;
pub mod names;
pub mod sections;

pub use detector::{DetectedEntities, EntityDetector};
pub use email::EmailMatcher;
pub use institution::InstitutionMatcher;
pub use names::NameMatcher;
pub use sections::{
    ExcludedRegions, GeometricSectionLocator, PageRegion, TextRegion, TextSectionLocator,
};

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// The three kinds of identifying entity the detector looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Name,
    Email,
    Institution,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Name, Self::Email, Self::Institution];

    /// Tag used by the reference-code mask policy (`[AUTHOR_1]`, ...).
    pub fn reference_tag(self) -> &'static str {
        match self {
            Self::Name => "AUTHOR",
            Self::Email => "EMAIL",
            Self::Institution => "INSTITUTION",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Institution => "institution",
        };
        f.write_str(name)
    }
}

/// A single detected entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DetectedEntity {
    pub text: String,
    pub kind: EntityKind,
}

/// Entities of one kind, deduplicated by exact string and kept in the order
/// they were first seen in the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    kind: EntityKind,
    items: IndexSet<String>,
}

impl EntitySet {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: IndexSet::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Inserts `text`, returning false if it was already present.
    pub fn insert(&mut self, text: impl Into<String>) -> bool {
        self.items.insert(text.into())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.items.contains(text)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in first-seen order. This order is what reference codes are
    /// numbered by.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// 1-based position of `text` in first-seen order.
    pub fn position(&self, text: &str) -> Option<usize> {
        self.items.get_index_of(text).map(|i| i + 1)
    }

    pub fn entities(&self) -> impl Iterator<Item = DetectedEntity> + '_ {
        self.items.iter().map(move |text| DetectedEntity {
            text: text.clone(),
            kind: self.kind,
        })
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }
}

/// A raw pattern hit before acceptance filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// Byte offset of the candidate in the searched text.
    pub offset: usize,
    pub text: &'a str,
}

/// Trait for entity detection strategies.
///
/// Implementors supply raw candidates and an acceptance rule; the provided
/// [`EntityMatcher::extract`] orders accepted candidates by text position and
/// deduplicates them.
pub trait EntityMatcher: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Raw candidates from every rule of the battery, in rule order.
    fn candidates<'a>(&self, text: &'a str) -> Vec<Candidate<'a>>;

    /// Acceptance filter applied to each trimmed candidate.
    fn accepts(&self, candidate: &str) -> bool;

    fn extract(&self, text: &str) -> EntitySet {
        let mut candidates: Vec<Candidate<'_>> = self
            .candidates(text)
            .into_iter()
            .filter(|c| self.accepts(c.text))
            .collect();
        // Stable sort keeps rule order for candidates starting at the same offset.
        candidates.sort_by_key(|c| c.offset);

        let mut set = EntitySet::new(self.kind());
        for candidate in candidates {
            if set.insert(candidate.text) {
                tracing::debug!(kind = %self.kind(), entity = candidate.text, "detected entity");
            }
        }
        set
    }
}

/// Collects capture group 1 of every match of `pattern`, trimmed.
pub(crate) fn capture_candidates<'a>(pattern: &Regex, text: &'a str) -> Vec<Candidate<'a>> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| trimmed(text, m.start(), m.end()))
        .collect()
}

/// Trims whitespace from `text[start..end]`, keeping the offset accurate.
pub(crate) fn trimmed(text: &str, start: usize, end: usize) -> Option<Candidate<'_>> {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let value = slice.trim();
    if value.is_empty() {
        None
    } else {
        Some(Candidate {
            offset: start + leading,
            text: value,
        })
    }
}

/// Number of characters (not bytes) in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
