//! Whole-document entity detection.

use super::{
    EmailMatcher, EntityKind, EntityMatcher, EntitySet, InstitutionMatcher, NameMatcher,
};
use tracing::{debug, info, warn};

/// The three entity sets found in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEntities {
    pub names: EntitySet,
    pub emails: EntitySet,
    pub institutions: EntitySet,
}

impl DetectedEntities {
    pub fn empty() -> Self {
        Self {
            names: EntitySet::new(EntityKind::Name),
            emails: EntitySet::new(EntityKind::Email),
            institutions: EntitySet::new(EntityKind::Institution),
        }
    }

    pub fn get(&self, kind: EntityKind) -> &EntitySet {
        match kind {
            EntityKind::Name => &self.names,
            EntityKind::Email => &self.emails,
            EntityKind::Institution => &self.institutions,
        }
    }

    pub fn total(&self) -> usize {
        self.names.len() + self.emails.len() + self.institutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Runs the name, email and institution batteries over concatenated text.
///
/// Detection is high-recall: false positives are expected and are filtered
/// later by length thresholds and protected sections. It never fails.
#[derive(Debug, Clone, Default)]
pub struct EntityDetector {
    names: NameMatcher,
    emails: EmailMatcher,
    institutions: InstitutionMatcher,
}

impl EntityDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, text: &str) -> DetectedEntities {
        let detected = DetectedEntities {
            names: self.names.extract(text),
            emails: self.emails.extract(text),
            institutions: self.institutions.extract(text),
        };

        for kind in EntityKind::ALL {
            for entity in detected.get(kind).entities() {
                debug!(kind = %entity.kind, text = %entity.text, "entity detected");
            }
        }
        info!(
            names = detected.names.len(),
            emails = detected.emails.len(),
            institutions = detected.institutions.len(),
            "entity detection finished"
        );
        if detected.is_empty() {
            warn!("no identifying entities detected");
        }

        detected
    }
}
