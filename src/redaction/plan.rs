//! Redaction planning: which strings get masked, and with what.

use crate::domain::{DetectedEntities, EntityKind};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

/// Replacement author used by the reference-code policy for metadata.
pub const ANONYMOUS_AUTHOR: &str = "[ANONYMOUS AUTHOR]";

/// Star count used for an author whose length cannot be determined.
pub const DEFAULT_AUTHOR_MASK_LEN: usize = 10;

/// Character used by the fixed-length policy.
pub const MASK_CHAR: char = '*';

/// How mask text is derived from the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskPolicy {
    /// `[KIND_n]`, numbered by first-seen order within the kind.
    ReferenceCode,
    /// A run of `*` as long as the original, preserving its footprint.
    FixedLength,
}

impl MaskPolicy {
    /// Mask for the `position`-th (1-based) entity of `kind`.
    pub fn mask(self, kind: EntityKind, position: usize, original: &str) -> String {
        match self {
            Self::ReferenceCode => format!("[{}_{}]", kind.reference_tag(), position),
            Self::FixedLength => stars(original.chars().count()),
        }
    }

    /// Replacement for the document's author metadata field.
    pub fn author_mask(self, original: &str) -> String {
        match self {
            Self::ReferenceCode => ANONYMOUS_AUTHOR.to_string(),
            Self::FixedLength => {
                let len = original.chars().count();
                stars(if len == 0 { DEFAULT_AUTHOR_MASK_LEN } else { len })
            }
        }
    }
}

fn stars(len: usize) -> String {
    std::iter::repeat(MASK_CHAR).take(len).collect()
}

/// Which entity kinds the caller wants anonymized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindSelection {
    pub names: bool,
    pub emails: bool,
    pub institutions: bool,
}

impl Default for KindSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl KindSelection {
    pub fn all() -> Self {
        Self {
            names: true,
            emails: true,
            institutions: true,
        }
    }

    pub fn none() -> Self {
        Self {
            names: false,
            emails: false,
            institutions: false,
        }
    }

    pub fn is_enabled(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Name => self.names,
            EntityKind::Email => self.emails,
            EntityKind::Institution => self.institutions,
        }
    }
}

/// One planned substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement<'a> {
    pub kind: EntityKind,
    pub original: &'a str,
    pub mask: &'a str,
}

/// `kind -> (original -> mask)`, for enabled kinds only.
///
/// Iteration order is fixed when the mapping is built: kinds in
/// name/email/institution order, entities in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementMapping {
    policy: MaskPolicy,
    selection: KindSelection,
    entries: IndexMap<EntityKind, IndexMap<String, String>>,
}

impl ReplacementMapping {
    pub fn empty(policy: MaskPolicy, selection: KindSelection) -> Self {
        Self {
            policy,
            selection,
            entries: IndexMap::new(),
        }
    }

    pub fn policy(&self) -> MaskPolicy {
        self.policy
    }

    pub fn is_enabled(&self, kind: EntityKind) -> bool {
        self.selection.is_enabled(kind)
    }

    pub fn insert(&mut self, kind: EntityKind, original: impl Into<String>, mask: impl Into<String>) {
        self.entries
            .entry(kind)
            .or_default()
            .insert(original.into(), mask.into());
    }

    pub fn kind(&self, kind: EntityKind) -> Option<&IndexMap<String, String>> {
        self.entries.get(&kind)
    }

    /// Mask assigned to `original` under `kind`, if any.
    pub fn mask_for(&self, kind: EntityKind, original: &str) -> Option<&str> {
        self.entries
            .get(&kind)
            .and_then(|m| m.get(original))
            .map(String::as_str)
    }

    pub fn replacements(&self) -> impl Iterator<Item = Replacement<'_>> {
        self.entries.iter().flat_map(|(kind, pairs)| {
            pairs.iter().map(move |(original, mask)| Replacement {
                kind: *kind,
                original: original.as_str(),
                mask: mask.as_str(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a [`ReplacementMapping`] from detected entities.
#[derive(Debug, Clone, Copy)]
pub struct RedactionPlanner {
    policy: MaskPolicy,
}

impl RedactionPlanner {
    pub fn new(policy: MaskPolicy) -> Self {
        Self { policy }
    }

    pub fn plan(&self, entities: &DetectedEntities, selection: KindSelection) -> ReplacementMapping {
        let mut mapping = ReplacementMapping::empty(self.policy, selection);

        for kind in EntityKind::ALL {
            if !selection.is_enabled(kind) {
                continue;
            }
            let set = entities.get(kind);
            for (idx, original) in set.iter().enumerate() {
                mapping.insert(kind, original, self.policy.mask(kind, idx + 1, original));
            }
            info!(kind = %kind, masks = set.len(), policy = ?self.policy, "masks planned");
        }

        mapping
    }
}
