//! Extraction report: what detection found, before or instead of redaction.

use crate::document::DocumentMetadata;
use crate::domain::{DetectedEntities, ExcludedRegions};
use crate::error::{AnonymizerError, AnonymizerResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub metadata: DocumentMetadata,
    pub names: Vec<String>,
    pub emails: Vec<String>,
    pub institutions: Vec<String>,
    pub excluded_regions: ExcludedRegions,
}

impl ExtractionReport {
    pub fn new(
        metadata: DocumentMetadata,
        entities: &DetectedEntities,
        excluded_regions: ExcludedRegions,
    ) -> Self {
        Self {
            metadata,
            names: entities.names.to_vec(),
            emails: entities.emails.to_vec(),
            institutions: entities.institutions.to_vec(),
            excluded_regions,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.names.len() + self.emails.len() + self.institutions.len()
    }

    pub fn to_json_pretty(&self) -> AnonymizerResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AnonymizerError::Serialization {
            message: format!("cannot encode report: {}", e),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityDetector, TextRegion, TextSectionLocator};

    #[test]
    fn test_report_json_shape() {
        let entities = EntityDetector::new().detect("Contact: jane@lab.org");
        let report = ExtractionReport::new(
            DocumentMetadata {
                author: Some("Jane Doe".to_string()),
                ..Default::default()
            },
            &entities,
            ExcludedRegions::Text(vec![TextRegion::new(&"x".repeat(20), 4, 20, "references")]),
        );

        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["metadata"]["author"], "Jane Doe");
        assert_eq!(json["emails"][0], "jane@lab.org");
        assert_eq!(json["excludedRegions"][0]["start"], 4);
        assert_eq!(json["excludedRegions"][0]["title"], "references");
    }

    #[test]
    fn test_report_offsets_are_characters() {
        let text = "Çalışma. Giriş\nBu çalışma Ayşe Yılmaz tarafından yapıldı.\n";
        let entities = EntityDetector::new().detect(text);
        let regions = TextSectionLocator::new().locate(text);
        let report = ExtractionReport::new(
            DocumentMetadata::default(),
            &entities,
            ExcludedRegions::Text(regions),
        );

        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        let region = &json["excludedRegions"][0];
        assert_eq!(region["title"], "Giriş");
        assert_eq!(region["start"], 9);
        assert_eq!(region["end"], text.chars().count());
    }
}
