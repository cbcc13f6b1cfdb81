//! Authorship anonymization for academic paper PDFs.
//!
//! Detects author names, email addresses and institutional affiliations in a
//! paper and masks them, leaving protected sections (references,
//! acknowledgments, related work, ...) untouched so the paper stays
//! readable for double-blind review.
//!
//! # Features
//!
//! - **Heuristic detection**: pattern batteries for names, emails and
//!   institutions in English and Turkish
//! - **Protected sections**: reference lists and similar sections are
//!   never redacted, by text offset or by page geometry
//! - **Two backends**: content-stream byte substitution (lopdf) or
//!   cover-and-stamp overlays located with MuPDF
//! - **Two mask policies**: reference codes (`[AUTHOR_1]`) or same-length stars
//!
//! # Architecture
//!
//! - [`domain`]: entity detection and protected-section location
//! - [`document`]: document session traits and their lopdf/MuPDF implementations
//! - [`redaction`]: planning, appliers and the service layer
//! - [`report`]: serializable extraction report
//! - [`config`]: process-wide runtime settings
//! - [`error`]: error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use paper_anonymizer::{AnonymizationService, AnonymizeOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input = std::fs::read("paper.pdf")?;
//! let service = AnonymizationService::with_overlay();
//!
//! let output = service.anonymize(&input, &AnonymizeOptions::default())?;
//! std::fs::write("paper.anon.pdf", &output.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Detection only
//!
//! ```
//! use paper_anonymizer::EntityDetector;
//!
//! let entities = EntityDetector::new()
//!     .detect("Author: John Smith, Jane Doe. Contact: john.smith@university.edu.");
//! assert_eq!(entities.names.to_vec(), vec!["John Smith", "Jane Doe"]);
//! assert!(entities.emails.contains("john.smith@university.edu"));
//! ```

// Public API
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod redaction;
pub mod report;

// Re-exports for convenient access
pub use domain::{DetectedEntities, EntityDetector, EntityKind, ExcludedRegions};
pub use error::{AnonymizerError, AnonymizerResult};
pub use redaction::{
    AnonymizationOutput, AnonymizationService, AnonymizeOptions, Backend, FailureMode,
    MaskPolicy, RedactionPlanner, RedactionResult, ReplacementMapping,
};
pub use report::ExtractionReport;
