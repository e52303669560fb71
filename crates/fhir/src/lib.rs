//! FHIR wire support for AnVIL reconciliation.
//!
//! This crate provides **wire models** and **builders** for the FHIR R4 resources generated
//! from Terra workspaces:
//! - `DocumentReference` for genomic files
//! - `Observation` summarising a research study
//! - `Patient` for normalised subjects
//!
//! This crate focuses on:
//! - FHIR JSON shape (field names and nesting are the contract with downstream consumers)
//! - deterministic resource identifiers
//! - translation from domain-level carriers to wire structs
//!
//! It knows nothing about Terra or cohorts; `anvil-core` fills the domain-level carriers.

pub mod datatypes;
pub mod document_reference;
pub mod identifier;
pub mod observation;
pub mod patient;

// Re-export facades
pub use document_reference::DocumentReference;
pub use observation::ResearchStudyObservation;
pub use patient::Patient;

// Re-export public domain-level and wire types
pub use document_reference::{data_type_concept, DocumentReferenceResource, GenomicFileData};
pub use identifier::{join, make_identifier};
pub use observation::{ObservationResource, StudySummaryData};
pub use patient::{AdministrativeGender, PatientData, PatientResource};

/// Identifier system for the globally unique slug of a generated resource.
pub const UNIQUE_STRING_SYSTEM: &str = "urn:anvil:unique-string";

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
