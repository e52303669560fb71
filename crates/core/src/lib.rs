//! # AnVIL Core
//!
//! Core reconciliation logic for AnVIL workspaces.
//!
//! This crate contains pure data operations:
//! - Terra workspace export model and loading
//! - Cohort detection and subject normalisation (id, age, gender, ethnicity)
//! - Translation of workspaces into FHIR resources via the `fhir` crate
//! - NDJSON output of generated resources
//!
//! **No transport concerns**: fetching from Terra, submitting to a FHIR server and process
//! configuration belong in the binaries.

pub mod cohort;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod subject;
pub mod terra;
pub mod transform;

pub use cohort::Cohort;
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use output::write_ndjson;
pub use subject::{subject_factory, Ethnicity, Subject};
pub use terra::{Blob, BlobRecord, Sample, SamplesBySubject, SubjectRecord, Workspace};
pub use transform::{
    document_reference, patient, research_study_observation, transform_workspace,
    TransformOutput,
};
