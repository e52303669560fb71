//! Workspace to FHIR transformation.
//!
//! Translates Terra domain types into the `fhir` crate's carriers and runs the builders.
//! A whole-workspace run classifies every subject, resolves every blob and summarises the
//! workspace in a single pass.

use crate::cohort::Cohort;
use crate::config::CoreConfig;
use crate::subject::{subject_factory, Subject};
use crate::terra::{Blob, Workspace};
use crate::{CoreError, CoreResult};
use fhir::{
    DocumentReference, DocumentReferenceResource, GenomicFileData, ObservationResource, Patient,
    PatientData, PatientResource, ResearchStudyObservation, StudySummaryData,
};

/// Resources generated from one workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformOutput {
    pub patients: Vec<PatientResource>,
    pub document_references: Vec<DocumentReferenceResource>,
    pub observation: ObservationResource,
    /// Blobs whose sample could not be resolved.
    pub skipped_blobs: usize,
    /// Subjects that resolved to an empty sample list.
    pub subjects_missing_samples: usize,
}

/// Build a DocumentReference for a resolved blob.
pub fn document_reference(blob: &Blob, config: &CoreConfig) -> DocumentReferenceResource {
    let data = GenomicFileData {
        study_id: blob.sample.workspace_name.clone(),
        sample_id: blob.sample.id.clone(),
        subject_id: blob.sample.subject_id.clone(),
        property_name: blob.record.property_name.clone(),
        name: blob.record.name.clone(),
        size: blob.record.size,
        // Workspace exports carry no accession lists.
        acl: None,
    };
    DocumentReference::build_entity(&data, config.identifier_system_base())
}

/// Build the study summary Observation for a workspace.
pub fn research_study_observation(workspace: &Workspace, config: &CoreConfig) -> ObservationResource {
    let data = StudySummaryData {
        workspace_id: workspace.id().to_string(),
        sample_count: workspace.samples.len(),
        participant_count: workspace.subjects.len(),
        storage_size: workspace
            .blob_sizes()
            .values()
            .fold(0u64, |total, size| total.saturating_add(*size)),
        storage_size_unit: config.storage_size_unit().to_string(),
    };
    ResearchStudyObservation::build_entity(&data)
}

/// Build a Patient for a classified subject.
pub fn patient(subject: &Subject, config: &CoreConfig) -> PatientResource {
    let data = PatientData {
        study_id: subject.workspace_name().to_string(),
        subject_id: subject.id().to_string(),
        gender: subject.gender(),
        ethnicity: subject.ethnicity().map(|e| e.to_string()),
        age: subject.age(),
    };
    Patient::build_entity(&data, config.identifier_system_base())
}

/// Transform a whole workspace.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedCohort`] if the workspace name matches no cohort. Blobs
/// with an unknown sample are skipped and counted, not returned as errors.
pub fn transform_workspace(workspace: &Workspace, config: &CoreConfig) -> CoreResult<TransformOutput> {
    let cohort = Cohort::from_workspace_name(workspace.id())?;
    let samples = workspace.samples_by_subject(cohort);

    let mut patients = Vec::with_capacity(workspace.subjects.len());
    let mut subjects_missing_samples = 0;
    for record in &workspace.subjects {
        let subject = subject_factory(record.clone(), workspace.id(), &samples)?;
        if subject.missing_samples() {
            subjects_missing_samples += 1;
        }
        patients.push(patient(&subject, config));
    }
    if subjects_missing_samples > 0 {
        tracing::info!(
            "{} {} of {} subjects have no samples",
            workspace.id(),
            subjects_missing_samples,
            workspace.subjects.len()
        );
    }

    let mut document_references = Vec::with_capacity(workspace.blobs.len());
    let mut skipped_blobs = 0;
    for record in &workspace.blobs {
        match workspace.resolve_blob(record) {
            Ok(blob) => document_references.push(document_reference(&blob, config)),
            Err(CoreError::UnknownSample { blob, sample_id }) => {
                tracing::warn!(
                    "{} skipping blob {}: unknown sample {}",
                    workspace.id(),
                    blob,
                    sample_id
                );
                skipped_blobs += 1;
            }
            Err(other) => return Err(other),
        }
    }

    Ok(TransformOutput {
        patients,
        document_references,
        observation: research_study_observation(workspace, config),
        skipped_blobs,
        subjects_missing_samples,
    })
}
