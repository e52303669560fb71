//! FHIR Patient builder for normalised subjects.
//!
//! Responsibilities:
//! - Map normalised subject demographics onto a Patient resource
//! - Derive the Patient id the same way DocumentReference derives its `subject` reference
//!
//! Notes:
//! - Raw gender text is mapped onto FHIR administrative gender
//! - Ethnicity and age travel as extensions; both are omitted when unknown

use crate::datatypes::{Extension, ExtensionValue, Identifier, Quantity, UCUM_SYSTEM};
use crate::identifier::make_identifier;
use crate::{FhirError, FhirResult, UNIQUE_STRING_SYSTEM};
use serde::Serialize;

const ETHNICITY_URL: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity";
const AGE_AT_EVENT_URL: &str = "http://fhir.kids-first.io/StructureDefinition/age-at-event";

// ============================================================================
// Public domain-level types
// ============================================================================

/// FHIR administrative gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Convert to FHIR wire format string.
    fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    /// Map raw source text onto an administrative gender.
    ///
    /// Matching is case-insensitive. Any value that is not recognised maps to `Other`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => AdministrativeGender::Male,
            "female" | "f" => AdministrativeGender::Female,
            "unknown" => AdministrativeGender::Unknown,
            _ => AdministrativeGender::Other,
        }
    }
}

/// Domain-level carrier for a normalised subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    /// Workspace the subject belongs to.
    pub study_id: String,

    /// Cohort-specific subject id.
    pub subject_id: String,

    /// Raw gender text, if known.
    pub gender: Option<String>,

    /// Canonical ethnicity token (or passthrough text), if known.
    pub ethnicity: Option<String>,

    /// Age in years, if known.
    pub age: Option<u32>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
pub struct Patient;

impl Patient {
    pub const RESOURCE_TYPE: &'static str = "Patient";

    /// Builds a Patient resource.
    ///
    /// `identifier_base` is the system prefix for the workspace-scoped identifier.
    pub fn build_entity(data: &PatientData, identifier_base: &str) -> PatientResource {
        let id = make_identifier(&[&data.study_id, &data.subject_id]);

        let mut extension = Vec::new();
        if let Some(ethnicity) = &data.ethnicity {
            extension.push(Extension::simple(
                ETHNICITY_URL,
                ExtensionValue::String(ethnicity.clone()),
            ));
        }
        if let Some(age) = data.age {
            extension.push(Extension::simple(
                AGE_AT_EVENT_URL,
                ExtensionValue::Age(Quantity {
                    value: u64::from(age),
                    unit: Some("a".to_string()),
                    system: Some(UCUM_SYSTEM.to_string()),
                    code: Some("a".to_string()),
                }),
            ));
        }

        PatientResource {
            resource_type: Self::RESOURCE_TYPE,
            identifier: vec![
                Identifier {
                    system: format!("{identifier_base}/{}", data.study_id),
                    value: data.subject_id.clone(),
                },
                Identifier {
                    system: UNIQUE_STRING_SYSTEM.to_string(),
                    value: id.clone(),
                },
            ],
            id,
            extension,
            gender: data
                .gender
                .as_deref()
                .map(|raw| AdministrativeGender::from_raw(raw).to_wire()),
        }
    }

    /// Renders a Patient as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render(resource: &PatientResource) -> FhirResult<String> {
        serde_json::to_string(resource)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of a Patient resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,

    pub id: String,

    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'static str>,
}
