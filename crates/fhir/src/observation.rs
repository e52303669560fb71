//! FHIR Observation summarising a research study (one Terra workspace).
//!
//! The observation focuses on the ResearchStudy with the same slug and always carries three
//! components, in order: sample count, participant count and storage size.

use crate::datatypes::{CodeableConcept, Coding, Quantity, Reference, UCUM_SYSTEM};
use crate::identifier::make_identifier;
use crate::{FhirError, FhirResult};
use serde::Serialize;

const NCBI_SYSTEM: &str = "https://www.ncbi.nlm.nih.gov/fhir";

/// Domain-level carrier for a study summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudySummaryData {
    /// Workspace identifier; slugged into the observation id and focus reference.
    pub workspace_id: String,

    pub sample_count: usize,

    pub participant_count: usize,

    /// Sum of all blob sizes in the workspace.
    pub storage_size: u64,

    /// UCUM code reported for `storage_size`.
    pub storage_size_unit: String,
}

/// Research study observation operations.
pub struct ResearchStudyObservation;

impl ResearchStudyObservation {
    pub const RESOURCE_TYPE: &'static str = "Observation";

    pub fn build_entity(data: &StudySummaryData) -> ObservationResource {
        let slug = make_identifier(&[&data.workspace_id]);

        ObservationResource {
            resource_type: Self::RESOURCE_TYPE,
            focus: vec![Reference::to("ResearchStudy", &slug)],
            id: slug,
            status: "final",
            code: CodeableConcept {
                coding: vec![Coding::new(Some(NCBI_SYSTEM), "Summary", "Variable Summary")],
                text: None,
            },
            component: vec![
                Component {
                    code: coded(Some(NCBI_SYSTEM), "SampleCount", "Number of Samples"),
                    value: ComponentValue::Integer(data.sample_count as u64),
                },
                Component {
                    code: coded(Some(NCBI_SYSTEM), "Participant", "Number of Participants"),
                    value: ComponentValue::Integer(data.participant_count as u64),
                },
                Component {
                    code: coded(None, "StorageSize", "Size on Disk"),
                    value: ComponentValue::Quantity(Quantity {
                        value: data.storage_size,
                        unit: None,
                        system: Some(UCUM_SYSTEM.to_string()),
                        code: Some(data.storage_size_unit.clone()),
                    }),
                },
            ],
        }
    }

    /// Renders an Observation as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render(resource: &ObservationResource) -> FhirResult<String> {
        serde_json::to_string(resource)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise observation: {e}")))
    }
}

/// Wire representation of an Observation resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObservationResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,

    pub id: String,

    pub status: &'static str,

    pub code: CodeableConcept,

    pub focus: Vec<Reference>,

    pub component: Vec<Component>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Component {
    pub code: CodeableConcept,

    #[serde(flatten)]
    pub value: ComponentValue,
}

/// The `value[x]` choice of an observation component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ComponentValue {
    #[serde(rename = "valueInteger")]
    Integer(u64),
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
}

fn coded(system: Option<&str>, code: &str, display: &str) -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding::new(system, code, display)],
        text: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary() -> StudySummaryData {
        StudySummaryData {
            workspace_id: "AnVIL_CCDG_Broad_Example".into(),
            sample_count: 3,
            participant_count: 2,
            storage_size: 4096,
            storage_size_unit: "L".into(),
        }
    }

    #[test]
    fn renders_three_components_in_order() {
        let value = serde_json::to_value(ResearchStudyObservation::build_entity(&summary()))
            .expect("serialize");

        assert_eq!(value["resourceType"], "Observation");
        assert_eq!(value["id"], "anvil-ccdg-broad-example");
        assert_eq!(value["status"], "final");
        assert_eq!(
            value["focus"],
            json!([{"reference": "ResearchStudy/anvil-ccdg-broad-example"}])
        );
        assert_eq!(
            value["code"],
            json!({"coding": [{"system": NCBI_SYSTEM, "code": "Summary", "display": "Variable Summary"}]})
        );

        let components = value["component"].as_array().expect("component array");
        assert_eq!(components.len(), 3);
        assert_eq!(components[0]["code"]["coding"][0]["code"], "SampleCount");
        assert_eq!(components[0]["valueInteger"], 3);
        assert_eq!(components[1]["code"]["coding"][0]["code"], "Participant");
        assert_eq!(components[1]["valueInteger"], 2);
        assert_eq!(
            components[2],
            json!({
                "code": {"coding": [{"code": "StorageSize", "display": "Size on Disk"}]},
                "valueQuantity": {"value": 4096, "system": UCUM_SYSTEM, "code": "L"}
            })
        );
    }

    #[test]
    fn storage_unit_comes_from_input() {
        let mut data = summary();
        data.storage_size_unit = "By".into();
        let value = serde_json::to_value(ResearchStudyObservation::build_entity(&data))
            .expect("serialize");
        assert_eq!(value["component"][2]["valueQuantity"]["code"], "By");
    }

    #[test]
    fn empty_workspace_reports_zeroes() {
        let data = StudySummaryData {
            workspace_id: "empty".into(),
            sample_count: 0,
            participant_count: 0,
            storage_size: 0,
            storage_size_unit: "L".into(),
        };
        let rendered =
            ResearchStudyObservation::render(&ResearchStudyObservation::build_entity(&data))
                .expect("render");
        assert!(rendered.contains("\"valueInteger\":0"));
        assert!(rendered.contains("\"value\":0"));
    }
}
