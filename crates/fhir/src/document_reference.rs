//! FHIR DocumentReference builder for genomic files.
//!
//! Each blob found in a workspace bucket becomes one DocumentReference. The resource id is
//! derived from the workspace, the sample and the Terra column the blob was listed under, so
//! the same blob always maps to the same id.
//!
//! Notes:
//! - `type` is looked up in the kids-first data-type table, falling back to free text
//! - optional content elements are omitted, never written as `null`

use crate::datatypes::{
    CodeableConcept, Coding, Extension, ExtensionValue, Identifier, IdentifierValue, Meta,
    Reference,
};
use crate::identifier::{join, make_identifier};
use crate::{FhirError, FhirResult, UNIQUE_STRING_SYSTEM};
use serde::Serialize;

const PROFILE: &str = "http://hl7.org/fhir/StructureDefinition/DocumentReference";
const LARGE_SIZE_URL: &str = "http://fhir.kids-first.io/StructureDefinition/large-size";
const ACCESSION_IDENTIFIER_URL: &str =
    "http://fhir.kids-first.io/StructureDefinition/accession-identifier";
const DATA_TYPE_SYSTEM: &str = "http://fhir.kids-first.io/CodeSystem/data-type";

/// Data-type label, code and display from `http://fhir.kids-first.io/ValueSet/data-type`.
const DATA_TYPES: &[(&str, &str, &str)] = &[
    ("Aligned Reads", "C164052", "Aligned Sequence Read"),
    ("Gene Expression", "C16608", "Gene Expression"),
    ("Gene Fusions", "C20195", "Gene Fusion"),
    ("Operation Reports", "C114420", "Operative Report"),
    ("Pathology Reports", "C28277", "Pathology Report"),
    ("Annotated Somatic Mutations", "C18060", "Somatic Mutation"),
    ("Unaligned Reads", "C164053", "Unaligned Sequence Read"),
];

/// Looks up the coded concept for a data-type label.
///
/// Returns `None` when `data_type` is not one of the labels in the data-type value set.
pub fn data_type_concept(data_type: &str) -> Option<CodeableConcept> {
    DATA_TYPES
        .iter()
        .find(|(label, _, _)| *label == data_type)
        .map(|(label, code, display)| CodeableConcept {
            coding: vec![Coding::new(Some(DATA_TYPE_SYSTEM), code, display)],
            text: Some((*label).to_string()),
        })
}

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for a genomic file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomicFileData {
    /// Workspace the sample belongs to.
    pub study_id: String,

    /// Sample the file was produced from.
    pub sample_id: String,

    /// Subject the sample was taken from, if known.
    pub subject_id: Option<String>,

    /// Terra column the file was listed under (for example `cram_path`).
    pub property_name: String,

    /// Full blob name or URL.
    pub name: String,

    /// Size in bytes.
    pub size: Option<u64>,

    /// Accession identifiers controlling access.
    pub acl: Option<Vec<String>>,
}

impl GenomicFileData {
    /// Last `/` segment of the blob name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Last `.` segment of the file name.
    pub fn file_format(&self) -> &str {
        self.file_name().rsplit('.').next().unwrap_or_default()
    }
}

// ============================================================================
// Public DocumentReference operations
// ============================================================================

/// DocumentReference resource operations.
pub struct DocumentReference;

impl DocumentReference {
    pub const RESOURCE_TYPE: &'static str = "DocumentReference";

    /// Builds a DocumentReference for a genomic file.
    ///
    /// `identifier_base` is the system prefix for the workspace-scoped identifier; the
    /// study id is appended to it.
    pub fn build_entity(data: &GenomicFileData, identifier_base: &str) -> DocumentReferenceResource {
        let study_slug = make_identifier(&[&data.study_id]);
        let sample_slug = make_identifier(&[&data.sample_id]);
        let subject_slug = data
            .subject_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| make_identifier(&[&data.study_id, id]))
            .filter(|slug| !slug.is_empty());

        let id = make_identifier(&[&join(&[&study_slug, &sample_slug, &data.property_name])]);

        let extension = data
            .acl
            .as_ref()
            .filter(|acl| !acl.is_empty())
            .map(|acl| {
                vec![Extension::complex(
                    ACCESSION_IDENTIFIER_URL,
                    acl.iter()
                        .map(|accession| {
                            Extension::simple(
                                "file-accession",
                                ExtensionValue::Identifier(IdentifierValue {
                                    value: accession.clone(),
                                }),
                            )
                        })
                        .collect(),
                )]
            })
            .unwrap_or_default();

        let data_type = data.file_format();
        let type_ = if data_type.is_empty() {
            None
        } else {
            Some(data_type_concept(data_type).unwrap_or_else(|| CodeableConcept::text(data_type)))
        };

        DocumentReferenceResource {
            resource_type: Self::RESOURCE_TYPE,
            identifier: vec![
                Identifier {
                    system: format!("{identifier_base}/{}", data.study_id),
                    value: data.sample_id.clone(),
                },
                Identifier {
                    system: UNIQUE_STRING_SYSTEM.to_string(),
                    value: id.clone(),
                },
            ],
            id,
            meta: Meta {
                profile: vec![PROFILE.to_string()],
            },
            status: "current",
            extension,
            type_,
            subject: subject_slug.map(|slug| Reference::to("Patient", &slug)),
            content: build_content(data).into_iter().collect(),
        }
    }

    /// Renders a DocumentReference as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render(resource: &DocumentReferenceResource) -> FhirResult<String> {
        serde_json::to_string(resource).map_err(|e| {
            FhirError::Translation(format!("Failed to serialise document reference: {e}"))
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of a DocumentReference resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentReferenceResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,

    pub id: String,

    pub meta: Meta,

    pub identifier: Vec<Identifier>,

    pub status: &'static str,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Content>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Format {
    pub display: String,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Builds the single content element, or `None` when there is nothing to describe.
fn build_content(data: &GenomicFileData) -> Option<Content> {
    let mut attachment = Attachment::default();

    if let Some(size) = data.size.filter(|size| *size > 0) {
        attachment.extension = vec![Extension::simple(
            LARGE_SIZE_URL,
            ExtensionValue::Decimal(size),
        )];
    }
    if !data.name.is_empty() {
        attachment.url = Some(data.name.clone());
    }
    let file_name = data.file_name();
    if !file_name.is_empty() {
        attachment.title = Some(file_name.to_string());
    }

    let file_format = data.file_format();
    let content = Content {
        attachment: (attachment != Attachment::default()).then_some(attachment),
        format: (!file_format.is_empty()).then(|| Format {
            display: file_format.to_string(),
        }),
    };

    (content != Content::default()).then_some(content)
}
