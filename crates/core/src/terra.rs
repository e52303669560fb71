//! Terra workspace data model.
//!
//! A workspace export is a JSON document holding the workspace identity, its subjects, samples
//! and the blobs listed in sample columns. Everything here is plain data, built fresh per
//! run and never mutated afterwards.

use crate::cohort::Cohort;
use crate::{CoreError, CoreResult};
use anvil_types::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Samples keyed by the cohort-specific subject id.
pub type SamplesBySubject = HashMap<String, Vec<Sample>>;

/// A subject row as exported from Terra.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SubjectRecord {
    pub name: String,

    #[serde(rename = "entityType", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(default)]
    pub attributes: Attributes,
}

impl SubjectRecord {
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            entity_type: None,
            attributes,
        }
    }

    /// Parses a subject from either the Terra shape or a flat attribute bag.
    ///
    /// The Terra shape is `{"name": .., "attributes": {..}}`. A flat bag such as
    /// `{"name": "S1", "Age": "45"}` takes `name` out of the bag and keeps the remaining keys as
    /// attributes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Attributes`] if `value` is not an object,
    /// [`CoreError::WorkspaceSchema`] if a Terra-shaped subject does not match, or
    /// [`CoreError::InvalidInput`] if a flat bag has no string `name`.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        if matches!(value.get("attributes"), Some(Value::Object(_))) {
            return serde_json::from_value(value)
                .map_err(|e| CoreError::WorkspaceSchema(format!("subject: {e}")));
        }

        let attributes = Attributes::from_value(value)?;
        let name = attributes
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::InvalidInput("subject has no string 'name'".into()))?;

        let rest = attributes
            .iter()
            .filter(|(key, _)| key.as_str() != "name")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<serde_json::Map<_, _>>();

        Ok(Self::new(name, Attributes::from(rest)))
    }
}

/// A sample row.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sample {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// Filled with the owning workspace name when absent from the export.
    #[serde(default)]
    pub workspace_name: String,
}

/// A blob listed in a sample column.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlobRecord {
    /// Full blob name or URL.
    pub name: String,

    #[serde(default)]
    pub size: Option<u64>,

    /// Sample column the blob was listed under.
    pub property_name: String,

    pub sample_id: String,
}

/// A blob resolved against its sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub record: BlobRecord,
    pub sample: Sample,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkspaceAttributes {
    #[serde(default)]
    pub workspace: WorkspaceIdentity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkspaceIdentity {
    #[serde(default)]
    pub namespace: String,
}

/// A Terra workspace export.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Workspace {
    pub name: String,

    #[serde(default)]
    pub attributes: WorkspaceAttributes,

    #[serde(default)]
    pub subject_schema: Option<Value>,

    #[serde(default)]
    pub sample_schema: Option<Value>,

    #[serde(default)]
    pub subject_property_name: Option<String>,

    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,

    #[serde(default)]
    pub samples: Vec<Sample>,

    #[serde(default)]
    pub blobs: Vec<BlobRecord>,
}

impl Workspace {
    /// Parse a workspace export from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `subjects[3].name`) of the
    /// failing field when the JSON does not match the export shape.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkspaceSchema`] if the JSON does not match, or
    /// [`CoreError::InvalidInput`] if the workspace name is blank.
    pub fn from_json(json_text: &str) -> CoreResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let mut workspace = match serde_path_to_error::deserialize::<_, Workspace>(&mut deserializer)
        {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(CoreError::WorkspaceSchema(format!(
                    "mismatch at {path}: {source}"
                )));
            }
        };

        if workspace.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("workspace name cannot be empty".into()));
        }

        for sample in &mut workspace.samples {
            if sample.workspace_name.is_empty() {
                sample.workspace_name = workspace.name.clone();
            }
        }

        Ok(workspace)
    }

    /// Read and parse a workspace export file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FileRead`] if the file cannot be read, otherwise as
    /// [`Workspace::from_json`].
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoreError::FileRead)?;
        Self::from_json(&text)
    }

    /// Workspace identifier used for study-level resources.
    pub fn id(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.attributes.workspace.namespace
    }

    /// Blob sizes keyed by blob name; a blob without a size counts as 0.
    pub fn blob_sizes(&self) -> BTreeMap<String, u64> {
        self.blobs
            .iter()
            .map(|blob| (blob.name.clone(), blob.size.unwrap_or(0)))
            .collect()
    }

    /// Groups samples by subject id.
    ///
    /// Every subject gets an entry, so subjects without samples resolve to an empty list.
    /// Samples without a subject id are left out.
    pub fn samples_by_subject(&self, cohort: Cohort) -> SamplesBySubject {
        let mut index: SamplesBySubject = self
            .subjects
            .iter()
            .map(|record| (cohort.id(record).to_string(), Vec::new()))
            .collect();

        for sample in &self.samples {
            if let Some(subject_id) = &sample.subject_id {
                index
                    .entry(subject_id.clone())
                    .or_default()
                    .push(sample.clone());
            }
        }

        index
    }

    /// Resolves a blob against the workspace samples.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSample`] if no sample has the blob's `sample_id`.
    pub fn resolve_blob(&self, record: &BlobRecord) -> CoreResult<Blob> {
        let sample = self
            .samples
            .iter()
            .find(|sample| sample.id == record.sample_id)
            .ok_or_else(|| CoreError::UnknownSample {
                blob: record.name.clone(),
                sample_id: record.sample_id.clone(),
            })?;

        Ok(Blob {
            record: record.clone(),
            sample: sample.clone(),
        })
    }
}
