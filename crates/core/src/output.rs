//! NDJSON output for generated resources.
//!
//! One file per resource type, one compact JSON resource per line, ready for FHIR bulk import.

use crate::constants::{
    DOCUMENT_REFERENCE_NDJSON_FILENAME, OBSERVATION_NDJSON_FILENAME, PATIENT_NDJSON_FILENAME,
};
use crate::transform::TransformOutput;
use crate::{CoreError, CoreResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write every resource of `output` under `dir`, creating it as needed.
///
/// Existing files are overwritten. Returns the written paths in Patient, DocumentReference,
/// Observation order.
///
/// # Errors
///
/// Returns [`CoreError::StorageDirCreation`] if `dir` cannot be created,
/// [`CoreError::FileWrite`] on I/O failure, or [`CoreError::Serialization`] if a resource
/// cannot be serialised.
pub fn write_ndjson(dir: &Path, output: &TransformOutput) -> CoreResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(CoreError::StorageDirCreation)?;

    let patients = dir.join(PATIENT_NDJSON_FILENAME);
    write_resources(&patients, &output.patients)?;

    let document_references = dir.join(DOCUMENT_REFERENCE_NDJSON_FILENAME);
    write_resources(&document_references, &output.document_references)?;

    let observations = dir.join(OBSERVATION_NDJSON_FILENAME);
    write_resources(&observations, std::slice::from_ref(&output.observation))?;

    tracing::info!(
        "wrote {} patients, {} document references to {}",
        output.patients.len(),
        output.document_references.len(),
        dir.display()
    );

    Ok(vec![patients, document_references, observations])
}

fn write_resources<T: Serialize>(path: &Path, resources: &[T]) -> CoreResult<()> {
    let file = File::create(path).map_err(CoreError::FileWrite)?;
    let mut writer = BufWriter::new(file);

    for resource in resources {
        serde_json::to_writer(&mut writer, resource).map_err(CoreError::Serialization)?;
        writer.write_all(b"\n").map_err(CoreError::FileWrite)?;
    }

    writer.flush().map_err(CoreError::FileWrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::terra::Workspace;
    use crate::transform::transform_workspace;
    use serde_json::Value;
    use tempfile::TempDir;

    const EXPORT: &str = r#"{
  "name": "AnVIL_GTEx_V8_hg38",
  "subjects": [
    { "name": "GTEX-1", "attributes": { "age": 60, "sex": "Female" } },
    { "name": "GTEX-2", "attributes": {} }
  ],
  "samples": [ { "id": "GTEX-1-0001", "subject_id": "GTEX-1" } ],
  "blobs": [
    { "name": "gs://bucket/GTEX-1-0001.cram", "size": 10, "property_name": "cram_file", "sample_id": "GTEX-1-0001" }
  ]
}"#;

    fn read_lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .expect("read ndjson")
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect()
    }

    #[test]
    fn writes_one_line_per_resource() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let out_dir = temp_dir.path().join("nested").join("out");

        let workspace = Workspace::from_json(EXPORT).expect("parse export");
        let output = transform_workspace(&workspace, &CoreConfig::default()).expect("transform");
        let paths = write_ndjson(&out_dir, &output).expect("write ndjson");

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with(PATIENT_NDJSON_FILENAME));

        let patients = read_lines(&paths[0]);
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0]["resourceType"], "Patient");
        assert_eq!(patients[0]["id"], "anvil-gtex-v8-hg38-gtex-1");

        let documents = read_lines(&paths[1]);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["content"][0]["attachment"]["title"], "GTEX-1-0001.cram");

        let observations = read_lines(&paths[2]);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0]["id"], "anvil-gtex-v8-hg38");
    }

    #[test]
    fn rewriting_overwrites_previous_output() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let workspace = Workspace::from_json(EXPORT).expect("parse export");
        let output = transform_workspace(&workspace, &CoreConfig::default()).expect("transform");

        write_ndjson(temp_dir.path(), &output).expect("first write");
        let paths = write_ndjson(temp_dir.path(), &output).expect("second write");
        assert_eq!(read_lines(&paths[0]).len(), 2);
    }

    #[test]
    fn fails_when_dir_is_a_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let file_path = temp_dir.path().join("not-a-dir");
        fs::write(&file_path, "x").expect("write file");

        let workspace = Workspace::from_json(EXPORT).expect("parse export");
        let output = transform_workspace(&workspace, &CoreConfig::default()).expect("transform");
        let err = write_ndjson(&file_path, &output).expect_err("dir is a file");
        assert!(matches!(err, CoreError::StorageDirCreation(_)));
    }
}
