//! Constants used throughout the AnVIL core crate.

/// Default system prefix for workspace-scoped identifiers; the workspace name is appended.
pub const DEFAULT_IDENTIFIER_SYSTEM_BASE: &str =
    "https://anvil.terra.bio/#workspaces/anvil-datastorage";

/// Default UCUM code reported for the aggregate storage size.
///
/// Downstream consumers currently expect `L`, although the value is a byte count.
pub const DEFAULT_STORAGE_SIZE_UNIT: &str = "L";

/// Filename for generated Patient resources.
pub const PATIENT_NDJSON_FILENAME: &str = "Patient.ndjson";

/// Filename for generated DocumentReference resources.
pub const DOCUMENT_REFERENCE_NDJSON_FILENAME: &str = "DocumentReference.ndjson";

/// Filename for generated Observation resources.
pub const OBSERVATION_NDJSON_FILENAME: &str = "Observation.ndjson";
