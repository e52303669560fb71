#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid attributes: {0}")]
    Attributes(#[from] anvil_types::TypesError),
    #[error("unsupported cohort for workspace {0}")]
    UnsupportedCohort(String),
    #[error("no sample entry for subject {subject_id} in workspace {workspace}")]
    SubjectSamplesNotFound {
        workspace: String,
        subject_id: String,
    },
    #[error("blob {blob} references unknown sample {sample_id}")]
    UnknownSample { blob: String, sample_id: String },
    #[error("workspace export schema mismatch: {0}")]
    WorkspaceSchema(String),
    #[error("failed to read workspace export: {0}")]
    FileRead(std::io::Error),
    #[error("failed to create output directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write output file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize resource: {0}")]
    Serialization(serde_json::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
