use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anvil_core::config::{identifier_system_base_from_env_value, storage_size_unit_from_env_value};
use anvil_core::{CoreConfig, Workspace, transform_workspace, write_ndjson};

/// Batch entry point for the AnVIL reconciliation run
///
/// Loads one Terra workspace export, classifies its subjects, resolves its blobs and writes
/// Patient, DocumentReference and Observation NDJSON files for bulk import.
///
/// # Environment Variables
/// - `ANVIL_INPUT`: Path to the workspace export JSON (required)
/// - `ANVIL_OUTPUT_DIR`: Directory for NDJSON output (default: "output")
/// - `ANVIL_STORAGE_SIZE_UNIT`: UCUM code for the study storage size (default: "L")
/// - `ANVIL_IDENTIFIER_SYSTEM_BASE`: Prefix for workspace-scoped identifier systems
///
/// # Returns
/// * `Ok(())` - If the workspace was transformed and written
/// * `Err(anyhow::Error)` - If configuration, loading, classification or output fails
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("anvil=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input: PathBuf = std::env::var("ANVIL_INPUT")
        .map_err(|_| anyhow::anyhow!("ANVIL_INPUT must be set to a workspace export path"))?
        .into();
    let output_dir: PathBuf = std::env::var("ANVIL_OUTPUT_DIR")
        .unwrap_or_else(|_| "output".into())
        .into();

    let config = CoreConfig::new(
        storage_size_unit_from_env_value(std::env::var("ANVIL_STORAGE_SIZE_UNIT").ok()),
        identifier_system_base_from_env_value(std::env::var("ANVIL_IDENTIFIER_SYSTEM_BASE").ok()),
    )?;

    tracing::info!("++ Loading workspace export from {}", input.display());
    let workspace = Workspace::load(&input)?;

    let output = transform_workspace(&workspace, &config)?;
    let paths = write_ndjson(&output_dir, &output)?;

    tracing::info!(
        "{} done: {} patients, {} document references, {} blobs skipped",
        workspace.id(),
        output.patients.len(),
        output.document_references.len(),
        output.skipped_blobs
    );
    for path in paths {
        tracing::info!("++ Wrote {}", path.display());
    }

    Ok(())
}
