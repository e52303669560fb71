use anvil_core::config::{identifier_system_base_from_env_value, storage_size_unit_from_env_value};
use anvil_core::{
    document_reference, research_study_observation, subject_factory, transform_workspace,
    write_ndjson, Blob, BlobRecord, CoreConfig, CoreError, Sample, SamplesBySubject,
    SubjectRecord, Workspace,
};
use clap::{Parser, Subcommand};
use fhir::{DocumentReference, ResearchStudyObservation};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "anvil")]
#[command(about = "AnVIL workspace to FHIR reconciliation CLI")]
struct Cli {
    /// UCUM code for the study storage size (default: L)
    #[arg(long, global = true)]
    storage_size_unit: Option<String>,

    /// System prefix for workspace-scoped identifiers
    #[arg(long, global = true)]
    identifier_system_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a subject and print its normalised demographics
    Classify {
        /// Workspace name (selects the cohort)
        #[arg(long)]
        workspace: String,
        /// Subject JSON, Terra-shaped or a flat attribute bag
        subject: PathBuf,
        /// JSON object mapping subject id to its samples
        #[arg(long)]
        samples: Option<PathBuf>,
    },
    /// Print the DocumentReference for a blob
    DocumentReference {
        /// Blob JSON with its sample inline
        blob: PathBuf,
    },
    /// Print the study summary Observation for a workspace export
    Summary {
        /// Workspace export JSON
        workspace: PathBuf,
    },
    /// Transform a workspace export and write NDJSON resources
    Transform {
        /// Workspace export JSON
        workspace: PathBuf,
        /// Output directory
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
}

/// A blob with its sample inline, as accepted by `document-reference`.
#[derive(Deserialize)]
struct BlobInput {
    name: String,
    #[serde(default)]
    size: Option<u64>,
    property_name: String,
    sample: Sample,
}

impl TryFrom<BlobInput> for Blob {
    type Error = CoreError;

    /// The inline sample must name its workspace; it becomes the study of the resource.
    fn try_from(input: BlobInput) -> Result<Self, Self::Error> {
        if input.sample.workspace_name.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "sample {} has no workspace_name",
                input.sample.id
            )));
        }

        Ok(Blob {
            record: BlobRecord {
                name: input.name,
                size: input.size,
                property_name: input.property_name,
                sample_id: input.sample.id.clone(),
            },
            sample: input.sample,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CoreConfig::new(
        storage_size_unit_from_env_value(cli.storage_size_unit),
        identifier_system_base_from_env_value(cli.identifier_system_base),
    )?;

    match cli.command {
        Some(Commands::Classify {
            workspace,
            subject,
            samples,
        }) => {
            let record = SubjectRecord::from_value(read_json(&subject)?)?;
            let samples: SamplesBySubject = match samples {
                Some(path) => read_json(&path)?,
                None => SamplesBySubject::from([(record.name.clone(), Vec::new())]),
            };

            let subject = subject_factory(record, &workspace, &samples)?;
            println!("cohort: {}", subject.cohort());
            println!("id: {}", subject.id());
            println!(
                "age: {}",
                subject.age().map_or("-".to_string(), |age| age.to_string())
            );
            println!("gender: {}", subject.gender().as_deref().unwrap_or("-"));
            println!(
                "ethnicity: {}",
                subject.ethnicity().map_or("-".to_string(), |e| e.to_string())
            );
            println!("missing_samples: {}", subject.missing_samples());
        }
        Some(Commands::DocumentReference { blob }) => {
            let blob = Blob::try_from(read_json::<BlobInput>(&blob)?)?;
            let resource = document_reference(&blob, &config);
            println!("{}", DocumentReference::render(&resource)?);
        }
        Some(Commands::Summary { workspace }) => {
            let workspace = Workspace::load(&workspace)?;
            let resource = research_study_observation(&workspace, &config);
            println!("{}", ResearchStudyObservation::render(&resource)?);
        }
        Some(Commands::Transform { workspace, out }) => {
            let workspace = Workspace::load(&workspace)?;
            let output = transform_workspace(&workspace, &config)?;
            for path in write_ndjson(&out, &output)? {
                println!("Wrote {}", path.display());
            }
            if output.skipped_blobs > 0 {
                eprintln!("Skipped {} blobs with unknown samples", output.skipped_blobs);
            }
        }
        None => {
            println!("Use 'anvil --help' for commands");
        }
    }

    Ok(())
}
