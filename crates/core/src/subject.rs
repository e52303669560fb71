//! Subject classification and demographic normalisation.
//!
//! [`subject_factory`] picks the cohort from the workspace name, resolves the subject's samples
//! and returns a [`Subject`] whose accessors apply the cohort rules (id, age) and the shared
//! rules (gender, ethnicity).
//!
//! Missing demographics are soft: the accessor logs at info level and returns `None`. A subject
//! id absent from the sample mapping is hard: [`subject_factory`] fails.

use crate::cohort::{AgeContext, Cohort};
use crate::terra::{Sample, SamplesBySubject, SubjectRecord};
use crate::{CoreError, CoreResult};
use anvil_types::{raw_text, Attributes};

/// Keys holding gender, in lookup order.
const GENDER_KEYS: &[&str] = &["gender", "sex"];

/// Keys holding ethnicity, in lookup order.
///
/// The first entry is a single literal key that contains a comma.
const ETHNICITY_KEYS: &[&str] = &[
    "11-ancestry_detail,10-ancestry",
    "ancestry",
    "Race_Ethnicity",
    "Ethnicity",
    "RACE",
];

const GENDER_NULL_MARKERS: &[&str] = &["null", "NA"];
const ETHNICITY_NULL_MARKERS: &[&str] = &["null", "NA", "#N/A"];

/// Canonical ethnicity token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ethnicity {
    Hispanic,
    Black,
    Unknown,
    White,
    NotHispanic,
    AmericanIndianOrAlaskanNative,
    NotAsked,
    Asian,
    /// A source value outside the canonicalisation table, kept verbatim.
    Other(String),
}

impl Ethnicity {
    /// Canonicalise a raw ethnicity value.
    ///
    /// Matching is case-sensitive. Returns `None` for the null markers `null`, `NA` and `#N/A`;
    /// values outside the table pass through as [`Ethnicity::Other`].
    pub fn canonicalize(raw: &str) -> Option<Self> {
        if ETHNICITY_NULL_MARKERS.contains(&raw) {
            return None;
        }
        let ethnicity = match raw {
            "Hispanic or Latino" | "hispanic-or-latino" | "Hispanic" | "Hispanic/Latino"
            | "Puerto Rican" => Ethnicity::Hispanic,
            "African American" | "Black or African American" => Ethnicity::Black,
            "unknown" | "Unknown" => Ethnicity::Unknown,
            "White" | "Caucasian" | "Finnish" => Ethnicity::White,
            "Not Hispanic or Latino" | "not-hispanic-or-latino" | "Non-Hispanic" => {
                Ethnicity::NotHispanic
            }
            "American Indian or Alaskan Native" => Ethnicity::AmericanIndianOrAlaskanNative,
            "not-asked" | "Not Asked" => Ethnicity::NotAsked,
            "Asian" => Ethnicity::Asian,
            other => Ethnicity::Other(other.to_string()),
        };
        Some(ethnicity)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Ethnicity::Hispanic => "hispanic",
            Ethnicity::Black => "black",
            Ethnicity::Unknown => "unknown",
            Ethnicity::White => "white",
            Ethnicity::NotHispanic => "not-hispanic",
            Ethnicity::AmericanIndianOrAlaskanNative => "american-indian-or-alaskan-native",
            Ethnicity::NotAsked => "not-asked",
            Ethnicity::Asian => "asian",
            Ethnicity::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Terra subject classified into its cohort.
#[derive(Clone, Debug, PartialEq)]
pub struct Subject {
    cohort: Cohort,
    record: SubjectRecord,
    workspace_name: String,
    samples: Vec<Sample>,
}

/// Classify a subject and resolve its samples.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedCohort`] if the workspace name matches no cohort, or
/// [`CoreError::SubjectSamplesNotFound`] if the subject id is not a key of `samples`.
pub fn subject_factory(
    record: SubjectRecord,
    workspace_name: &str,
    samples: &SamplesBySubject,
) -> CoreResult<Subject> {
    let cohort = Cohort::from_workspace_name(workspace_name)?;
    let subject_id = cohort.id(&record);

    let resolved = samples
        .get(subject_id)
        .ok_or_else(|| CoreError::SubjectSamplesNotFound {
            workspace: workspace_name.to_string(),
            subject_id: subject_id.to_string(),
        })?
        .clone();

    Ok(Subject {
        cohort,
        record,
        workspace_name: workspace_name.to_string(),
        samples: resolved,
    })
}

impl Subject {
    pub fn cohort(&self) -> Cohort {
        self.cohort
    }

    /// Cohort-specific subject id.
    pub fn id(&self) -> &str {
        self.cohort.id(&self.record)
    }

    pub fn workspace_name(&self) -> &str {
        &self.workspace_name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.record.attributes
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Whether the subject resolved to an empty sample list.
    pub fn missing_samples(&self) -> bool {
        self.samples.is_empty()
    }

    /// Cohort-specific age in years.
    pub fn age(&self) -> Option<u32> {
        self.cohort.age(
            self.attributes(),
            AgeContext {
                workspace_name: &self.workspace_name,
                subject_id: self.id(),
            },
        )
    }

    /// Raw gender text from the first present of `gender`, `sex`.
    ///
    /// `null` and `NA` are treated as missing.
    pub fn gender(&self) -> Option<String> {
        let Some((_, value)) = self.attributes().first_present(GENDER_KEYS) else {
            tracing::info!(
                "{} {} missing gender parameter",
                self.workspace_name,
                self.id()
            );
            return None;
        };

        raw_text(value).filter(|gender| !GENDER_NULL_MARKERS.contains(&gender.as_str()))
    }

    /// Canonical ethnicity from the first present ethnicity key.
    pub fn ethnicity(&self) -> Option<Ethnicity> {
        let Some((_, value)) = self.attributes().first_present(ETHNICITY_KEYS) else {
            tracing::info!(
                "{} {} missing ethnicity parameter",
                self.workspace_name,
                self.id()
            );
            return None;
        };

        raw_text(value).and_then(|raw| Ethnicity::canonicalize(&raw))
    }
}
