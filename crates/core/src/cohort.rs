//! Cohort detection and cohort-specific subject rules.
//!
//! Each AnVIL cohort names its subject metadata differently. A cohort decides only how a
//! subject's id and age are derived; gender and ethnicity rules are shared (see
//! [`crate::subject`]).
//!
//! The cohort is detected from the workspace name by case-insensitive substring match against
//! the cohort dispatch table, in table order; the first match wins.

use crate::terra::SubjectRecord;
use crate::{CoreError, CoreResult};
use anvil_types::{raw_text, Attributes};
use serde_json::Value;

/// An AnVIL cohort.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cohort {
    Ccdg,
    Cmg,
    Gtex,
    ThousandGenomes,
    Emerge,
}

/// Who an age lookup is for; only used in log lines.
#[derive(Clone, Copy, Debug)]
pub struct AgeContext<'a> {
    pub workspace_name: &'a str,
    pub subject_id: &'a str,
}

type IdRule = fn(&SubjectRecord) -> &str;
type AgeRule = fn(&Attributes, AgeContext<'_>) -> Option<u32>;

/// Dispatch table entry for one cohort.
struct CohortRules {
    cohort: Cohort,
    /// Upper-case substring identifying the cohort in a workspace name.
    marker: &'static str,
    id: IdRule,
    age: AgeRule,
}

/// Cohort dispatch table; order is match order.
static COHORT_RULES: [CohortRules; 5] = [
    CohortRules {
        cohort: Cohort::Ccdg,
        marker: "CCDG",
        id: name_id,
        age: ccdg_age,
    },
    CohortRules {
        cohort: Cohort::Cmg,
        marker: "CMG",
        id: name_id,
        age: cmg_age,
    },
    CohortRules {
        cohort: Cohort::Gtex,
        marker: "GTEX",
        id: name_id,
        age: gtex_age,
    },
    CohortRules {
        cohort: Cohort::ThousandGenomes,
        marker: "1000G-HIGH-COVERAGE",
        id: name_id,
        age: no_age,
    },
    CohortRules {
        cohort: Cohort::Emerge,
        marker: "ANVIL_EMERGE",
        id: name_id,
        age: no_age,
    },
];

impl Cohort {
    /// Detect the cohort from a workspace name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedCohort`] if no cohort marker occurs in the name.
    pub fn from_workspace_name(workspace_name: &str) -> CoreResult<Self> {
        let upper = workspace_name.to_uppercase();
        COHORT_RULES
            .iter()
            .find(|rules| upper.contains(rules.marker))
            .map(|rules| rules.cohort)
            .ok_or_else(|| CoreError::UnsupportedCohort(workspace_name.to_string()))
    }

    /// Every cohort, in match order.
    pub fn all() -> impl Iterator<Item = Cohort> {
        COHORT_RULES.iter().map(|rules| rules.cohort)
    }

    /// Human-readable cohort name.
    pub fn display_name(self) -> &'static str {
        match self {
            Cohort::Ccdg => "CCDG",
            Cohort::Cmg => "CMG",
            Cohort::Gtex => "GTEx",
            Cohort::ThousandGenomes => "1000 Genomes",
            Cohort::Emerge => "eMERGE",
        }
    }

    /// Workspace-name marker for this cohort.
    pub fn marker(self) -> &'static str {
        self.rules().marker
    }

    /// Cohort-specific subject id.
    pub fn id(self, record: &SubjectRecord) -> &str {
        (self.rules().id)(record)
    }

    /// Cohort-specific age in years.
    pub fn age(self, attributes: &Attributes, context: AgeContext<'_>) -> Option<u32> {
        (self.rules().age)(attributes, context)
    }

    fn rules(self) -> &'static CohortRules {
        // Every variant has exactly one table entry.
        match self {
            Cohort::Ccdg => &COHORT_RULES[0],
            Cohort::Cmg => &COHORT_RULES[1],
            Cohort::Gtex => &COHORT_RULES[2],
            Cohort::ThousandGenomes => &COHORT_RULES[3],
            Cohort::Emerge => &COHORT_RULES[4],
        }
    }
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Rules
// ============================================================================

fn name_id(record: &SubjectRecord) -> &str {
    &record.name
}

/// Parses an age value; only non-empty runs of ASCII digits that fit in `u32` are numeric.
fn numeric_age(value: &Value) -> Option<u32> {
    raw_text(value)
        .filter(|text| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|text| text.parse().ok())
}

fn ccdg_age(attributes: &Attributes, context: AgeContext<'_>) -> Option<u32> {
    let Some((key, value)) = attributes.first_present(&["Age", "AGE", "AGE_baseline"]) else {
        tracing::info!(
            "{} {} missing age parameter",
            context.workspace_name,
            context.subject_id
        );
        return None;
    };

    let age = numeric_age(value);
    if age.is_none() {
        tracing::warn!(
            "{} {} {} not numeric",
            context.workspace_name,
            context.subject_id,
            key
        );
    }
    age
}

fn cmg_age(attributes: &Attributes, context: AgeContext<'_>) -> Option<u32> {
    let Some(value) = attributes.get("18-age_of_onset") else {
        tracing::info!(
            "{} {} missing 18-age_of_onset",
            context.workspace_name,
            context.subject_id
        );
        return None;
    };
    numeric_age(value)
}

fn gtex_age(attributes: &Attributes, context: AgeContext<'_>) -> Option<u32> {
    let Some(value) = attributes.get("age") else {
        tracing::info!(
            "{} {} missing age",
            context.workspace_name,
            context.subject_id
        );
        return None;
    };

    let age = numeric_age(value);
    if age.is_none() {
        tracing::info!(
            "{} {} age not numeric",
            context.workspace_name,
            context.subject_id
        );
    }
    age
}

fn no_age(_: &Attributes, _: AgeContext<'_>) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    const CONTEXT: AgeContext<'static> = AgeContext {
        workspace_name: "ws",
        subject_id: "S1",
    };

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = logs.0.lock().expect("log buffer lock").clone();
        String::from_utf8(bytes).expect("utf8 logs")
    }

    #[test]
    fn detects_every_cohort_case_insensitively() {
        let cases = [
            ("AnVIL_CCDG_Broad_NP_Epilepsy", Cohort::Ccdg),
            ("anvil_cmg_uwash_gru", Cohort::Cmg),
            ("AnVIL_GTEx_V8_hg38", Cohort::Gtex),
            ("1000G-high-coverage-2019", Cohort::ThousandGenomes),
            ("AnVIL_eMERGE_PGRNseq", Cohort::Emerge),
        ];
        for (name, expected) in cases {
            assert_eq!(Cohort::from_workspace_name(name).expect(name), expected);
        }
    }

    #[test]
    fn first_match_wins() {
        // Contains both CMG and GTEX markers; CMG comes first in the table.
        assert_eq!(
            Cohort::from_workspace_name("GTEX_CMG_combined").expect("supported"),
            Cohort::Cmg
        );
        assert_eq!(
            Cohort::from_workspace_name("CCDG_CMG").expect("supported"),
            Cohort::Ccdg
        );
    }

    #[test]
    fn unsupported_workspace_name_fails() {
        for name in ["AnVIL_NHGRI_Example", "", "1000G", "emerge"] {
            let err = Cohort::from_workspace_name(name).expect_err(name);
            assert!(matches!(&err, CoreError::UnsupportedCohort(n) if n == name));
        }
    }

    #[test]
    fn markers_follow_table_order() {
        let markers: Vec<_> = Cohort::all().map(Cohort::marker).collect();
        assert_eq!(
            markers,
            ["CCDG", "CMG", "GTEX", "1000G-HIGH-COVERAGE", "ANVIL_EMERGE"]
        );
    }

    #[test]
    fn rules_lookup_matches_variant() {
        for cohort in Cohort::all() {
            assert_eq!(cohort.rules().cohort, cohort);
        }
    }

    #[test]
    fn every_cohort_uses_subject_name_as_id() {
        let record = SubjectRecord::new("NA12878", Attributes::new());
        for cohort in Cohort::all() {
            assert_eq!(cohort.id(&record), "NA12878");
        }
    }

    #[test]
    fn ccdg_age_uses_first_present_key() {
        let attrs = Attributes::new().with("AGE_baseline", "30").with("AGE", "40");
        assert_eq!(Cohort::Ccdg.age(&attrs, CONTEXT), Some(40));

        let attrs = Attributes::new().with("AGE_baseline", json!(30));
        assert_eq!(Cohort::Ccdg.age(&attrs, CONTEXT), Some(30));
    }

    #[test]
    fn ccdg_non_numeric_age_is_missing() {
        for value in [json!("unknown"), json!("45.5"), json!(45.5), json!("-3"), json!(""), Value::Null] {
            for key in ["Age", "AGE", "AGE_baseline"] {
                let attrs = Attributes::new().with(key, value.clone());
                assert_eq!(Cohort::Ccdg.age(&attrs, CONTEXT), None, "{key}={value}");
            }
        }
    }

    #[test]
    fn ccdg_non_numeric_first_key_does_not_fall_through() {
        let attrs = Attributes::new().with("Age", "NA").with("AGE", "40");
        assert_eq!(Cohort::Ccdg.age(&attrs, CONTEXT), None);
    }

    #[test]
    fn overflowing_age_is_missing() {
        let attrs = Attributes::new().with("Age", "99999999999");
        assert_eq!(Cohort::Ccdg.age(&attrs, CONTEXT), None);
    }

    #[test]
    fn cmg_reads_age_of_onset() {
        let attrs = Attributes::new().with("18-age_of_onset", "12");
        assert_eq!(Cohort::Cmg.age(&attrs, CONTEXT), Some(12));

        let attrs = Attributes::new().with("18-age_of_onset", "Infantile");
        assert_eq!(Cohort::Cmg.age(&attrs, CONTEXT), None);

        let attrs = Attributes::new().with("Age", "12");
        assert_eq!(Cohort::Cmg.age(&attrs, CONTEXT), None);
    }

    #[test]
    fn gtex_reads_lowercase_age() {
        let attrs = Attributes::new().with("age", json!(65));
        assert_eq!(Cohort::Gtex.age(&attrs, CONTEXT), Some(65));

        let attrs = Attributes::new().with("age", "60-69");
        assert_eq!(Cohort::Gtex.age(&attrs, CONTEXT), None);

        let attrs = Attributes::new().with("Age", "65");
        assert_eq!(Cohort::Gtex.age(&attrs, CONTEXT), None);
    }

    #[test]
    fn thousand_genomes_and_emerge_never_have_age() {
        let attrs = Attributes::new()
            .with("age", "40")
            .with("Age", "40")
            .with("18-age_of_onset", "40");
        assert_eq!(Cohort::ThousandGenomes.age(&attrs, CONTEXT), None);
        assert_eq!(Cohort::Emerge.age(&attrs, CONTEXT), None);
    }

    #[test]
    fn ccdg_non_numeric_age_logs_warning() {
        let attrs = Attributes::new().with("AGE", "unknown");
        let logs = capture_logs(|| {
            assert_eq!(Cohort::Ccdg.age(&attrs, CONTEXT), None);
        });
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("ws S1 AGE not numeric"), "{logs}");
    }

    #[test]
    fn cmg_non_numeric_age_is_silent() {
        let attrs = Attributes::new().with("18-age_of_onset", "Infantile");
        let logs = capture_logs(|| {
            assert_eq!(Cohort::Cmg.age(&attrs, CONTEXT), None);
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn gtex_non_numeric_age_logs_info() {
        let attrs = Attributes::new().with("age", "60-69");
        let logs = capture_logs(|| {
            assert_eq!(Cohort::Gtex.age(&attrs, CONTEXT), None);
        });
        assert!(logs.contains("INFO"), "{logs}");
        assert!(!logs.contains("WARN"), "{logs}");
        assert!(logs.contains("ws S1 age not numeric"), "{logs}");
    }

    #[test]
    fn missing_age_key_logs_info() {
        for cohort in [Cohort::Ccdg, Cohort::Cmg, Cohort::Gtex] {
            let logs = capture_logs(|| {
                assert_eq!(cohort.age(&Attributes::new(), CONTEXT), None);
            });
            assert!(logs.contains("INFO"), "{cohort}: {logs}");
            assert!(logs.contains("ws S1 missing"), "{cohort}: {logs}");
        }
    }
}
