//! Deterministic FHIR resource identifiers.
//!
//! Resource ids are derived from free-text source identifiers (workspace names, sample ids,
//! Terra column names) so that re-running a transformation yields the same ids and references
//! between resources resolve without a lookup table.
//!
//! The slug form is:
//! - components joined with [`JOIN_SEPARATOR`], then lowercased
//! - every character outside `[a-z0-9.-]` replaced by `-`
//! - runs of `-` collapsed, leading and trailing `-` trimmed
//!
//! Example: `("AnVIL_CCDG_Broad", "NA12878")` becomes `anvil-ccdg-broad-na12878`.

/// Separator placed between identifier components before slugification.
pub const JOIN_SEPARATOR: &str = "|";

/// Joins identifier components with [`JOIN_SEPARATOR`].
pub fn join(parts: &[&str]) -> String {
    parts.join(JOIN_SEPARATOR)
}

/// Builds a slug identifier from one or more components.
///
/// Returns an empty string when no component contains an identifier character.
pub fn make_identifier(parts: &[&str]) -> String {
    let joined = join(parts).to_lowercase();
    let mut slug = String::with_capacity(joined.len());

    for ch in joined.chars() {
        let ch = if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
            ch
        } else {
            '-'
        };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }

    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_pipe() {
        assert_eq!(join(&["a", "b", "c"]), "a|b|c");
        assert_eq!(join(&["only"]), "only");
    }

    #[test]
    fn lowercases_and_replaces_separators() {
        assert_eq!(
            make_identifier(&["AnVIL_CCDG_Broad", "NA12878"]),
            "anvil-ccdg-broad-na12878"
        );
    }

    #[test]
    fn keeps_dots_and_dashes() {
        assert_eq!(make_identifier(&["HG00096.final-cram"]), "hg00096.final-cram");
    }

    #[test]
    fn collapses_and_trims_dashes() {
        assert_eq!(make_identifier(&["  __Study  A__ "]), "study-a");
        assert_eq!(make_identifier(&["a--b"]), "a-b");
    }

    #[test]
    fn empty_when_nothing_survives() {
        assert_eq!(make_identifier(&[""]), "");
        assert_eq!(make_identifier(&["/ /", "__"]), "");
    }

    #[test]
    fn non_ascii_characters_become_separators() {
        assert_eq!(make_identifier(&["Café Study"]), "caf-study");
    }

    #[test]
    fn slugging_a_joined_slug_is_stable() {
        let study = make_identifier(&["AnVIL_CMG"]);
        let sample = make_identifier(&["Sample 1"]);
        let id = make_identifier(&[&join(&[&study, &sample, "cram_path"])]);
        assert_eq!(id, "anvil-cmg-sample-1-cram-path");
        assert_eq!(make_identifier(&[&id]), id);
    }
}
