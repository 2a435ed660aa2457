//! Fixed synonym table per canonical field.
//!
//! Each canonical field carries an ordered list of known alternate
//! spellings seen across survey providers. The resolver consults this table
//! only after exact and substring matching have failed, and evaluates the
//! entries deterministically in declaration order.

use survbench_model::CanonicalField;

/// Known synonyms for a canonical field, normalized form (lowercase,
/// separators collapsed to single spaces).
#[must_use]
pub fn synonyms_for(field: CanonicalField) -> &'static [&'static str] {
    match field {
        CanonicalField::Specialty => &["specialty name", "service line", "discipline"],
        CanonicalField::ProviderType => &[
            "provider category",
            "staff type",
            "clinician type",
            "position",
        ],
        CanonicalField::Region => &[
            "service area",
            "geographic region",
            "geography",
            "census region",
        ],
        CanonicalField::Year => &["survey year", "data year", "report year"],
        CanonicalField::SurveySource => &["source", "survey", "publisher"],
        CanonicalField::Variable => &["metric", "measure", "benchmark", "comp element"],
        CanonicalField::OrgId => &["organization", "group id", "practice id"],
        CanonicalField::NOrgs => &[
            "group count",
            "org count",
            "organizations reporting",
            "practice count",
        ],
        CanonicalField::NIncumbents => &[
            "indv count",
            "individual count",
            "incumbents",
            "provider count",
            "fte count",
        ],
        CanonicalField::P25 => &["25th", "p25", "q1", "lower quartile"],
        CanonicalField::P50 => &["50th", "p50", "median", "midpoint"],
        CanonicalField::P75 => &["75th", "p75", "q3", "upper quartile"],
        CanonicalField::P90 => &["90th", "p90"],
    }
}

/// True when the normalized header matches one of the field's synonyms,
/// either exactly or by containment.
#[must_use]
pub fn matches_synonym(normalized_header: &str, field: CanonicalField) -> bool {
    synonyms_for(field)
        .iter()
        .any(|synonym| normalized_header == *synonym || normalized_header.contains(synonym))
}
