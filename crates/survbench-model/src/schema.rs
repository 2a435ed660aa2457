//! Canonical field schema for normalized survey rows.
//!
//! Every provider ships its own column headers; the resolver maps them onto
//! this fixed set of canonical fields. Declaration order in a
//! [`SurveySchema`] is significant: it breaks ties deterministically when
//! more than one field matches a header at the same rule priority.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical fields of a normalized survey row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    Specialty,
    ProviderType,
    Region,
    Year,
    SurveySource,
    Variable,
    OrgId,
    NOrgs,
    NIncumbents,
    P25,
    P50,
    P75,
    P90,
}

impl CanonicalField {
    /// Stable snake_case identifier, used in templates and CLI output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Specialty => "specialty",
            Self::ProviderType => "provider_type",
            Self::Region => "region",
            Self::Year => "year",
            Self::SurveySource => "survey_source",
            Self::Variable => "variable",
            Self::OrgId => "org_id",
            Self::NOrgs => "n_orgs",
            Self::NIncumbents => "n_incumbents",
            Self::P25 => "p25",
            Self::P50 => "p50",
            Self::P75 => "p75",
            Self::P90 => "p90",
        }
    }

    /// Human-readable display name, as a header would typically spell it.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Specialty => "Specialty",
            Self::ProviderType => "Provider Type",
            Self::Region => "Region",
            Self::Year => "Year",
            Self::SurveySource => "Survey Source",
            Self::Variable => "Variable",
            Self::OrgId => "Organization Id",
            Self::NOrgs => "Org Count",
            Self::NIncumbents => "Incumbent Count",
            Self::P25 => "25th Percentile",
            Self::P50 => "50th Percentile",
            Self::P75 => "75th Percentile",
            Self::P90 => "90th Percentile",
        }
    }

    /// All canonical fields in declaration order.
    #[must_use]
    pub fn all() -> &'static [CanonicalField] {
        &[
            Self::Specialty,
            Self::ProviderType,
            Self::Region,
            Self::Year,
            Self::SurveySource,
            Self::Variable,
            Self::OrgId,
            Self::NOrgs,
            Self::NIncumbents,
            Self::P25,
            Self::P50,
            Self::P75,
            Self::P90,
        ]
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One expected field in an upload, tagged required or optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: CanonicalField,
    pub required: bool,
}

impl FieldSpec {
    #[must_use]
    pub fn required(field: CanonicalField) -> Self {
        Self {
            field,
            required: true,
        }
    }

    #[must_use]
    pub fn optional(field: CanonicalField) -> Self {
        Self {
            field,
            required: false,
        }
    }
}

/// Ordered list of expected canonical fields for an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySchema {
    pub fields: Vec<FieldSpec>,
}

impl SurveySchema {
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Default schema for a compensation benchmark upload.
    ///
    /// Specialty, provider type, variable and the median are required;
    /// everything else enriches the row when present.
    #[must_use]
    pub fn benchmark() -> Self {
        Self::new(vec![
            FieldSpec::required(CanonicalField::Specialty),
            FieldSpec::required(CanonicalField::ProviderType),
            FieldSpec::optional(CanonicalField::Region),
            FieldSpec::optional(CanonicalField::Year),
            FieldSpec::optional(CanonicalField::SurveySource),
            FieldSpec::required(CanonicalField::Variable),
            FieldSpec::optional(CanonicalField::OrgId),
            FieldSpec::optional(CanonicalField::NOrgs),
            FieldSpec::optional(CanonicalField::NIncumbents),
            FieldSpec::optional(CanonicalField::P25),
            FieldSpec::required(CanonicalField::P50),
            FieldSpec::optional(CanonicalField::P75),
            FieldSpec::optional(CanonicalField::P90),
        ])
    }

    /// Required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.fields
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.field)
    }
}
