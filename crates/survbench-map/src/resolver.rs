//! Column Mapping Resolver.
//!
//! Matches raw CSV headers to canonical fields. Matching runs in fixed
//! priority order: a previously saved template for the declared source,
//! then exact case-insensitive equality, then substring containment in
//! either direction, then the per-field synonym table. Higher-priority
//! rules are exhausted across all headers before lower ones run, so an
//! exact match is never stolen by an earlier header's looser match. Ties
//! within one rule are broken by the schema's field declaration order.

use std::collections::BTreeMap;

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;
use serde::{Deserialize, Serialize};

use survbench_model::{BenchError, CanonicalField, Result, SurveySchema};

use crate::synonyms::matches_synonym;
use crate::utils::normalize_text;

/// One resolved (or unresolved) raw header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub raw_header: String,
    /// `None` when no rule matched; unmatched optional headers are not
    /// errors.
    pub field: Option<CanonicalField>,
    pub required: bool,
    /// True when a heuristic rule (not a template) produced the match.
    pub auto_matched: bool,
    /// Similarity score reported for review; never changes which rule won.
    pub confidence: f32,
}

/// Output of column resolution for one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnResolution {
    pub mappings: Vec<ColumnMapping>,
    /// Required fields no header resolved to, in declaration order.
    pub missing_required: Vec<CanonicalField>,
}

impl ColumnResolution {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// Blocks downstream normalization when required fields are unresolved.
    ///
    /// # Errors
    ///
    /// [`BenchError::Validation`] listing the missing fields.
    pub fn require_complete(&self) -> Result<&Self> {
        if self.is_complete() {
            return Ok(self);
        }
        let missing: Vec<&str> = self
            .missing_required
            .iter()
            .map(CanonicalField::name)
            .collect();
        Err(BenchError::validation(format!(
            "unresolved required columns: {}",
            missing.join(", ")
        )))
    }

    /// Lookup the raw header assigned to a canonical field, if any.
    #[must_use]
    pub fn header_for(&self, field: CanonicalField) -> Option<&str> {
        self.mappings
            .iter()
            .find(|mapping| mapping.field == Some(field))
            .map(|mapping| mapping.raw_header.as_str())
    }
}

/// Reusable header assignments confirmed in a previous upload, keyed by
/// survey source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTemplate {
    pub survey_source: String,
    /// Normalized raw header -> canonical field.
    pub assignments: BTreeMap<String, CanonicalField>,
}

impl ColumnTemplate {
    #[must_use]
    pub fn new(survey_source: impl Into<String>) -> Self {
        Self {
            survey_source: survey_source.into(),
            assignments: BTreeMap::new(),
        }
    }

    pub fn assign(&mut self, raw_header: &str, field: CanonicalField) {
        self.assignments.insert(normalize_text(raw_header), field);
    }

    /// Builds a template from a completed resolution so the next upload
    /// from the same source resolves without heuristics.
    #[must_use]
    pub fn from_resolution(survey_source: &str, resolution: &ColumnResolution) -> Self {
        let mut template = Self::new(survey_source);
        for mapping in &resolution.mappings {
            if let Some(field) = mapping.field {
                template.assign(&mapping.raw_header, field);
            }
        }
        template
    }

    fn lookup(&self, raw_header: &str) -> Option<CanonicalField> {
        self.assignments.get(&normalize_text(raw_header)).copied()
    }
}

/// Resolves raw headers against the expected schema.
///
/// One-to-one: each canonical field is assigned at most once and each
/// header maps to at most one field. The same inputs always produce the
/// same resolution.
#[must_use]
pub fn resolve_columns(
    headers: &[String],
    schema: &SurveySchema,
    template: Option<&ColumnTemplate>,
) -> ColumnResolution {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_text(h)).collect();
    // header index -> (field, auto_matched)
    let mut assigned: BTreeMap<usize, (CanonicalField, bool)> = BTreeMap::new();
    let mut taken: Vec<CanonicalField> = Vec::new();

    // Template assignments first, before any heuristic rule.
    if let Some(template) = template {
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = template.lookup(header)
                && schema.fields.iter().any(|spec| spec.field == field)
                && !taken.contains(&field)
            {
                assigned.insert(idx, (field, false));
                taken.push(field);
            }
        }
    }

    for rule in [MatchRule::Exact, MatchRule::Substring, MatchRule::Synonym] {
        for (idx, norm_header) in normalized.iter().enumerate() {
            if assigned.contains_key(&idx) {
                continue;
            }
            for spec in &schema.fields {
                if taken.contains(&spec.field) {
                    continue;
                }
                if rule.matches(norm_header, spec.field) {
                    assigned.insert(idx, (spec.field, true));
                    taken.push(spec.field);
                    break;
                }
            }
        }
    }

    let mappings = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| match assigned.get(&idx) {
            Some(&(field, auto_matched)) => {
                let required = schema
                    .fields
                    .iter()
                    .any(|spec| spec.field == field && spec.required);
                ColumnMapping {
                    raw_header: header.clone(),
                    field: Some(field),
                    required,
                    auto_matched,
                    confidence: match_confidence(&normalized[idx], field, auto_matched),
                }
            }
            None => {
                tracing::debug!(header = %header, "no canonical field matched");
                ColumnMapping {
                    raw_header: header.clone(),
                    field: None,
                    required: false,
                    auto_matched: false,
                    confidence: 0.0,
                }
            }
        })
        .collect();

    let missing_required: Vec<CanonicalField> = schema
        .required_fields()
        .filter(|field| !taken.contains(field))
        .collect();
    if !missing_required.is_empty() {
        tracing::warn!(
            missing = missing_required.len(),
            "required columns left unresolved"
        );
    }

    ColumnResolution {
        mappings,
        missing_required,
    }
}

#[derive(Clone, Copy)]
enum MatchRule {
    Exact,
    Substring,
    Synonym,
}

impl MatchRule {
    fn matches(self, normalized_header: &str, field: CanonicalField) -> bool {
        let name = normalize_text(field.name());
        let display = normalize_text(field.display_name());
        match self {
            Self::Exact => normalized_header == name || normalized_header == display,
            Self::Substring => {
                contains_either(normalized_header, &name) || contains_either(normalized_header, &display)
            }
            Self::Synonym => matches_synonym(normalized_header, field),
        }
    }
}

fn contains_either(header: &str, candidate: &str) -> bool {
    header.contains(candidate) || candidate.contains(header)
}

/// Template and exact matches score 1.0; otherwise the Jaro-Winkler
/// similarity between the normalized header and the field's display name,
/// floored against its best synonym.
fn match_confidence(normalized_header: &str, field: CanonicalField, auto_matched: bool) -> f32 {
    if !auto_matched {
        return 1.0;
    }
    let display = normalize_text(field.display_name());
    if normalized_header == display || normalized_header == normalize_text(field.name()) {
        return 1.0;
    }
    let mut best = jaro_similarity(normalized_header.chars(), display.chars());
    for synonym in crate::synonyms::synonyms_for(field) {
        let score = jaro_similarity(normalized_header.chars(), synonym.chars());
        if score > best {
            best = score;
        }
    }
    best as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use survbench_model::FieldSpec;

    fn three_field_schema() -> SurveySchema {
        SurveySchema::new(vec![
            FieldSpec::required(CanonicalField::P25),
            FieldSpec::required(CanonicalField::Specialty),
            FieldSpec::required(CanonicalField::ProviderType),
        ])
    }

    #[test]
    fn resolves_all_three_required_headers() {
        let headers = vec![
            "25th Percentile TCC".to_string(),
            "Specialty".to_string(),
            "Provider Type".to_string(),
        ];
        let resolution = resolve_columns(&headers, &three_field_schema(), None);
        assert!(resolution.is_complete());
        for mapping in &resolution.mappings {
            assert!(mapping.auto_matched);
            assert!(mapping.field.is_some());
        }
        assert_eq!(resolution.header_for(CanonicalField::P25), Some("25th Percentile TCC"));
        assert_eq!(resolution.header_for(CanonicalField::Specialty), Some("Specialty"));
    }

    #[test]
    fn missing_required_field_blocks_normalization() {
        let headers = vec!["Specialty".to_string()];
        let resolution = resolve_columns(&headers, &three_field_schema(), None);
        assert!(!resolution.is_complete());
        assert_eq!(
            resolution.missing_required,
            vec![CanonicalField::P25, CanonicalField::ProviderType]
        );
        assert!(resolution.require_complete().is_err());
    }

    #[test]
    fn template_wins_over_heuristics() {
        let mut template = ColumnTemplate::new("mgma");
        // A header the heuristics would never tie to the median.
        template.assign("Comp Col B", CanonicalField::P50);
        let schema = SurveySchema::new(vec![FieldSpec::required(CanonicalField::P50)]);
        let headers = vec!["Comp Col B".to_string()];
        let resolution = resolve_columns(&headers, &schema, Some(&template));
        assert!(resolution.is_complete());
        let mapping = &resolution.mappings[0];
        assert_eq!(mapping.field, Some(CanonicalField::P50));
        assert!(!mapping.auto_matched);
        assert_eq!(mapping.confidence, 1.0);
    }

    #[test]
    fn synonym_table_resolves_count_columns() {
        let schema = SurveySchema::new(vec![
            FieldSpec::required(CanonicalField::NOrgs),
            FieldSpec::required(CanonicalField::NIncumbents),
        ]);
        let headers = vec!["Group Count".to_string(), "Indv Count".to_string()];
        let resolution = resolve_columns(&headers, &schema, None);
        assert!(resolution.is_complete());
        assert_eq!(resolution.header_for(CanonicalField::NOrgs), Some("Group Count"));
        assert_eq!(resolution.header_for(CanonicalField::NIncumbents), Some("Indv Count"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let headers = vec![
            "Provider Type".to_string(),
            "25th Percentile TCC".to_string(),
            "Specialty".to_string(),
        ];
        let schema = three_field_schema();
        let first = resolve_columns(&headers, &schema, None);
        let second = resolve_columns(&headers, &schema, None);
        assert_eq!(first, second);
    }
}
