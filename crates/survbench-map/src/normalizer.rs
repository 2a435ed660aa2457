//! Taxonomy Normalizer.
//!
//! Maps a raw specialty / provider-type / region / variable string to a
//! canonical value. Resolution order: exact learned lookup in the mapping
//! table, per-kind keyword heuristics, title-case fallback. Pure and
//! idempotent; normalization never mutates the table — learning is the
//! store's explicit `learn` operation.

use serde::{Deserialize, Serialize};

use survbench_model::{EntityKind, TaxonomyTable};

use crate::utils::{normalize_text, title_case};

/// How a raw value was resolved.
///
/// Only [`ResolutionRule::Learned`] counts as mapped for coverage
/// reporting; the other two are valid but lower-confidence outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionRule {
    /// Confirmed `(survey_source, raw_value)` entry in the mapping table.
    Learned,
    /// Per-kind keyword heuristic.
    Heuristic,
    /// Title-cased raw value, unchanged otherwise.
    TitleCase,
}

/// A canonical value together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyResolution {
    pub canonical: String,
    pub rule: ResolutionRule,
}

/// Resolves a raw value, reporting which rule produced the canonical form.
#[must_use]
pub fn resolve_value(
    raw: &str,
    kind: EntityKind,
    survey_source: &str,
    table: &TaxonomyTable,
) -> TaxonomyResolution {
    if let Some(canonical) = table.resolve(survey_source, raw) {
        return TaxonomyResolution {
            canonical: canonical.to_string(),
            rule: ResolutionRule::Learned,
        };
    }
    if let Some(canonical) = heuristic_match(raw, kind) {
        return TaxonomyResolution {
            canonical: canonical.to_string(),
            rule: ResolutionRule::Heuristic,
        };
    }
    TaxonomyResolution {
        canonical: title_case(raw),
        rule: ResolutionRule::TitleCase,
    }
}

/// Resolves a raw value to its canonical string.
#[must_use]
pub fn normalize_value(
    raw: &str,
    kind: EntityKind,
    survey_source: &str,
    table: &TaxonomyTable,
) -> String {
    resolve_value(raw, kind, survey_source, table).canonical
}

/// A keyword either matches the whole normalized value (short codes such
/// as "np") or by containment (distinctive phrases such as "western").
#[derive(Clone, Copy)]
enum Keyword {
    Exact(&'static str),
    Phrase(&'static str),
}

impl Keyword {
    fn matches(self, normalized: &str) -> bool {
        match self {
            Self::Exact(keyword) => normalized == keyword,
            Self::Phrase(keyword) => normalized.contains(keyword),
        }
    }
}

/// Ordered keyword rules per entity kind; first match wins, so more
/// specific phrases ("midwest") are listed before the ones they contain
/// ("west").
fn heuristic_rules(kind: EntityKind) -> &'static [(&'static [Keyword], &'static str)] {
    match kind {
        EntityKind::Region => &[
            (
                &[
                    Keyword::Phrase("midwest"),
                    Keyword::Phrase("north central"),
                    Keyword::Exact("central"),
                ],
                "Midwest",
            ),
            (
                &[Keyword::Phrase("national"), Keyword::Phrase("all regions")],
                "National",
            ),
            (&[Keyword::Phrase("west")], "Western"),
            (&[Keyword::Phrase("east")], "Eastern"),
            (&[Keyword::Phrase("south")], "Southern"),
        ],
        EntityKind::ProviderType => &[
            (
                &[
                    Keyword::Phrase("nurse practitioner"),
                    Keyword::Exact("np"),
                ],
                "Nurse Practitioner",
            ),
            (
                &[
                    Keyword::Phrase("physician assistant"),
                    Keyword::Exact("pa"),
                ],
                "Physician Assistant",
            ),
            (&[Keyword::Exact("crna")], "CRNA"),
            (
                &[
                    Keyword::Exact("md"),
                    Keyword::Exact("do"),
                    Keyword::Exact("physician"),
                    Keyword::Exact("doctor"),
                ],
                "Physician",
            ),
        ],
        // Specialty and variable vocabularies are too provider-specific
        // for generic keywords; they resolve via learned mappings only.
        EntityKind::Specialty | EntityKind::Variable => &[],
    }
}

fn heuristic_match(raw: &str, kind: EntityKind) -> Option<&'static str> {
    let normalized = normalize_text(raw);
    if normalized.is_empty() {
        return None;
    }
    for (keywords, canonical) in heuristic_rules(kind) {
        if keywords.iter().any(|keyword| keyword.matches(&normalized)) {
            return Some(canonical);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(kind: EntityKind) -> TaxonomyTable {
        TaxonomyTable::new(kind)
    }

    #[test]
    fn region_keywords_resolve() {
        let table = empty(EntityKind::Region);
        assert_eq!(normalize_value("west", EntityKind::Region, "s", &table), "Western");
        assert_eq!(normalize_value("Western", EntityKind::Region, "s", &table), "Western");
        assert_eq!(normalize_value("Midwestern", EntityKind::Region, "s", &table), "Midwest");
        assert_eq!(normalize_value("Southeast", EntityKind::Region, "s", &table), "Eastern");
    }

    #[test]
    fn provider_type_codes_resolve_exactly() {
        let table = empty(EntityKind::ProviderType);
        assert_eq!(
            normalize_value("NP", EntityKind::ProviderType, "s", &table),
            "Nurse Practitioner"
        );
        // "pa" must not fire inside longer words.
        assert_eq!(
            normalize_value("Pathology Staff", EntityKind::ProviderType, "s", &table),
            "Pathology Staff"
        );
    }

    #[test]
    fn learned_lookup_wins_over_heuristics() {
        let mut table = TaxonomyTable::new(EntityKind::Region);
        table
            .learn(
                "Pacific",
                survbench_model::SourceEntry::new("mgma", "West Coast"),
                chrono::Utc::now(),
            )
            .unwrap();
        assert_eq!(
            normalize_value("West Coast", EntityKind::Region, "mgma", &table),
            "Pacific"
        );
    }

    #[test]
    fn specialty_falls_back_to_title_case() {
        let table = empty(EntityKind::Specialty);
        assert_eq!(
            normalize_value("cardiology - interventional", EntityKind::Specialty, "s", &table),
            "Cardiology - Interventional"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let table = empty(EntityKind::ProviderType);
        for raw in ["np", "nurse practitioner", "Locum tenens", "CRNA", "md"] {
            let once = normalize_value(raw, EntityKind::ProviderType, "s", &table);
            let twice = normalize_value(&once, EntityKind::ProviderType, "s", &table);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }
}
