// Semantic header detection.
//
// Maps arbitrary source headers onto the canonical fields by scoring
// each unused header against the alias table. Assignment is greedy and
// strictly order-dependent: fields are visited in the fixed priority
// order of `CanonicalField::ALL`, and a claimed header is unavailable to
// every later field. This is reproducible but not globally optimal; see
// DESIGN.md for the open question on bipartite assignment.
use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::config::{
    normalize_token, AliasTable, ACCEPT_THRESHOLD, EXACT_SCORE, FUZZY_CUTOFF, SUBSTRING_SCORE,
};
use crate::types::{CanonicalField, FieldMapping};

/// Predefined column mapping for a named source system (SAP export,
/// MS Project, ...). Hints win over auto-detection per field; the
/// mapper fills whatever the hints leave open.
#[derive(Debug, Clone, Default)]
pub struct MappingHints {
    pub source_system: String,
    pub columns: BTreeMap<CanonicalField, String>,
}

impl MappingHints {
    pub fn new(source_system: impl Into<String>) -> Self {
        MappingHints {
            source_system: source_system.into(),
            columns: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: CanonicalField, header: impl Into<String>) -> Self {
        self.columns.insert(field, header.into());
        self
    }
}

/// Detect a field mapping for the given headers. Never fails; fields
/// without an acceptable header are simply absent from the result.
pub fn detect_mapping(headers: &[String], aliases: &AliasTable) -> FieldMapping {
    auto_fill(FieldMapping::default(), headers, aliases)
}

/// Detect a mapping with explicit hints applied first.
///
/// A hint is honored only when its header actually exists in the
/// dataset; stale hints fall through to auto-detection.
pub fn detect_mapping_with_hints(
    headers: &[String],
    hints: &MappingHints,
    aliases: &AliasTable,
) -> FieldMapping {
    let mut mapping = FieldMapping::default();
    for (field, header) in &hints.columns {
        if headers.iter().any(|h| h == header) && !mapping.claims_header(header) {
            mapping.insert(*field, header.clone());
        }
    }
    auto_fill(mapping, headers, aliases)
}

fn auto_fill(mut mapping: FieldMapping, headers: &[String], aliases: &AliasTable) -> FieldMapping {
    let mut used: HashSet<&String> = headers
        .iter()
        .filter(|h| mapping.claims_header(h.as_str()))
        .collect();

    let normalized: Vec<String> = headers.iter().map(|h| normalize_token(h)).collect();

    for field in CanonicalField::ALL {
        if mapping.contains(field) {
            continue;
        }
        let candidates = aliases.aliases(field);
        if let Some(idx) = best_header(headers, &normalized, &used, candidates) {
            mapping.insert(field, headers[idx].clone());
            used.insert(&headers[idx]);
        }
    }
    mapping
}

/// Pick the unused header with the best score for this field's aliases,
/// or `None` when nothing clears the acceptance threshold. Ties resolve
/// to the earliest header in input column order.
fn best_header(
    headers: &[String],
    normalized: &[String],
    used: &HashSet<&String>,
    aliases: &[String],
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, header) in headers.iter().enumerate() {
        if used.contains(header) {
            continue;
        }
        let norm = &normalized[idx];
        if norm.is_empty() {
            continue;
        }

        // Exact alias match is final; stop scanning further columns.
        if aliases.iter().any(|a| a == norm) {
            return Some(idx);
        }

        let score = header_score(norm, aliases);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((idx, score));
        }
    }

    best.filter(|(_, score)| *score > ACCEPT_THRESHOLD)
        .map(|(idx, _)| idx)
}

fn header_score(norm: &str, aliases: &[String]) -> f64 {
    let mut score: f64 = 0.0;
    for alias in aliases {
        let sim = strsim::normalized_levenshtein(norm, alias);
        if sim >= FUZZY_CUTOFF {
            score = score.max(sim * EXACT_SCORE);
        }
    }
    if aliases
        .iter()
        .any(|a| norm.contains(a.as_str()) || a.contains(norm))
    {
        score = score.max(SUBSTRING_SCORE);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AliasTable;

    fn headers(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn detect(labels: &[&str]) -> FieldMapping {
        detect_mapping(&headers(labels), &AliasTable::standard())
    }

    #[test]
    fn exact_aliases_map_case_and_separator_insensitively() {
        let m = detect(&["Projekt-Name", "Kosten_Plan", "KOSTEN IST"]);
        assert_eq!(m.get(CanonicalField::ProjectName), Some("Projekt-Name"));
        assert_eq!(m.get(CanonicalField::CostPlan), Some("Kosten_Plan"));
        assert_eq!(m.get(CanonicalField::CostActual), Some("KOSTEN IST"));
    }

    #[test]
    fn claimed_headers_are_exclusive() {
        // "Plan" matches cost_plan exactly; date_plan must not reuse it.
        let m = detect(&["Projekt", "Plan"]);
        assert_eq!(m.get(CanonicalField::CostPlan), Some("Plan"));
        assert_eq!(m.get(CanonicalField::DatePlan), None);
    }

    #[test]
    fn priority_order_wins_over_column_order() {
        // Fields are assigned in priority order, so each header lands on
        // its own field even though the cost columns come first.
        let m = detect(&["Istkosten", "Plankosten", "Name"]);
        assert_eq!(m.get(CanonicalField::ProjectName), Some("Name"));
        assert_eq!(m.get(CanonicalField::CostPlan), Some("Plankosten"));
        assert_eq!(m.get(CanonicalField::CostActual), Some("Istkosten"));
    }

    #[test]
    fn substring_containment_scores_seventy() {
        let m = detect(&["Gesamtbudget 2024"]);
        // "gesamtbudget2024" contains the alias "budget".
        assert_eq!(m.get(CanonicalField::CostPlan), Some("Gesamtbudget 2024"));
    }

    #[test]
    fn umlaut_headers_fold_onto_aliases() {
        let m = detect(&["Priorität", "Verantwortlich"]);
        assert_eq!(m.get(CanonicalField::Priority), Some("Priorität"));
        assert_eq!(m.get(CanonicalField::Owner), Some("Verantwortlich"));
    }

    #[test]
    fn unrelated_headers_stay_unmapped() {
        let m = detect(&["Zeilennummer", "XYZ"]);
        assert!(m.is_empty());
    }

    #[test]
    fn custom_aliases_extend_the_table() {
        let labels = headers(&["Kalkulation"]);
        assert!(detect_mapping(&labels, &AliasTable::standard()).is_empty());

        let mut table = AliasTable::standard();
        table.add_alias(CanonicalField::CostPlan, "Kalkulation");
        let m = detect_mapping(&labels, &table);
        assert_eq!(m.get(CanonicalField::CostPlan), Some("Kalkulation"));
    }

    #[test]
    fn hints_win_per_field_and_mapper_fills_the_rest() {
        let labels = headers(&["Projektdefinition", "Plankosten", "Istkosten"]);
        let hints = MappingHints::new("sap")
            .with(CanonicalField::ProjectName, "Projektdefinition")
            // Stale hint: header not present, auto-detection takes over.
            .with(CanonicalField::CostActual, "Istwert");
        let m = detect_mapping_with_hints(&labels, &hints, &AliasTable::standard());
        assert_eq!(
            m.get(CanonicalField::ProjectName),
            Some("Projektdefinition")
        );
        assert_eq!(m.get(CanonicalField::CostPlan), Some("Plankosten"));
        assert_eq!(m.get(CanonicalField::CostActual), Some("Istkosten"));
    }

    #[test]
    fn hinted_header_is_claimed_before_auto_detection() {
        // Without the hint, "Name" would go to project_name; the hint
        // reserves it for owner, and project_name finds nothing else.
        let labels = headers(&["Name"]);
        let hints = MappingHints::new("custom").with(CanonicalField::Owner, "Name");
        let m = detect_mapping_with_hints(&labels, &hints, &AliasTable::standard());
        assert_eq!(m.get(CanonicalField::Owner), Some("Name"));
        assert_eq!(m.get(CanonicalField::ProjectName), None);
    }
}
