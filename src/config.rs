// Static configuration for the pipeline: header alias tables, currency
// symbol tables, and the status threshold bands.
//
// Everything here is immutable after construction and passed explicitly
// into the components that need it; the `Lazy` statics only cache the
// standard tables so callers without special needs share one copy.
use once_cell::sync::Lazy;

use crate::types::{CanonicalField, CostStatus};

/// Known header spellings per canonical field, stored pre-normalized
/// (lower-case, separators stripped, accents folded). Controlling
/// exports mix German and English labels, so both are listed.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

impl AliasTable {
    pub fn standard() -> Self {
        let raw: [(CanonicalField, &[&str]); 11] = [
            (
                CanonicalField::ProjectName,
                &[
                    "projekt",
                    "project",
                    "projektname",
                    "project_name",
                    "name",
                    "projektbezeichnung",
                    "bezeichnung",
                    "task",
                    "aufgabe",
                    "projektnummer",
                    "project_no",
                    "proj",
                    "psp",
                    "wbs",
                ],
            ),
            (
                CanonicalField::CostPlan,
                &[
                    "plan",
                    "budget",
                    "geplant",
                    "baseline",
                    "planned",
                    "soll",
                    "kosten_plan",
                    "cost_plan",
                    "planned_cost",
                    "budget_cost",
                    "baseline_cost",
                    "plan_cost",
                    "soll_kosten",
                    "plankosten",
                ],
            ),
            (
                CanonicalField::CostActual,
                &[
                    "ist",
                    "actual",
                    "tatsächlich",
                    "aktuell",
                    "current",
                    "kosten_ist",
                    "cost_actual",
                    "actual_cost",
                    "ist_kosten",
                    "istkosten",
                    "tatsaechlich",
                    "real",
                    "effective",
                ],
            ),
            (
                CanonicalField::CostForecast,
                &[
                    "forecast",
                    "prognose",
                    "hochrechnung",
                    "projection",
                    "estimate",
                    "eac",
                    "estimate_at_completion",
                    "vorschau",
                ],
            ),
            (
                CanonicalField::DatePlan,
                &[
                    "termin_plan",
                    "plan_date",
                    "planned_date",
                    "soll_termin",
                    "baseline_date",
                    "start",
                    "end",
                    "finish",
                    "deadline",
                    "plan_ende",
                    "geplantes_ende",
                ],
            ),
            (
                CanonicalField::DateActual,
                &[
                    "termin_ist",
                    "actual_date",
                    "ist_termin",
                    "tatsächlich",
                    "completion_date",
                    "abschluss",
                    "fertigstellung",
                ],
            ),
            (
                CanonicalField::Status,
                &[
                    "status",
                    "state",
                    "zustand",
                    "phase",
                    "stage",
                    "projektstatus",
                    "project_status",
                ],
            ),
            (
                CanonicalField::Owner,
                &[
                    "verantwortlich",
                    "owner",
                    "manager",
                    "pm",
                    "projektleiter",
                    "project_manager",
                    "responsible",
                    "lead",
                    "leiter",
                ],
            ),
            (
                CanonicalField::Department,
                &[
                    "abteilung",
                    "department",
                    "bereich",
                    "org",
                    "organization",
                    "unit",
                    "team",
                    "gruppe",
                    "division",
                ],
            ),
            (
                CanonicalField::Priority,
                &["priorität", "priority", "prio", "wichtigkeit", "importance"],
            ),
            (
                CanonicalField::Risk,
                &["risiko", "risk", "gefahr", "threat", "risk_level"],
            ),
        ];

        let entries = raw
            .into_iter()
            .map(|(field, aliases)| {
                (
                    field,
                    aliases.iter().map(|a| normalize_token(a)).collect(),
                )
            })
            .collect();
        AliasTable { entries }
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, a)| a.as_slice())
            .unwrap_or(&[])
    }

    /// Register an extra spelling for a field (normalized on insert).
    pub fn add_alias(&mut self, field: CanonicalField, alias: &str) {
        if let Some((_, aliases)) = self.entries.iter_mut().find(|(f, _)| *f == field) {
            aliases.push(normalize_token(alias));
        }
    }
}

/// Normalize a header or alias for comparison: lower-case, drop
/// `_`/`-`/space separators, fold umlauts and common Latin accents.
pub fn normalize_token(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.to_lowercase().chars() {
        match c {
            '_' | '-' | ' ' => {}
            'ä' => out.push('a'),
            'ö' => out.push('o'),
            'ü' => out.push('u'),
            'ß' => out.push_str("ss"),
            'á' | 'à' | 'â' => out.push('a'),
            'é' | 'è' | 'ê' => out.push('e'),
            'í' | 'ì' | 'î' => out.push('i'),
            'ó' | 'ò' | 'ô' => out.push('o'),
            'ú' | 'ù' | 'û' => out.push('u'),
            c => out.push(c),
        }
    }
    out
}

/// Currency spellings stripped before numeric parsing, per ISO code.
/// Order matters: symbols are removed in table order, case-sensitively.
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    entries: Vec<(&'static str, Vec<&'static str>)>,
}

impl CurrencyTable {
    pub fn standard() -> Self {
        CurrencyTable {
            entries: vec![
                ("EUR", vec!["€", "EUR", "Euro"]),
                ("USD", vec!["$", "USD", "Dollar"]),
                ("GBP", vec!["£", "GBP", "Pound"]),
                ("CHF", vec!["CHF", "Franken"]),
                ("JPY", vec!["¥", "JPY", "Yen"]),
            ],
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().flat_map(|(_, syms)| syms.iter().copied())
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(code, _)| *code)
    }
}

pub static STANDARD_ALIASES: Lazy<AliasTable> = Lazy::new(AliasTable::standard);
pub static STANDARD_CURRENCIES: Lazy<CurrencyTable> = Lazy::new(CurrencyTable::standard);

// Mapper scoring constants. A header is accepted for a field only when
// its best score clears ACCEPT_THRESHOLD.
pub const EXACT_SCORE: f64 = 100.0;
pub const SUBSTRING_SCORE: f64 = 70.0;
pub const ACCEPT_THRESHOLD: f64 = 50.0;
pub const FUZZY_CUTOFF: f64 = 0.6;

// Threshold bands on deviation_percent, ordered highest-severity-first.
// A record falls into the first band whose lower bound it exceeds.
pub const FIVE_BAND_THRESHOLDS: [(f64, CostStatus); 4] = [
    (15.0, CostStatus::Critical),
    (10.0, CostStatus::AtRisk),
    (5.0, CostStatus::Warning),
    (-5.0, CostStatus::OnTrack),
];
pub const FIVE_BAND_FALLBACK: CostStatus = CostStatus::UnderBudget;

pub const THREE_BAND_THRESHOLDS: [(f64, CostStatus); 2] = [
    (10.0, CostStatus::Critical),
    (5.0, CostStatus::Warning),
];
pub const THREE_BAND_FALLBACK: CostStatus = CostStatus::OnTrack;
