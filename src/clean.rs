// Validation and cleaning pipeline.
//
// Applies a field mapping across a whole dataset, parsing every mapped
// column through the value parser and collecting a structured report.
// Only fully-empty rows are removed; rows with missing or unparseable
// cells are retained and consumers must tolerate the markers.
use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::CurrencyTable;
use crate::parse::{parse_date, parse_number, parse_text};
use crate::types::{
    CanonicalField, CellValue, FieldMapping, ParsedRecord, RawDataset, ValidationReport,
};

/// Canonical fields a dataset needs for cost analysis.
pub const REQUIRED_FIELDS: [CanonicalField; 3] = [
    CanonicalField::ProjectName,
    CanonicalField::CostPlan,
    CanonicalField::CostActual,
];

/// Clean one dataset under the given mapping.
///
/// Never fails: a dataset missing required fields still parses, with the
/// gap surfaced as a report issue so the caller can decide what to do.
pub fn clean_dataset(
    data: &RawDataset,
    mapping: &FieldMapping,
    currencies: &CurrencyTable,
) -> (Vec<ParsedRecord>, ValidationReport) {
    let mut report = ValidationReport {
        total_rows: data.rows.len(),
        ..ValidationReport::default()
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|f| !mapping.contains(**f))
        .map(|f| f.key())
        .collect();
    if !missing.is_empty() {
        report
            .issues
            .push(format!("missing required fields: {}", missing.join(", ")));
        warn!(
            dataset = %data.name,
            missing = %missing.join(", "),
            "dataset is missing required fields"
        );
    }

    let mut records = Vec::with_capacity(data.rows.len());
    let mut unparseable: BTreeMap<CanonicalField, usize> = BTreeMap::new();

    for (idx, row) in data.rows.iter().enumerate() {
        if data.row_is_empty(row) {
            report.removed_rows += 1;
            continue;
        }

        let mut record = ParsedRecord::empty(idx, row.clone());
        for field in CanonicalField::ALL {
            let Some(header) = mapping.get(field) else {
                continue;
            };
            let cell = data.cell(row, header);
            if field.is_cost() {
                let parsed = parse_number(cell, currencies);
                if parsed.is_unparseable() {
                    *unparseable.entry(field).or_insert(0) += 1;
                }
                match field {
                    CanonicalField::CostPlan => record.cost_plan = parsed,
                    CanonicalField::CostActual => record.cost_actual = parsed,
                    _ => record.cost_forecast = parsed,
                }
            } else if field.is_date() {
                let parsed = parse_date(cell);
                if parsed.is_unparseable() {
                    *unparseable.entry(field).or_insert(0) += 1;
                }
                match field {
                    CanonicalField::DatePlan => record.date_plan = parsed,
                    _ => record.date_actual = parsed,
                }
            } else {
                let text = parse_text(cell);
                match field {
                    CanonicalField::ProjectName => record.project_name = text,
                    CanonicalField::Status => record.status = text,
                    CanonicalField::Owner => record.owner = text,
                    CanonicalField::Department => record.department = text,
                    CanonicalField::Priority => record.priority = text,
                    _ => record.risk = text,
                }
            }
        }
        records.push(record);
    }

    // One warning per affected column, in canonical priority order.
    for (field, count) in &unparseable {
        let header = mapping.get(*field).unwrap_or("?");
        report.warnings.push(format!(
            "{} cells with unparseable values in '{}' (column: {})",
            count,
            header,
            field.key()
        ));
    }

    if report.removed_rows > 0 {
        report.infos.push(format!(
            "{} entirely empty rows removed",
            report.removed_rows
        ));
    }
    report.cleaned_rows = records.len();

    info!(
        dataset = %data.name,
        total = report.total_rows,
        cleaned = report.cleaned_rows,
        removed = report.removed_rows,
        warnings = report.warnings.len(),
        "dataset cleaned"
    );

    (records, report)
}

/// Convenience check used by summarizers: a dataset's rows with the
/// fully-empty ones dropped, leaving cell values untouched.
pub fn non_empty_rows(data: &RawDataset) -> Vec<BTreeMap<String, CellValue>> {
    data.rows
        .iter()
        .filter(|row| !data.row_is_empty(row))
        .cloned()
        .collect()
}
