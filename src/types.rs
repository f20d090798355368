use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// One raw cell as delivered by the ingestion boundary.
///
/// Exports arrive with heterogeneous cell types at the same logical
/// position across rows (a cost column may hold numbers, formatted
/// strings, and blanks). The variant is carried as-is; `parse` is the
/// single boundary that turns it into a canonical typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

impl CellValue {
    /// Blank means "nothing was exported here": null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Stringified, trimmed view of the cell; `None` for blanks.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            CellValue::Number(n) => Some(format!("{}", n)),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            CellValue::Null => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

/// A single row keyed by source header label.
pub type Row = BTreeMap<String, CellValue>;

/// One tabular export as handed over by the upstream file reader.
///
/// Headers keep their source order and are unique within a dataset;
/// cells missing from a row are treated as `Null`.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl RawDataset {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        RawDataset {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn cell<'a>(&'a self, row: &'a Row, header: &str) -> &'a CellValue {
        row.get(header).unwrap_or(&CellValue::Null)
    }

    /// A row counts as empty when every header position is blank.
    pub fn row_is_empty(&self, row: &Row) -> bool {
        self.headers.iter().all(|h| self.cell(row, h).is_blank())
    }
}

/// The fixed semantic roles source columns are mapped onto.
///
/// Declaration order is the mapper's priority order; the greedy
/// assignment walks this list, not the input column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ProjectName,
    CostPlan,
    CostActual,
    CostForecast,
    DatePlan,
    DateActual,
    Status,
    Owner,
    Department,
    Priority,
    Risk,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::ProjectName,
        CanonicalField::CostPlan,
        CanonicalField::CostActual,
        CanonicalField::CostForecast,
        CanonicalField::DatePlan,
        CanonicalField::DateActual,
        CanonicalField::Status,
        CanonicalField::Owner,
        CanonicalField::Department,
        CanonicalField::Priority,
        CanonicalField::Risk,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::ProjectName => "project_name",
            CanonicalField::CostPlan => "cost_plan",
            CanonicalField::CostActual => "cost_actual",
            CanonicalField::CostForecast => "cost_forecast",
            CanonicalField::DatePlan => "date_plan",
            CanonicalField::DateActual => "date_actual",
            CanonicalField::Status => "status",
            CanonicalField::Owner => "owner",
            CanonicalField::Department => "department",
            CanonicalField::Priority => "priority",
            CanonicalField::Risk => "risk",
        }
    }

    pub fn is_cost(&self) -> bool {
        matches!(
            self,
            CanonicalField::CostPlan | CanonicalField::CostActual | CanonicalField::CostForecast
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(self, CanonicalField::DatePlan | CanonicalField::DateActual)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Resolved association from canonical field to a source header.
///
/// Invariant: a header is claimed by at most one canonical field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldMapping {
    pub columns: BTreeMap<CanonicalField, String>,
}

impl FieldMapping {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(|s| s.as_str())
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn insert(&mut self, field: CanonicalField, header: impl Into<String>) {
        self.columns.insert(field, header.into());
    }

    pub fn claims_header(&self, header: &str) -> bool {
        self.columns.values().any(|h| h == header)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Tri-state outcome of a cell parse.
///
/// `Unparseable` is distinct from both a valid zero and an absent cell:
/// it means a value was exported but could not be converted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parsed<T> {
    Value(T),
    Missing,
    Unparseable,
}

impl<T> Parsed<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Parsed::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Parsed::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Parsed::Value(_))
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, Parsed::Unparseable)
    }
}

impl Parsed<f64> {
    /// Nulls and unparseable cells count as 0 in aggregate sums.
    pub fn or_zero(&self) -> f64 {
        match self {
            Parsed::Value(v) => *v,
            _ => 0.0,
        }
    }
}

impl<T: Serialize> Serialize for Parsed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Parsed::Value(v) => v.serialize(serializer),
            Parsed::Missing => serializer.serialize_none(),
            Parsed::Unparseable => serializer.serialize_str("unparseable"),
        }
    }
}

/// Risk classification bands derived from `deviation_percent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostStatus {
    Critical,
    AtRisk,
    Warning,
    OnTrack,
    UnderBudget,
}

impl CostStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CostStatus::Critical => "Critical",
            CostStatus::AtRisk => "At-Risk",
            CostStatus::Warning => "Warning",
            CostStatus::OnTrack => "On-Track",
            CostStatus::UnderBudget => "Under-Budget",
        }
    }
}

impl fmt::Display for CostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for CostStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One row after mapping and parsing, with the original raw row kept
/// for traceability. Derived fields are filled by the analytics engine.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedRecord {
    pub row_index: usize,
    pub project_name: Option<String>,
    pub cost_plan: Parsed<f64>,
    pub cost_actual: Parsed<f64>,
    pub cost_forecast: Parsed<f64>,
    pub date_plan: Parsed<NaiveDate>,
    pub date_actual: Parsed<NaiveDate>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub department: Option<String>,
    pub priority: Option<String>,
    pub risk: Option<String>,
    pub deviation_absolute: f64,
    pub deviation_percent: f64,
    pub status_category: Option<CostStatus>,
    pub schedule_delay_days: Option<f64>,
    pub raw: Row,
}

impl ParsedRecord {
    pub fn empty(row_index: usize, raw: Row) -> Self {
        ParsedRecord {
            row_index,
            project_name: None,
            cost_plan: Parsed::Missing,
            cost_actual: Parsed::Missing,
            cost_forecast: Parsed::Missing,
            date_plan: Parsed::Missing,
            date_actual: Parsed::Missing,
            status: None,
            owner: None,
            department: None,
            priority: None,
            risk: None,
            deviation_absolute: 0.0,
            deviation_percent: 0.0,
            status_category: None,
            schedule_delay_days: None,
            raw,
        }
    }
}

/// Outcome of running the validation/cleaning pipeline over one dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub cleaned_rows: usize,
    pub removed_rows: usize,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub infos: Vec<String>,
}

impl ValidationReport {
    /// Issues mark the dataset as incomplete for analysis; the caller
    /// decides whether to proceed anyway.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Aggregate statistics over a set of parsed records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectSummary {
    pub total_projects: usize,
    pub projects_over_budget: usize,
    pub projects_critical: usize,
    pub projects_warning: usize,
    pub projects_on_track: usize,
    pub total_cost_plan: f64,
    pub total_cost_actual: f64,
    pub total_deviation: f64,
    pub total_deviation_percent: f64,
    pub avg_deviation_percent: f64,
    pub max_deviation_percent: f64,
    pub min_deviation_percent: f64,
    pub avg_schedule_delay_days: f64,
}

/// One entry of a top-N ranking, in the shape downstream report
/// consumers expect.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProject {
    pub rank: usize,
    pub project_name: String,
    pub cost_plan: f64,
    pub cost_actual: f64,
    pub deviation_percent: f64,
    pub status_category: Option<CostStatus>,
}

/// Full analysis output: summary, rankings, status distribution and the
/// detailed records with derived fields filled in.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalysis {
    pub summary: ProjectSummary,
    pub top_risk_projects: Vec<RankedProject>,
    pub top_performers: Vec<RankedProject>,
    /// Status label → count, in first-seen record order.
    pub status_distribution: Vec<(String, usize)>,
    pub records: Vec<ParsedRecord>,
}
