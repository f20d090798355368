// Multi-source integration.
//
// Several exports describing one project from different angles
// (resourcing, actuals, work breakdown, forecast) are classified by
// their headers, summarized per category, and reconciled into one
// cross-source financial view keyed by the shared project id.
//
// Integration is all-or-nothing: a project-id conflict aborts with an
// error and no partial result. Missing categories degrade gracefully;
// their block is simply absent.
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::clean::non_empty_rows;
use crate::config::{normalize_token, CurrencyTable};
use crate::error::IntegrationError;
use crate::parse::{parse_date, parse_number, parse_percent};
use crate::types::{CellValue, RawDataset, Row};
use crate::util::average;

/// Recognized dataset categories plus the unknown fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    ResourceMonthly,
    ResourceByWorkPackage,
    ActualCost,
    WorkPackage,
    Forecast,
    Unknown,
}

impl DatasetKind {
    pub fn key(&self) -> &'static str {
        match self {
            DatasetKind::ResourceMonthly => "resource_monthly",
            DatasetKind::ResourceByWorkPackage => "resource_by_work_package",
            DatasetKind::ActualCost => "actual_cost",
            DatasetKind::WorkPackage => "work_package",
            DatasetKind::Forecast => "forecast",
            DatasetKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The cleaned table of one recognized source plus its summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceBlock<S> {
    pub rows: Vec<Row>,
    pub summary: S,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceMonthlySummary {
    pub months: usize,
    pub avg_staffing: f64,
    pub peak_staffing: f64,
    pub peak_month: Option<NaiveDate>,
    pub total_hours: f64,
    pub total_cost_plan: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkPackageResourceTotals {
    pub resources: f64,
    pub hours: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActualCostSummary {
    pub total_actual: f64,
    /// Per-month actuals, ascending by month.
    pub monthly_actual: Vec<(NaiveDate, f64)>,
    pub by_category: BTreeMap<String, f64>,
    /// Average of the per-month totals.
    pub burn_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkPackageSummary {
    pub total_packages: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub total_budget: f64,
    pub total_actual: f64,
    pub avg_progress: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastSummary {
    pub total_forecast: f64,
    pub periods: usize,
    pub avg_confidence: f64,
}

/// Reconciled financial view over everything the sources contributed.
#[derive(Debug, Clone, Serialize)]
pub struct CrossSourceSummary {
    pub project_id: String,
    pub data_sources: usize,
    pub total_budget: f64,
    pub total_actual: f64,
    pub total_forecast: f64,
    pub projected_total: f64,
    pub deviation: f64,
    pub deviation_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_rate: Option<f64>,
    /// `None` when no burn rate exists or the burn rate is 0 (runway is
    /// then not computable, never a division fault).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_runway_months: Option<f64>,
}

/// All recognized source blocks of one project plus the cross-source
/// summary.
#[derive(Debug, Clone, Serialize)]
pub struct IntegratedProject {
    pub project_id: String,
    pub sources: Vec<DatasetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_monthly: Option<SourceBlock<ResourceMonthlySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_by_work_package:
        Option<SourceBlock<BTreeMap<String, WorkPackageResourceTotals>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<SourceBlock<ActualCostSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_package: Option<SourceBlock<WorkPackageSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<SourceBlock<ForecastSummary>>,
    pub summary: CrossSourceSummary,
}

// Header token groups for classification and column location. Tokens
// are matched against normalized headers by containment; a leading `=`
// demands an exact match (short tokens like "ap" would otherwise fire
// inside unrelated words).
const STAFF_TOKENS: &[&str] = &["mitarbeiter", "staff", "headcount", "fte"];
const MONTH_TOKENS: &[&str] = &["monat", "month"];
const WORK_PACKAGE_TOKENS: &[&str] = &["arbeitspaket", "workpackage", "package", "apname", "=ap"];
const RESOURCE_TOKENS: &[&str] = &["ressourcen", "resource"];
const CATEGORY_TOKENS: &[&str] = &["kategorie", "category"];
const PROGRESS_TOKENS: &[&str] = &["fortschritt", "progress"];
const FORECAST_TOKENS: &[&str] = &["forecast", "prognose"];
const QUARTER_TOKENS: &[&str] = &["quartal", "quarter"];
const HOURS_TOKENS: &[&str] = &["stunden", "hours"];
const COST_TOKENS: &[&str] = &["kosten", "cost"];
const BUDGET_TOKENS: &[&str] = &["budget"];
const STATUS_TOKENS: &[&str] = &["status"];
const CONFIDENCE_TOKENS: &[&str] = &["konfidenz", "confidence"];
const WP_ACTUAL_TOKENS: &[&str] = &["=ist", "istkosten", "actual"];

fn matches_token(norm: &str, token: &str) -> bool {
    match token.strip_prefix('=') {
        Some(exact) => norm == exact,
        None => norm.contains(token),
    }
}

fn find_header<'a>(data: &'a RawDataset, tokens: &[&str]) -> Option<&'a str> {
    data.headers.iter().map(String::as_str).find(|h| {
        let norm = normalize_token(h);
        tokens.iter().any(|t| matches_token(&norm, t))
    })
}

/// Header naming actual costs: "ist" and "kosten" (or "actual" and
/// "cost") must co-occur in the same label.
fn find_actual_cost_header(data: &RawDataset) -> Option<&str> {
    data.headers.iter().map(String::as_str).find(|h| {
        let n = normalize_token(h);
        (n.contains("ist") && n.contains("kosten")) || (n.contains("actual") && n.contains("cost"))
    })
}

/// Assign exactly one category per dataset. Rules run in fixed priority
/// order; the first match wins.
pub fn classify_dataset(data: &RawDataset) -> DatasetKind {
    let has = |tokens: &[&str]| find_header(data, tokens).is_some();

    if has(STAFF_TOKENS) && has(MONTH_TOKENS) && !has(WORK_PACKAGE_TOKENS) {
        return DatasetKind::ResourceMonthly;
    }
    if has(WORK_PACKAGE_TOKENS) && has(RESOURCE_TOKENS) {
        return DatasetKind::ResourceByWorkPackage;
    }
    if find_actual_cost_header(data).is_some() && has(CATEGORY_TOKENS) {
        return DatasetKind::ActualCost;
    }
    if has(STATUS_TOKENS) && has(PROGRESS_TOKENS) {
        return DatasetKind::WorkPackage;
    }
    if has(FORECAST_TOKENS) && has(QUARTER_TOKENS) {
        return DatasetKind::Forecast;
    }
    DatasetKind::Unknown
}

/// Find the join key: the first-row value of a header containing both a
/// project token and an id token.
pub fn extract_project_id(data: &RawDataset) -> Option<String> {
    let header = data.headers.iter().find(|h| {
        let l = h.to_lowercase();
        (l.contains("projekt") || l.contains("project")) && l.contains("id")
    })?;
    let row = data.rows.first()?;
    data.cell(row, header).as_text()
}

fn cell<'a>(row: &'a Row, header: Option<&str>) -> &'a CellValue {
    header
        .and_then(|h| row.get(h))
        .unwrap_or(&CellValue::Null)
}

fn summarize_resource_monthly(
    data: &RawDataset,
    currencies: &CurrencyTable,
) -> SourceBlock<ResourceMonthlySummary> {
    let rows = non_empty_rows(data);
    let staff_col = find_header(data, STAFF_TOKENS);
    let month_col = find_header(data, MONTH_TOKENS);
    let hours_col = find_header(data, HOURS_TOKENS);
    let cost_col = find_header(data, COST_TOKENS);

    let mut staffing: Vec<f64> = Vec::new();
    let mut peak: Option<(f64, Option<NaiveDate>)> = None;
    let mut total_hours = 0.0;
    let mut total_cost_plan = 0.0;

    for row in &rows {
        if let Some(v) = parse_number(cell(row, staff_col), currencies).into_value() {
            staffing.push(v);
            if peak.map_or(true, |(p, _)| v > p) {
                peak = Some((v, parse_date(cell(row, month_col)).into_value()));
            }
        }
        total_hours += parse_number(cell(row, hours_col), currencies).or_zero();
        total_cost_plan += parse_number(cell(row, cost_col), currencies).or_zero();
    }

    let summary = ResourceMonthlySummary {
        months: rows.len(),
        avg_staffing: average(&staffing),
        peak_staffing: peak.map_or(0.0, |(p, _)| p),
        peak_month: peak.and_then(|(_, m)| m),
        total_hours,
        total_cost_plan,
    };
    SourceBlock { rows, summary }
}

fn summarize_resource_by_work_package(
    data: &RawDataset,
    currencies: &CurrencyTable,
) -> SourceBlock<BTreeMap<String, WorkPackageResourceTotals>> {
    let rows = non_empty_rows(data);
    let name_col = find_header(data, WORK_PACKAGE_TOKENS);
    let resource_col = find_header(data, RESOURCE_TOKENS);
    let hours_col = find_header(data, HOURS_TOKENS);
    let cost_col = find_header(data, COST_TOKENS);

    let mut summary: BTreeMap<String, WorkPackageResourceTotals> = BTreeMap::new();
    for row in &rows {
        let name = cell(row, name_col)
            .as_text()
            .unwrap_or_else(|| "Unknown".to_string());
        let entry = summary.entry(name).or_default();
        entry.resources += parse_number(cell(row, resource_col), currencies).or_zero();
        entry.hours += parse_number(cell(row, hours_col), currencies).or_zero();
        entry.cost += parse_number(cell(row, cost_col), currencies).or_zero();
    }
    SourceBlock { rows, summary }
}

fn summarize_actual_cost(
    data: &RawDataset,
    currencies: &CurrencyTable,
) -> SourceBlock<ActualCostSummary> {
    let rows = non_empty_rows(data);
    let cost_col = find_actual_cost_header(data);
    let month_col = find_header(data, MONTH_TOKENS);
    let category_col = find_header(data, CATEGORY_TOKENS);

    let mut total_actual = 0.0;
    let mut monthly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();

    for row in &rows {
        let amount = parse_number(cell(row, cost_col), currencies).or_zero();
        total_actual += amount;
        if let Some(month) = parse_date(cell(row, month_col)).into_value() {
            *monthly.entry(month).or_insert(0.0) += amount;
        }
        if let Some(category) = cell(row, category_col).as_text() {
            *by_category.entry(category).or_insert(0.0) += amount;
        }
    }

    let monthly_totals: Vec<f64> = monthly.values().copied().collect();
    let summary = ActualCostSummary {
        total_actual,
        monthly_actual: monthly.into_iter().collect(),
        by_category,
        burn_rate: average(&monthly_totals),
    };
    SourceBlock { rows, summary }
}

fn summarize_work_package(
    data: &RawDataset,
    currencies: &CurrencyTable,
) -> SourceBlock<WorkPackageSummary> {
    let rows = non_empty_rows(data);
    let status_col = find_header(data, STATUS_TOKENS);
    let progress_col = find_header(data, PROGRESS_TOKENS);
    let budget_col = find_header(data, BUDGET_TOKENS);
    let actual_col = find_header(data, WP_ACTUAL_TOKENS);

    let mut summary = WorkPackageSummary {
        total_packages: rows.len(),
        ..WorkPackageSummary::default()
    };
    let mut progress: Vec<f64> = Vec::new();

    for row in &rows {
        match cell(row, status_col)
            .as_text()
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("done") | Some("abgeschlossen") => summary.completed += 1,
            Some("in progress") | Some("in arbeit") => summary.in_progress += 1,
            Some("not started") | Some("offen") => summary.not_started += 1,
            _ => {}
        }
        summary.total_budget += parse_number(cell(row, budget_col), currencies).or_zero();
        summary.total_actual += parse_number(cell(row, actual_col), currencies).or_zero();
        if let Some(p) = parse_percent(cell(row, progress_col), currencies).into_value() {
            progress.push(p);
        }
    }
    summary.avg_progress = average(&progress);
    SourceBlock { rows, summary }
}

fn summarize_forecast(
    data: &RawDataset,
    currencies: &CurrencyTable,
) -> SourceBlock<ForecastSummary> {
    let rows = non_empty_rows(data);
    let forecast_col = find_header(data, FORECAST_TOKENS);
    let confidence_col = find_header(data, CONFIDENCE_TOKENS);

    let mut total_forecast = 0.0;
    let mut confidence: Vec<f64> = Vec::new();
    for row in &rows {
        total_forecast += parse_number(cell(row, forecast_col), currencies).or_zero();
        if let Some(c) = parse_percent(cell(row, confidence_col), currencies).into_value() {
            confidence.push(c);
        }
    }

    let summary = ForecastSummary {
        total_forecast,
        periods: rows.len(),
        avg_confidence: average(&confidence),
    };
    SourceBlock { rows, summary }
}

/// Classify, summarize and reconcile a set of source datasets.
///
/// When two datasets claim the same category the later one wins. Each
/// category is optional; the cross-source summary works with whatever
/// is present.
pub fn integrate(
    datasets: &[RawDataset],
    currencies: &CurrencyTable,
) -> Result<IntegratedProject, IntegrationError> {
    let mut project_id: Option<String> = None;
    let mut sources: Vec<DatasetKind> = Vec::new();

    let mut resource_monthly_ds: Option<&RawDataset> = None;
    let mut resource_by_wp_ds: Option<&RawDataset> = None;
    let mut actual_cost_ds: Option<&RawDataset> = None;
    let mut work_package_ds: Option<&RawDataset> = None;
    let mut forecast_ds: Option<&RawDataset> = None;

    for ds in datasets {
        let kind = classify_dataset(ds);
        info!(dataset = %ds.name, kind = %kind, "classified source dataset");

        if let Some(pid) = extract_project_id(ds) {
            match &project_id {
                None => project_id = Some(pid),
                Some(existing) if *existing != pid => {
                    return Err(IntegrationError::ProjectIdMismatch {
                        first: existing.clone(),
                        second: pid,
                    });
                }
                _ => {}
            }
        }

        if !sources.contains(&kind) {
            sources.push(kind);
        }
        match kind {
            DatasetKind::ResourceMonthly => resource_monthly_ds = Some(ds),
            DatasetKind::ResourceByWorkPackage => resource_by_wp_ds = Some(ds),
            DatasetKind::ActualCost => actual_cost_ds = Some(ds),
            DatasetKind::WorkPackage => work_package_ds = Some(ds),
            DatasetKind::Forecast => forecast_ds = Some(ds),
            DatasetKind::Unknown => {
                warn!(dataset = %ds.name, "dataset type not recognized, ignored for blocks");
            }
        }
    }

    let project_id = project_id.ok_or(IntegrationError::MissingProjectId)?;

    let resource_monthly =
        resource_monthly_ds.map(|ds| summarize_resource_monthly(ds, currencies));
    let resource_by_work_package =
        resource_by_wp_ds.map(|ds| summarize_resource_by_work_package(ds, currencies));
    let actual_cost = actual_cost_ds.map(|ds| summarize_actual_cost(ds, currencies));
    let work_package = work_package_ds.map(|ds| summarize_work_package(ds, currencies));
    let forecast = forecast_ds.map(|ds| summarize_forecast(ds, currencies));

    let summary = cross_source_summary(
        &project_id,
        &sources,
        work_package.as_ref().map(|b| &b.summary),
        actual_cost.as_ref().map(|b| &b.summary),
        forecast.as_ref().map(|b| &b.summary),
    );

    info!(
        project_id = %summary.project_id,
        data_sources = summary.data_sources,
        deviation_percent = summary.deviation_percent,
        "sources integrated"
    );

    Ok(IntegratedProject {
        project_id,
        sources,
        resource_monthly,
        resource_by_work_package,
        actual_cost,
        work_package,
        forecast,
        summary,
    })
}

/// Reconcile the per-category summaries. Precedence: budget comes from
/// the work breakdown; actuals prefer the cost export over the work
/// breakdown; forecast stands alone.
fn cross_source_summary(
    project_id: &str,
    sources: &[DatasetKind],
    work_package: Option<&WorkPackageSummary>,
    actual_cost: Option<&ActualCostSummary>,
    forecast: Option<&ForecastSummary>,
) -> CrossSourceSummary {
    let total_budget = work_package.map_or(0.0, |s| s.total_budget);
    let total_actual = actual_cost
        .map(|s| s.total_actual)
        .or_else(|| work_package.map(|s| s.total_actual))
        .unwrap_or(0.0);
    let total_forecast = forecast.map_or(0.0, |s| s.total_forecast);

    let projected_total = total_actual + total_forecast;
    let deviation = projected_total - total_budget;
    let deviation_percent = if total_budget > 0.0 {
        deviation / total_budget * 100.0
    } else {
        0.0
    };

    let burn_rate = actual_cost.map(|s| s.burn_rate);
    let budget_runway_months = match burn_rate {
        Some(rate) if rate > 0.0 => Some(((total_budget - total_actual) / rate).max(0.0)),
        _ => None,
    };

    CrossSourceSummary {
        project_id: project_id.to_string(),
        data_sources: sources
            .iter()
            .filter(|k| **k != DatasetKind::Unknown)
            .count(),
        total_budget,
        total_actual,
        total_forecast,
        projected_total,
        deviation,
        deviation_percent,
        burn_rate,
        budget_runway_months,
    }
}
