// Deviation analytics over cleaned records.
//
// Null costs count as 0 so every record has a defined deviation; the
// portfolio totals are computed from summed plan/actual, not averaged
// from per-record percentages.
use std::cmp::Ordering;

use serde::Serialize;

use crate::config::{
    FIVE_BAND_FALLBACK, FIVE_BAND_THRESHOLDS, THREE_BAND_FALLBACK, THREE_BAND_THRESHOLDS,
};
use crate::types::{
    CostStatus, ParsedRecord, ProjectAnalysis, ProjectSummary, RankedProject,
};
use crate::util::{average, days_diff};

/// The two coexisting status-threshold schemes. They classify the same
/// deviation differently (12% is At-Risk in five-band but Critical in
/// three-band) and are never merged; callers pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationScheme {
    FiveBand,
    ThreeBand,
}

impl ClassificationScheme {
    /// Walk the band table highest-severity-first; first exceeded lower
    /// bound wins.
    pub fn classify(&self, deviation_percent: f64) -> CostStatus {
        let (bands, fallback): (&[(f64, CostStatus)], CostStatus) = match self {
            ClassificationScheme::FiveBand => (&FIVE_BAND_THRESHOLDS, FIVE_BAND_FALLBACK),
            ClassificationScheme::ThreeBand => (&THREE_BAND_THRESHOLDS, THREE_BAND_FALLBACK),
        };
        for (bound, status) in bands {
            if deviation_percent > *bound {
                return *status;
            }
        }
        fallback
    }
}

/// Fill the derived fields of each record: absolute and relative cost
/// deviation, status category, and schedule delay where both dates
/// parsed. `deviation_percent` is 0 when the plan is 0, never NaN.
pub fn calculate_deviations(
    records: &[ParsedRecord],
    scheme: ClassificationScheme,
) -> Vec<ParsedRecord> {
    records
        .iter()
        .map(|r| {
            let mut rec = r.clone();
            let plan = rec.cost_plan.or_zero();
            let actual = rec.cost_actual.or_zero();
            rec.deviation_absolute = actual - plan;
            rec.deviation_percent = if plan == 0.0 {
                0.0
            } else {
                rec.deviation_absolute / plan * 100.0
            };
            rec.status_category = Some(scheme.classify(rec.deviation_percent));
            rec.schedule_delay_days = match (rec.date_plan.value(), rec.date_actual.value()) {
                (Some(plan_date), Some(actual_date)) => {
                    Some(days_diff(*plan_date, *actual_date))
                }
                _ => None,
            };
            rec
        })
        .collect()
}

/// Run the full analysis: deviations, summary, top-N rankings and the
/// status distribution.
pub fn analyze(
    records: &[ParsedRecord],
    scheme: ClassificationScheme,
    top_n: usize,
) -> ProjectAnalysis {
    let analyzed = calculate_deviations(records, scheme);
    ProjectAnalysis {
        summary: build_summary(&analyzed),
        top_risk_projects: rank(&analyzed, top_n, true),
        top_performers: rank(&analyzed, top_n, false),
        status_distribution: status_distribution(&analyzed),
        records: analyzed,
    }
}

fn build_summary(records: &[ParsedRecord]) -> ProjectSummary {
    let total_cost_plan: f64 = records.iter().map(|r| r.cost_plan.or_zero()).sum();
    let total_cost_actual: f64 = records.iter().map(|r| r.cost_actual.or_zero()).sum();
    let total_deviation = total_cost_actual - total_cost_plan;
    let total_deviation_percent = if total_cost_plan > 0.0 {
        total_deviation / total_cost_plan * 100.0
    } else {
        0.0
    };

    let deviations: Vec<f64> = records.iter().map(|r| r.deviation_percent).collect();
    let (max_dev, min_dev) = if deviations.is_empty() {
        (0.0, 0.0)
    } else {
        deviations.iter().fold((f64::MIN, f64::MAX), |(mx, mn), d| {
            (mx.max(*d), mn.min(*d))
        })
    };

    let delays: Vec<f64> = records
        .iter()
        .filter_map(|r| r.schedule_delay_days)
        .collect();

    ProjectSummary {
        total_projects: records.len(),
        projects_over_budget: records.iter().filter(|r| r.deviation_percent > 0.0).count(),
        projects_critical: count_status(records, CostStatus::Critical),
        projects_warning: count_status(records, CostStatus::Warning)
            + count_status(records, CostStatus::AtRisk),
        projects_on_track: count_status(records, CostStatus::OnTrack),
        total_cost_plan,
        total_cost_actual,
        total_deviation,
        total_deviation_percent,
        avg_deviation_percent: average(&deviations),
        max_deviation_percent: max_dev,
        min_deviation_percent: min_dev,
        avg_schedule_delay_days: average(&delays),
    }
}

fn count_status(records: &[ParsedRecord], status: CostStatus) -> usize {
    records
        .iter()
        .filter(|r| r.status_category == Some(status))
        .count()
}

/// Top-N by deviation_percent. The sort is stable, so records with
/// identical deviations keep their original row order.
fn rank(records: &[ParsedRecord], top_n: usize, descending: bool) -> Vec<RankedProject> {
    let mut ordered: Vec<&ParsedRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        let cmp = a
            .deviation_percent
            .partial_cmp(&b.deviation_percent)
            .unwrap_or(Ordering::Equal);
        if descending {
            cmp.reverse()
        } else {
            cmp
        }
    });

    ordered
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, r)| RankedProject {
            rank: idx + 1,
            project_name: r
                .project_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            cost_plan: r.cost_plan.or_zero(),
            cost_actual: r.cost_actual.or_zero(),
            deviation_percent: r.deviation_percent,
            status_category: r.status_category,
        })
        .collect()
}

/// Counts per status label in first-seen record order.
fn status_distribution(records: &[ParsedRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        let Some(status) = record.status_category else {
            continue;
        };
        let label = status.label();
        match counts.iter().position(|(l, _)| l == label) {
            Some(i) => counts[i].1 += 1,
            None => counts.push((label.to_string(), 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Parsed, Row};

    fn record(idx: usize, name: &str, plan: f64, actual: f64) -> ParsedRecord {
        let mut r = ParsedRecord::empty(idx, Row::new());
        r.project_name = Some(name.to_string());
        r.cost_plan = Parsed::Value(plan);
        r.cost_actual = Parsed::Value(actual);
        r
    }

    #[test]
    fn zero_plan_yields_zero_deviation_percent() {
        let recs = calculate_deviations(
            &[record(0, "A", 0.0, 5000.0)],
            ClassificationScheme::FiveBand,
        );
        assert_eq!(recs[0].deviation_absolute, 5000.0);
        assert_eq!(recs[0].deviation_percent, 0.0);
        assert!(recs[0].deviation_percent.is_finite());
    }

    #[test]
    fn five_band_thresholds() {
        let s = ClassificationScheme::FiveBand;
        assert_eq!(s.classify(20.0), CostStatus::Critical);
        assert_eq!(s.classify(12.0), CostStatus::AtRisk);
        assert_eq!(s.classify(7.0), CostStatus::Warning);
        assert_eq!(s.classify(0.0), CostStatus::OnTrack);
        assert_eq!(s.classify(-10.0), CostStatus::UnderBudget);
    }

    #[test]
    fn three_band_thresholds() {
        let s = ClassificationScheme::ThreeBand;
        assert_eq!(s.classify(12.0), CostStatus::Critical);
        assert_eq!(s.classify(7.0), CostStatus::Warning);
        assert_eq!(s.classify(0.0), CostStatus::OnTrack);
        assert_eq!(s.classify(-10.0), CostStatus::OnTrack);
    }

    #[test]
    fn schemes_disagree_on_the_same_value() {
        assert_eq!(
            ClassificationScheme::FiveBand.classify(12.0),
            CostStatus::AtRisk
        );
        assert_eq!(
            ClassificationScheme::ThreeBand.classify(12.0),
            CostStatus::Critical
        );
    }

    #[test]
    fn summary_totals_come_from_sums_not_percent_averages() {
        let analysis = analyze(
            &[record(0, "A", 100.0, 200.0), record(1, "B", 10000.0, 10000.0)],
            ClassificationScheme::FiveBand,
            5,
        );
        // Per-record percentages are 100 and 0; their average is 50, but
        // the portfolio deviation is 100/10100.
        assert!((analysis.summary.avg_deviation_percent - 50.0).abs() < 1e-9);
        assert!(
            (analysis.summary.total_deviation_percent - 100.0 / 10100.0 * 100.0).abs() < 1e-9
        );
        assert_eq!(analysis.summary.total_deviation, 100.0);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let analysis = analyze(
            &[
                record(0, "First", 100.0, 110.0),
                record(1, "Second", 200.0, 220.0),
                record(2, "Third", 100.0, 90.0),
            ],
            ClassificationScheme::FiveBand,
            10,
        );
        // First and Second both deviate +10%; original order is kept.
        assert_eq!(analysis.top_risk_projects[0].project_name, "First");
        assert_eq!(analysis.top_risk_projects[1].project_name, "Second");
        assert_eq!(analysis.top_risk_projects[2].project_name, "Third");
        // Ascending ranking flips the extremes but not the tie.
        assert_eq!(analysis.top_performers[0].project_name, "Third");
        assert_eq!(analysis.top_performers[1].project_name, "First");
        assert_eq!(analysis.top_performers[2].project_name, "Second");
    }

    #[test]
    fn distribution_is_first_seen_order() {
        let analysis = analyze(
            &[
                record(0, "A", 100.0, 90.0),  // Under-Budget
                record(1, "B", 100.0, 120.0), // Critical
                record(2, "C", 100.0, 85.0),  // Under-Budget
            ],
            ClassificationScheme::FiveBand,
            5,
        );
        assert_eq!(
            analysis.status_distribution,
            vec![("Under-Budget".to_string(), 2), ("Critical".to_string(), 1)]
        );
    }

    #[test]
    fn empty_input_yields_zeroed_summary() {
        let analysis = analyze(&[], ClassificationScheme::FiveBand, 5);
        assert_eq!(analysis.summary.total_projects, 0);
        assert_eq!(analysis.summary.total_deviation_percent, 0.0);
        assert_eq!(analysis.summary.avg_deviation_percent, 0.0);
        assert_eq!(analysis.summary.max_deviation_percent, 0.0);
        assert!(analysis.top_risk_projects.is_empty());
        assert!(analysis.status_distribution.is_empty());
    }

    #[test]
    fn null_costs_count_as_zero() {
        let mut r = ParsedRecord::empty(0, Row::new());
        r.project_name = Some("A".into());
        r.cost_plan = Parsed::Missing;
        r.cost_actual = Parsed::Value(500.0);
        let analysis = analyze(&[r], ClassificationScheme::FiveBand, 5);
        assert_eq!(analysis.summary.total_cost_plan, 0.0);
        assert_eq!(analysis.summary.total_cost_actual, 500.0);
        // Plan 0 keeps the percent defined.
        assert_eq!(analysis.records[0].deviation_percent, 0.0);
    }
}
