// Rendering of analysis results: CSV/JSON export plus markdown table
// previews for the console.
use std::error::Error;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::types::{RankedProject, ValidationReport};
use crate::util::format_number;

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Display/export row for a ranking table, with formatted numbers.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Project")]
    #[tabled(rename = "Project")]
    pub project: String,
    #[serde(rename = "CostPlan")]
    #[tabled(rename = "CostPlan")]
    pub cost_plan: String,
    #[serde(rename = "CostActual")]
    #[tabled(rename = "CostActual")]
    pub cost_actual: String,
    #[serde(rename = "DeviationPct")]
    #[tabled(rename = "DeviationPct")]
    pub deviation_pct: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}

pub fn ranking_rows(ranked: &[RankedProject]) -> Vec<RankingRow> {
    ranked
        .iter()
        .map(|r| RankingRow {
            rank: r.rank,
            project: r.project_name.clone(),
            cost_plan: format_number(r.cost_plan, 2),
            cost_actual: format_number(r.cost_actual, 2),
            deviation_pct: format_number(r.deviation_percent, 2),
            status: r
                .status_category
                .map(|s| s.label().to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// Display/export row for the status distribution.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StatusCountRow {
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "Projects")]
    #[tabled(rename = "Projects")]
    pub projects: usize,
}

pub fn distribution_rows(distribution: &[(String, usize)]) -> Vec<StatusCountRow> {
    distribution
        .iter()
        .map(|(status, count)| StatusCountRow {
            status: status.clone(),
            projects: *count,
        })
        .collect()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Print a validation report the way the console tool presents it.
pub fn print_report(report: &ValidationReport) {
    for issue in &report.issues {
        println!("Issue:   {}", issue);
    }
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    for infoline in &report.infos {
        println!("Info:    {}", infoline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CostStatus;

    #[test]
    fn ranking_rows_format_numbers() {
        let ranked = vec![RankedProject {
            rank: 1,
            project_name: "Alpha".into(),
            cost_plan: 1500000.0,
            cost_actual: 1750000.5,
            deviation_percent: 16.7,
            status_category: Some(CostStatus::Critical),
        }];
        let rows = ranking_rows(&ranked);
        assert_eq!(rows[0].cost_plan, "1,500,000.00");
        assert_eq!(rows[0].cost_actual, "1,750,000.50");
        assert_eq!(rows[0].status, "Critical");
    }
}
