// End-to-end runs of the pipeline: raw dataset -> mapping -> cleaning
// -> analytics, and multi-source integration on top of the same inputs.
use controlling_core::analytics::{analyze, ClassificationScheme};
use controlling_core::clean::clean_dataset;
use controlling_core::config::{AliasTable, CurrencyTable};
use controlling_core::error::IntegrationError;
use controlling_core::integrate::{integrate, DatasetKind};
use controlling_core::mapper::{detect_mapping, detect_mapping_with_hints, MappingHints};
use controlling_core::types::{CanonicalField, CellValue, CostStatus, RawDataset, Row};

fn dataset(name: &str, headers: &[&str], rows: &[&[&str]]) -> RawDataset {
    let mut ds = RawDataset::new(name, headers.iter().map(|h| h.to_string()).collect());
    for cells in rows {
        let mut row = Row::new();
        for (h, c) in headers.iter().zip(cells.iter()) {
            let value = if c.is_empty() {
                CellValue::Null
            } else {
                CellValue::from(*c)
            };
            row.insert(h.to_string(), value);
        }
        ds.push_row(row);
    }
    ds
}

#[test]
fn messy_export_end_to_end() {
    // A German-flavored export: umlauts, mixed number locales, currency
    // symbols, magnitude suffixes, an unparseable cost and a blank row.
    let ds = dataset(
        "projekte_2024",
        &["Projekt", "Plankosten", "Istkosten", "Verantwortlich", "Priorität"],
        &[
            &["CRM Rollout", "150.000,50", "€165k", "Meier", "Hoch"],
            &["ERP Upgrade", "1,5M", "1,400,000.00", "Schulz", "Mittel"],
            &["Intranet", "80000", "n/a", "Weber", "Niedrig"],
            &["", "", "", "", ""],
        ],
    );

    let mapping = detect_mapping(&ds.headers, &AliasTable::standard());
    assert_eq!(mapping.get(CanonicalField::ProjectName), Some("Projekt"));
    assert_eq!(mapping.get(CanonicalField::CostPlan), Some("Plankosten"));
    assert_eq!(mapping.get(CanonicalField::CostActual), Some("Istkosten"));
    assert_eq!(mapping.get(CanonicalField::Owner), Some("Verantwortlich"));
    assert_eq!(mapping.get(CanonicalField::Priority), Some("Priorität"));

    let (records, report) = clean_dataset(&ds, &mapping, &CurrencyTable::standard());
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.cleaned_rows, 3);
    assert_eq!(report.removed_rows, 1);
    assert!(report.is_complete());
    // One warning for the single unparseable actual-cost cell.
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("cost_actual"));

    let analysis = analyze(&records, ClassificationScheme::FiveBand, 5);

    // CRM: 150000.5 -> 165000 = +10%; ERP: 1.5M -> 1.4M; Intranet
    // actual unparseable counts as 0.
    let crm = &analysis.records[0];
    assert_eq!(crm.cost_plan.or_zero(), 150000.5);
    assert_eq!(crm.cost_actual.or_zero(), 165000.0);
    assert_eq!(crm.status_category, Some(CostStatus::Warning));

    assert_eq!(analysis.summary.total_projects, 3);
    assert_eq!(
        analysis.summary.total_cost_plan,
        150000.5 + 1_500_000.0 + 80000.0
    );
    assert_eq!(analysis.top_risk_projects[0].project_name, "CRM Rollout");
    assert_eq!(
        analysis.top_performers[0].project_name,
        "Intranet"
    );
}

#[test]
fn english_export_maps_onto_the_same_fields() {
    let ds = dataset(
        "ms_project",
        &["Name", "Baseline Cost", "Actual Cost", "Status", "Resource Names"],
        &[
            &["Project A", "$150,000.00", "$165,000.00", "In Progress", "Smith"],
            &["Project B", "$90,000.00", "$81,000.00", "In Progress", "Jones"],
        ],
    );

    let mapping = detect_mapping(&ds.headers, &AliasTable::standard());
    assert_eq!(mapping.get(CanonicalField::ProjectName), Some("Name"));
    assert_eq!(mapping.get(CanonicalField::CostPlan), Some("Baseline Cost"));
    assert_eq!(mapping.get(CanonicalField::CostActual), Some("Actual Cost"));

    let (records, report) = clean_dataset(&ds, &mapping, &CurrencyTable::standard());
    assert!(report.is_complete());
    assert_eq!(records[0].cost_plan.or_zero(), 150000.0);

    let analysis = analyze(&records, ClassificationScheme::ThreeBand, 5);
    // +10% is Warning in the three-band scheme, not At-Risk.
    assert_eq!(
        analysis.records[0].status_category,
        Some(CostStatus::Warning)
    );
    assert_eq!(
        analysis.records[1].status_category,
        Some(CostStatus::OnTrack)
    );
}

#[test]
fn hints_override_auto_detection_end_to_end() {
    // SAP-style export with a bespoke project column the alias table
    // does not know; the template hint pins it down.
    let ds = dataset(
        "sap_export",
        &["PD-Spalte", "Plankosten", "Istkosten"],
        &[&["P-12345", "100.000,00", "98.000,00"]],
    );
    let hints = MappingHints::new("sap").with(CanonicalField::ProjectName, "PD-Spalte");
    let mapping = detect_mapping_with_hints(&ds.headers, &hints, &AliasTable::standard());
    assert_eq!(mapping.get(CanonicalField::ProjectName), Some("PD-Spalte"));

    let (records, report) = clean_dataset(&ds, &mapping, &CurrencyTable::standard());
    assert!(report.is_complete());
    assert_eq!(records[0].project_name.as_deref(), Some("P-12345"));
}

#[test]
fn multi_source_project_view() {
    let resources = dataset(
        "ressourcen",
        &["Projekt_ID", "Monat", "Mitarbeiter", "Stunden", "Kosten_Plan"],
        &[
            &["P-100", "2024-01-01", "4", "640", "80.000,00"],
            &["P-100", "2024-02-01", "6", "960", "120.000,00"],
        ],
    );
    let actuals = dataset(
        "ist_kosten",
        &["Projekt_ID", "Monat", "Kategorie", "Kosten_Ist"],
        &[
            &["P-100", "2024-01-01", "Personal", "90.000,00"],
            &["P-100", "2024-02-01", "Personal", "110.000,00"],
            &["P-100", "2024-02-01", "Hardware", "30.000,00"],
        ],
    );
    let work_packages = dataset(
        "arbeitspakete",
        &["Projekt_ID", "AP_Name", "Budget", "Ist", "Status", "Fortschritt"],
        &[
            &["P-100", "Konzept", "100000", "95000", "Done", "100%"],
            &["P-100", "Umsetzung", "300000", "120000", "In Progress", "45%"],
        ],
    );
    let forecast = dataset(
        "forecast",
        &["Projekt_ID", "Quartal", "Kosten_Forecast", "Konfidenz"],
        &[
            &["P-100", "Q3", "120.000,00", "80%"],
            &["P-100", "Q4", "60.000,00", "60%"],
        ],
    );

    let integrated = integrate(
        &[resources, actuals, work_packages, forecast],
        &CurrencyTable::standard(),
    )
    .unwrap();

    assert_eq!(integrated.project_id, "P-100");
    assert_eq!(integrated.summary.data_sources, 4);
    assert!(integrated.sources.contains(&DatasetKind::ResourceMonthly));

    let rm = integrated.resource_monthly.as_ref().unwrap();
    assert_eq!(rm.summary.avg_staffing, 5.0);
    assert_eq!(rm.summary.total_hours, 1600.0);

    let ac = integrated.actual_cost.as_ref().unwrap();
    assert_eq!(ac.summary.total_actual, 230000.0);
    assert_eq!(ac.summary.by_category["Hardware"], 30000.0);
    // months: 90k and 140k -> burn 115k
    assert_eq!(ac.summary.burn_rate, 115000.0);

    let s = &integrated.summary;
    assert_eq!(s.total_budget, 400000.0);
    assert_eq!(s.total_actual, 230000.0);
    assert_eq!(s.total_forecast, 180000.0);
    assert_eq!(s.projected_total, 410000.0);
    assert!((s.deviation_percent - 2.5).abs() < 1e-9);
    // (400k - 230k) / 115k months of runway left
    let runway = s.budget_runway_months.unwrap();
    assert!((runway - 170000.0 / 115000.0).abs() < 1e-9);
}

#[test]
fn conflicting_ids_yield_no_partial_result() {
    let a = dataset(
        "a",
        &["Projekt_ID", "Monat", "Mitarbeiter"],
        &[&["P-1", "2024-01-01", "3"]],
    );
    let b = dataset(
        "b",
        &["Projekt_ID", "Quartal", "Kosten_Forecast"],
        &[&["P-2", "Q1", "50.000,00"]],
    );
    let err = integrate(&[a, b], &CurrencyTable::standard()).unwrap_err();
    match err {
        IntegrationError::ProjectIdMismatch { first, second } => {
            assert_eq!(first, "P-1");
            assert_eq!(second, "P-2");
        }
        other => panic!("unexpected error: {other}"),
    }
    let msg = format!(
        "{}",
        IntegrationError::ProjectIdMismatch {
            first: "P-1".into(),
            second: "P-2".into()
        }
    );
    assert!(msg.contains("P-1") && msg.contains("P-2"));
}
