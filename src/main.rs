// Entry point and high-level console flow.
//
// - Option [1] loads a controlling export, detects the column mapping
//   and cleans it, printing the validation report.
// - Option [2] analyzes the loaded data and writes ranking CSVs plus a
//   JSON summary.
// - Option [3] integrates several exports of one project into a
//   cross-source view.
use std::io::{self, Write};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

use controlling_core::analytics::{analyze, ClassificationScheme};
use controlling_core::clean::clean_dataset;
use controlling_core::config::{STANDARD_ALIASES, STANDARD_CURRENCIES};
use controlling_core::integrate::integrate;
use controlling_core::loader::load_csv;
use controlling_core::mapper::detect_mapping;
use controlling_core::output::{
    distribution_rows, preview_table_rows, print_report, ranking_rows, write_csv, write_json,
};
use controlling_core::types::ParsedRecord;
use controlling_core::util::{format_int, format_number};

// Simple in-memory app state so we only load/clean an export once but
// can analyze it multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { records: None }));

struct AppState {
    records: Option<Vec<ParsedRecord>>,
}

/// Read a single line of input after printing a prompt.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after a report run.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load an export, detect its mapping and clean it.
fn handle_load() {
    let path = prompt("Path to export file: ");
    let dataset = match load_csv(&path) {
        Ok(ds) => ds,
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            return;
        }
    };

    let mapping = detect_mapping(&dataset.headers, &STANDARD_ALIASES);
    println!(
        "Detected {} of {} canonical fields:",
        mapping.len(),
        controlling_core::types::CanonicalField::ALL.len()
    );
    for (field, header) in &mapping.columns {
        println!("  {:<14} <- {}", field.key(), header);
    }

    let (records, report) = clean_dataset(&dataset, &mapping, &STANDARD_CURRENCIES);
    println!(
        "\nProcessing dataset... ({} rows total, {} cleaned, {} removed)",
        format_int(report.total_rows as i64),
        format_int(report.cleaned_rows as i64),
        format_int(report.removed_rows as i64)
    );
    print_report(&report);
    println!();

    let mut state = APP_STATE.lock().unwrap();
    state.records = Some(records);
}

/// Handle option [2]: analyze the loaded records and export reports.
fn handle_analyze() {
    let records = {
        let state = APP_STATE.lock().unwrap();
        state.records.clone()
    };
    let Some(records) = records else {
        println!("Error: No data loaded. Please load an export first (option 1).\n");
        return;
    };

    println!("Analyzing {} records...\n", format_int(records.len() as i64));
    let analysis = analyze(&records, ClassificationScheme::FiveBand, 5);

    let risks = ranking_rows(&analysis.top_risk_projects);
    let file1 = "top_risk_projects.csv";
    if let Err(e) = write_csv(file1, &risks) {
        eprintln!("Write error: {}", e);
    }
    println!("Top Risk Projects (by cost deviation)\n");
    preview_table_rows(&risks, 5);
    println!("(Full table exported to {})\n", file1);

    let performers = ranking_rows(&analysis.top_performers);
    let file2 = "top_performers.csv";
    if let Err(e) = write_csv(file2, &performers) {
        eprintln!("Write error: {}", e);
    }
    println!("Top Performers (lowest cost deviation)\n");
    preview_table_rows(&performers, 5);
    println!("(Full table exported to {})\n", file2);

    println!("Status Distribution\n");
    preview_table_rows(&distribution_rows(&analysis.status_distribution), 5);

    if let Err(e) = write_json("summary.json", &analysis.summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "  total plan {}, total actual {}, portfolio deviation {}%",
        format_number(analysis.summary.total_cost_plan, 2),
        format_number(analysis.summary.total_cost_actual, 2),
        format_number(analysis.summary.total_deviation_percent, 2)
    );
    println!();
}

/// Handle option [3]: integrate several exports of one project.
fn handle_integrate() {
    let input = prompt("Paths to export files (comma-separated): ");
    let mut datasets = Vec::new();
    for path in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match load_csv(path) {
            Ok(ds) => datasets.push(ds),
            Err(e) => {
                eprintln!("Failed to load {}: {}\n", path, e);
                return;
            }
        }
    }
    if datasets.is_empty() {
        println!("No files given.\n");
        return;
    }

    match integrate(&datasets, &STANDARD_CURRENCIES) {
        Ok(project) => {
            let s = &project.summary;
            println!("\nIntegrated project {}:", project.project_id);
            println!("  sources:         {}", format_int(s.data_sources as i64));
            println!("  total budget:    {}", format_number(s.total_budget, 2));
            println!("  total actual:    {}", format_number(s.total_actual, 2));
            println!("  total forecast:  {}", format_number(s.total_forecast, 2));
            println!("  projected total: {}", format_number(s.projected_total, 2));
            println!(
                "  deviation:       {} ({}%)",
                format_number(s.deviation, 2),
                format_number(s.deviation_percent, 2)
            );
            match s.budget_runway_months {
                Some(months) => println!("  budget runway:   {} months", format_number(months, 1)),
                None => println!("  budget runway:   not computable"),
            }
            if let Err(e) = write_json("integrated_project.json", &project) {
                eprintln!("Write error: {}", e);
            }
            println!("(Full view exported to integrated_project.json)\n");
        }
        Err(e) => {
            eprintln!("Integration failed: {}\n", e);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    loop {
        println!("Select an action:");
        println!("[1] Load & clean an export");
        println!("[2] Analyze loaded data");
        println!("[3] Integrate multiple exports\n");
        match prompt("Enter choice: ").as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_analyze();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!();
                handle_integrate();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
