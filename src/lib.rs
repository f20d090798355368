//! `controlling_core` — normalization and analysis engine for tabular
//! project-controlling exports.
//!
//! Pure engine crate: receives in-memory datasets of unknown shape,
//! detects semantic columns, parses locale-ambiguous values, cleans and
//! validates, computes deviation analytics, and reconciles multiple
//! sources into one project view. File reading and report rendering are
//! collaborator-side conveniences (`loader`, `output`).

pub mod analytics;
pub mod clean;
pub mod config;
pub mod error;
pub mod integrate;
pub mod loader;
pub mod mapper;
pub mod output;
pub mod parse;
pub mod types;
pub mod util;

pub use analytics::{analyze, calculate_deviations, ClassificationScheme};
pub use clean::clean_dataset;
pub use error::IntegrationError;
pub use integrate::{classify_dataset, extract_project_id, integrate, IntegratedProject};
pub use mapper::{detect_mapping, detect_mapping_with_hints, MappingHints};
pub use types::{
    CanonicalField, CellValue, CostStatus, FieldMapping, Parsed, ParsedRecord, ProjectAnalysis,
    ProjectSummary, RawDataset, ValidationReport,
};
