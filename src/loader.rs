// CSV → RawDataset adapter.
//
// The core works on in-memory datasets; this is the collaborator-side
// convenience that gets a CSV export into that shape. Every cell
// arrives as text (or null when empty); typing is the value parser's
// job, not the reader's.
use std::error::Error;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use crate::types::{CellValue, RawDataset, Row};

pub fn load_csv(path: &str) -> Result<RawDataset, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string();

    let mut dataset = RawDataset::new(name, headers.clone());
    for result in rdr.records() {
        let record = result?;
        let mut row = Row::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = match record.get(idx) {
                None => CellValue::Null,
                Some(s) if s.trim().is_empty() => CellValue::Null,
                Some(s) => CellValue::Text(s.to_string()),
            };
            row.insert(header.clone(), value);
        }
        dataset.push_row(row);
    }

    info!(
        dataset = %dataset.name,
        rows = dataset.rows.len(),
        columns = dataset.headers.len(),
        "loaded csv export"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_headers_and_rows() {
        let file = write_temp("Projekt,x\nA,1\n");
        let ds = load_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.headers, vec!["Projekt", "x"]);
        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.cell(&ds.rows[0], "Projekt"), &CellValue::from("A"));
    }

    #[test]
    fn empty_cells_become_null() {
        let file = write_temp("a,b,c\n1,,3\n,,\n");
        let ds = load_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.cell(&ds.rows[0], "b"), &CellValue::Null);
        assert!(ds.row_is_empty(&ds.rows[1]));
        assert!(!ds.row_is_empty(&ds.rows[0]));
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let file = write_temp("a,b,c\n1\n");
        let ds = load_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.cell(&ds.rows[0], "c"), &CellValue::Null);
    }
}
