//! Report output: spreadsheet workbooks, CSV exports, and JSON dumps.
//!
//! Tables are built as a generic sheet model (name, headers, string rows);
//! the output format is picked from the target path's extension.

use anyhow::{Context, Result, bail};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One worksheet worth of tabular output.
#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Sheet {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Writes the sheets to the path, picking the format by extension:
/// `.csv` for CSV (one file per sheet), `.json` for a JSON dump, anything
/// else an .xlsx workbook.
pub fn write_tables(path: impl AsRef<Path>, sheets: &[Sheet]) -> Result<()> {
    let path = path.as_ref();
    if sheets.is_empty() {
        bail!("no sheets to write");
    }
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => match sheets {
            [sheet] => write_sheet_csv(path, sheet),
            _ => {
                for sheet in sheets {
                    write_sheet_csv(csv_sibling(path, &sheet.name), sheet)?;
                }
                Ok(())
            }
        },
        Some("json") => write_json(path, sheets),
        _ => write_workbook(path, sheets),
    }
}

/// Sibling path for one sheet of a multi-sheet CSV export.
fn csv_sibling(path: &Path, sheet_name: &str) -> PathBuf {
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or("table");
    path.with_file_name(format!("{}_{}.csv", stem, sheet_name))
}

/// Cells that parse as finite numbers become numeric spreadsheet cells,
/// so ORs, LLRs, and Ns sort and compute in Excel.
fn numeric_cell(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Writes the sheets into a single .xlsx workbook with a bold header row.
pub fn write_workbook(path: impl AsRef<Path>, sheets: &[Sheet]) -> Result<()> {
    let path = path.as_ref();
    if sheets.is_empty() {
        bail!("no sheets to write");
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                match numeric_cell(value) {
                    Some(number) => {
                        worksheet.write_number((r + 1) as u32, c as u16, number)?;
                    }
                    None => {
                        worksheet.write_string((r + 1) as u32, c as u16, value)?;
                    }
                }
            }
        }
        debug!(sheet = %sheet.name, rows = sheet.rows.len(), "sheet written");
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook {}", path.display()))?;
    info!(path = %path.display(), sheets = sheets.len(), "workbook saved");
    Ok(())
}

/// Writes a single sheet as a CSV file.
pub fn write_sheet_csv(path: impl AsRef<Path>, sheet: &Sheet) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = sheet.rows.len(), "CSV table written");
    Ok(())
}

/// Writes the sheets as pretty-printed JSON.
pub fn write_json(path: impl AsRef<Path>, sheets: &[Sheet]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, sheets)?;
    info!(path = %path.display(), sheets = sheets.len(), "JSON report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::new("Results", &["Variable", "OR", "p_value"]);
        sheet.push_row(vec!["age".into(), "1.200".into(), "0.041".into()]);
        sheet.push_row(vec!["BMI".into(), "0.850".into(), "0.310".into()]);
        sheet
    }

    #[test]
    fn test_write_workbook_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_workbook(&path, &[sample_sheet()]).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_workbook_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        assert!(write_workbook(&path, &[]).is_err());
    }

    #[test]
    fn test_numeric_cell_detection() {
        assert_eq!(numeric_cell("1.200"), Some(1.2));
        assert_eq!(numeric_cell("16"), Some(16.0));
        assert_eq!(numeric_cell("<0.001"), None);
        assert_eq!(numeric_cell("0.512 - 1.846"), None);
        assert_eq!(numeric_cell("N/A"), None);
        assert_eq!(numeric_cell(""), None);
        assert_eq!(numeric_cell("nan"), None);
    }

    #[test]
    fn test_write_sheet_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_sheet_csv(&path, &sample_sheet()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Variable,OR,p_value");
        assert!(lines[1].starts_with("age"));
    }

    #[test]
    fn test_write_tables_csv_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_tables(&path, &[sample_sheet()]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Variable,OR,p_value"));
    }

    #[test]
    fn test_write_tables_multi_sheet_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut second = sample_sheet();
        second.name = "Fit".to_string();
        write_tables(&path, &[sample_sheet(), second]).unwrap();
        assert!(dir.path().join("out_Results.csv").exists());
        assert!(dir.path().join("out_Fit.csv").exists());
    }

    #[test]
    fn test_write_tables_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_tables(&path, &[sample_sheet()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"Results\""));
        assert!(text.contains("p_value"));
    }
}
