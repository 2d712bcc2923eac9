//! Column-oriented table loaded from survey CSV exports.
//!
//! Cells are kept as strings; numeric interpretation happens at the point of
//! use. Empty cells and the literal markers `nan`/`NA` are treated as missing.

use anyhow::{Context, Result, bail};
use encoding_rs::{EUC_KR, UTF_8};
use std::path::Path;
use tracing::debug;

/// A single named column of optional string cells.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// A rectangular table: every column has the same number of rows.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

fn cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed == "NA" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decodes raw file bytes as UTF-8, falling back to EUC-KR (CP949).
///
/// The survey exports come from spreadsheet tools on Korean-locale Windows,
/// so CP949 is common.
fn decode(bytes: &[u8]) -> String {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    let (text, _, _) = EUC_KR.decode(bytes);
    text.into_owned()
}

impl Frame {
    /// Reads a CSV file into a frame. Header row is required.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let text = decode(&bytes);
        let frame = Self::from_csv_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!(
            path = %path.display(),
            rows = frame.n_rows(),
            cols = frame.n_cols(),
            "CSV loaded"
        );
        Ok(frame)
    }

    /// Parses CSV text into a frame.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() {
            bail!("CSV has no header row");
        }

        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::new(),
            })
            .collect();

        for record in reader.records() {
            let record = record?;
            for (i, col) in columns.iter_mut().enumerate() {
                col.values.push(record.get(i).and_then(cell));
            }
        }

        Ok(Frame { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Position of a column, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell value at (row, column name).
    pub fn get(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name)
            .and_then(|c| c.values.get(row))
            .and_then(|v| v.as_deref())
    }

    /// Adds a column, or replaces an existing one in place (position kept).
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        if self.n_cols() > 0 && values.len() != self.n_rows() {
            bail!(
                "column '{}' has {} values but frame has {} rows",
                name,
                values.len(),
                self.n_rows()
            );
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Drops the named columns. Absent names are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
    }

    /// Parses a column to f64 row-wise; unparseable or missing cells are None.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let col = self.column(name)?;
        Some(
            col.values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok()))
                .collect(),
        )
    }

    /// Sorted distinct non-missing values of a column.
    pub fn distinct(&self, name: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .column(name)
            .map(|c| c.values.iter().flatten().cloned().collect())
            .unwrap_or_default();
        values.sort();
        values.dedup();
        values
    }

    /// Keeps only the rows flagged true in `keep`.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.n_rows() {
            bail!(
                "mask has {} entries but frame has {} rows",
                keep.len(),
                self.n_rows()
            );
        }
        for col in &mut self.columns {
            let mut it = keep.iter();
            col.values.retain(|_| *it.next().unwrap());
        }
        Ok(())
    }

    /// Writes the frame as UTF-8 CSV.
    pub fn to_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        writer.write_record(self.names())?;
        for row in 0..self.n_rows() {
            let record: Vec<&str> = self
                .columns
                .iter()
                .map(|c| c.values[row].as_deref().unwrap_or(""))
                .collect();
            writer.write_record(record)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = self.n_rows(), "CSV written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::from_csv_str("age,delivery_pref,note\n23,Yes,\n31,No,nan\n28,Yes,ok\n").unwrap()
    }

    #[test]
    fn test_shape_and_names() {
        let f = sample();
        assert_eq!(f.n_rows(), 3);
        assert_eq!(f.n_cols(), 3);
        assert_eq!(f.names(), vec!["age", "delivery_pref", "note"]);
    }

    #[test]
    fn test_missing_markers() {
        let f = sample();
        assert_eq!(f.get("note", 0), None);
        assert_eq!(f.get("note", 1), None);
        assert_eq!(f.get("note", 2), Some("ok"));
    }

    #[test]
    fn test_numeric_parse() {
        let f = sample();
        let ages = f.numeric("age").unwrap();
        assert_eq!(ages, vec![Some(23.0), Some(31.0), Some(28.0)]);
        let prefs = f.numeric("delivery_pref").unwrap();
        assert_eq!(prefs, vec![None, None, None]);
    }

    #[test]
    fn test_set_column_replaces_in_place() {
        let mut f = sample();
        let pos_before = f.position("delivery_pref").unwrap();
        f.set_column(
            "delivery_pref",
            vec![Some("1".into()), Some("0".into()), Some("1".into())],
        )
        .unwrap();
        assert_eq!(f.position("delivery_pref").unwrap(), pos_before);
        assert_eq!(f.get("delivery_pref", 0), Some("1"));
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut f = sample();
        assert!(f.set_column("bad", vec![Some("1".into())]).is_err());
    }

    #[test]
    fn test_drop_columns_ignores_absent() {
        let mut f = sample();
        f.drop_columns(&["note", "not_here"]);
        assert_eq!(f.n_cols(), 2);
        assert!(!f.has_column("note"));
    }

    #[test]
    fn test_distinct_sorted() {
        let f = sample();
        assert_eq!(f.distinct("delivery_pref"), vec!["No", "Yes"]);
    }

    #[test]
    fn test_retain_rows() {
        let mut f = sample();
        f.retain_rows(&[true, false, true]).unwrap();
        assert_eq!(f.n_rows(), 2);
        assert_eq!(f.get("age", 1), Some("28"));
        assert!(f.retain_rows(&[true]).is_err());
    }

    #[test]
    fn test_csv_roundtrip() {
        let f = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        f.to_csv_path(&path).unwrap();
        let back = Frame::from_csv_path(&path).unwrap();
        assert_eq!(back.n_rows(), 3);
        assert_eq!(back.get("age", 1), Some("31"));
        assert_eq!(back.get("note", 0), None);
    }
}
