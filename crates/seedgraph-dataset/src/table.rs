//! Rectangular string tables and their CSV form.

use crate::error::{DatasetError, Result};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row keyed by column name. Unknown keys are dropped and missing
    /// columns are left blank.
    pub fn push_record(&mut self, record: &BTreeMap<String, String>) {
        let row = self
            .headers
            .iter()
            .map(|h| record.get(h).cloned().unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    pub fn write_to<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.headers)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write as CSV, creating parent directories.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }
        let file = std::fs::File::create(path).map_err(|e| DatasetError::io(path, e))?;
        self.write_to(file)?;
        tracing::info!(path = %path.display(), rows = self.len(), "wrote csv");
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_fill_missing_columns_with_blanks() {
        let mut table = Table::new(["query_id", "generated_question", "llm_answer"]);
        table.push_record(&BTreeMap::from([
            ("query_id".to_string(), "q1".to_string()),
            ("generated_question".to_string(), "Why, though?".to_string()),
            ("unused".to_string(), "x".to_string()),
        ]));
        assert_eq!(table.rows[0], vec!["q1", "Why, though?", ""]);
        assert_eq!(
            table.to_csv_string().unwrap(),
            "query_id,generated_question,llm_answer\nq1,\"Why, though?\",\n"
        );
    }

    #[test]
    fn csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let mut table = Table::new(["question", "answer"]);
        table.push_row(vec!["Multi\nline?".to_string(), "yes".to_string()]);
        table.write_csv(&path).unwrap();

        let back = Table::read_csv(&path).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.column("answer"), Some(vec!["yes"]));
        assert_eq!(back.column("missing"), None);
    }
}
