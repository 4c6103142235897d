//! # Table Module
//!
//! In-memory columnar data set shared by every pipeline stage: file sources and
//! query results produce a [`Table`], cleaning and projection mutate it, and the
//! exporters and summary statistics read it.
use std::collections::HashMap;
use std::collections::HashSet;
use thiserror::Error;

pub mod column;
pub mod value;

pub use column::Column;
pub use column::ColumnType;
pub use value::CellValue;

/// Errors raised while building or reshaping a table.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch { name: String, expected: usize, actual: usize },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

/// Ordered sequence of named, equal-length columns.
///
/// The row count is tracked separately so that a table projected down to zero
/// columns still knows how many rows it had.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Table, TableError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        Self::with_row_count(columns, row_count)
    }

    /// Builds a table with an explicit row count (needed for zero-column tables).
    pub(crate) fn with_row_count(columns: Vec<Column>, row_count: usize) -> Result<Table, TableError> {
        let mut names = HashSet::<&str>::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                Err(TableError::DuplicateColumn(column.name.to_owned()))?;
            }
            if column.len() != row_count {
                Err(TableError::LengthMismatch {
                    name: column.name.to_owned(),
                    expected: row_count,
                    actual: column.len(),
                })?;
            }
        }
        Ok(Table { columns, row_count })
    }

    /// Builds a table from a header and row-major records.
    /// Short records are padded with nulls, long records are an error.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Table, TableError> {
        let row_count = rows.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();
        for row in rows {
            if row.len() > columns.len() {
                Err(TableError::LengthMismatch {
                    name: format!("row {}", columns.first().map(Column::len).unwrap_or(0) + 1),
                    expected: columns.len(),
                    actual: row.len(),
                })?;
            }
            let mut values = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(values.next().unwrap_or_default());
            }
        }
        Self::with_row_count(columns, row_count)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable access to the columns. Callers may replace cell values but the
    /// slice itself cannot grow or shrink, so the row count invariant holds.
    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Returns the cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index < self.row_count {
            Some(self.columns.iter().map(|column| &column.cells[index]).collect())
        } else {
            None
        }
    }

    /// Iterates rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.row_count).map(move |index| {
            self.columns.iter().map(|column| &column.cells[index]).collect()
        })
    }

    /// Copy of the first `rows` rows, used for previews.
    pub fn head(&self, rows: usize) -> Table {
        let row_count = rows.min(self.row_count);
        Table {
            columns: self.columns
                .iter()
                .map(|column| Column::new(column.name.to_owned(), column.cells[..row_count].to_vec()))
                .collect(),
            row_count,
        }
    }

    /// Keeps only the rows whose flag is set.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        for column in self.columns.iter_mut() {
            let mut flags = keep.iter();
            column.cells.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.row_count = keep.iter().take(self.row_count).filter(|flag| **flag).count();
    }

    /// Takes the columns out, leaving the row count for the caller.
    pub(crate) fn into_parts(self) -> (Vec<Column>, usize) {
        (self.columns, self.row_count)
    }
}

/// Makes header names unique and non-empty.
///
/// Blank names become `Unnamed: <index>`; repeats of `X` become `X.1`, `X.2`...
pub(crate) fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::<String>::new();
    let mut counters = HashMap::<String, usize>::new();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {index}")
            } else {
                name
            };
            let mut candidate = base.to_owned();
            while seen.contains(&candidate) {
                let counter = counters.entry(base.to_owned()).or_insert(0);
                *counter += 1;
                candidate = format!("{base}.{counter}");
            }
            seen.insert(candidate.to_owned());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["A".to_owned(), "B".to_owned()],
            vec![
                vec![CellValue::Number(1.0), CellValue::from("x")],
                vec![CellValue::Number(2.0), CellValue::from("y")],
            ],
        ).unwrap()
    }

    #[test]
    fn table_from_rows() {
        let table = sample();
        assert_eq!(table.column_names(), vec!["A", "B"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.row(1).unwrap(), vec![&CellValue::Number(2.0), &CellValue::from("y")]);
        assert!(table.row(2).is_none());
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::from_rows(
            vec!["A".to_owned(), "B".to_owned()],
            vec![vec![CellValue::Number(1.0)]],
        ).unwrap();
        assert_eq!(table.column("B").unwrap().cells, vec![CellValue::Null]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = Table::new(vec![
            Column::new("A", vec![]),
            Column::new("A", vec![]),
        ]);
        assert_eq!(result, Err(TableError::DuplicateColumn("A".to_owned())));
    }

    #[test]
    fn length_mismatch_rejected() {
        let result = Table::new(vec![
            Column::new("A", vec![CellValue::Null]),
            Column::new("B", vec![]),
        ]);
        assert!(matches!(result, Err(TableError::LengthMismatch { .. })));
    }

    #[test]
    fn retain_and_head() {
        let mut table = sample();
        assert_eq!(table.head(1).row_count(), 1);
        assert_eq!(table.head(10).row_count(), 2);
        table.retain_rows(&[false, true]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column("A").unwrap().cells, vec![CellValue::Number(2.0)]);
    }

    #[test]
    fn unique_header_names() {
        let names = unique_names(vec![
            "A".to_owned(),
            "".to_owned(),
            "A".to_owned(),
            "A".to_owned(),
            "A.1".to_owned(),
        ]);
        assert_eq!(names, vec!["A", "Unnamed: 1", "A.1", "A.2", "A.1.1"]);
    }
}
