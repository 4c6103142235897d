//! In-place cleaning operations on the active table. Both are idempotent.
use crate::table::CellValue;
use crate::table::Table;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Errors raised by cleaning operations.
#[derive(Error, Debug, PartialEq)]
pub enum CleanError {
    #[error("No numeric columns to fill")]
    NoFillableColumns,
}

/// Removes rows that repeat an earlier row across all columns.
///
/// The first occurrence is kept and the order of kept rows is unchanged.
/// Returns the number of rows removed.
pub fn remove_duplicates(table: &mut Table) -> usize {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        (0..table.row_count())
            .map(|index| {
                let key: Vec<_> = table.columns().iter().map(|column| column.cells[index].key()).collect();
                seen.insert(key)
            })
            .collect()
    };
    let before = table.row_count();
    table.retain_rows(&keep);
    let removed = before - table.row_count();
    debug!("removed {removed} duplicate rows");
    removed
}

/// Replaces nulls in every numeric column with the mean of its values.
///
/// Columns whose cells are all null have no mean and are left untouched.
/// Fails with [`CleanError::NoFillableColumns`] only when the table has no
/// numeric column at all. Returns the names of the columns that were filled.
pub fn fill_missing_numeric(table: &mut Table) -> Result<Vec<String>, CleanError> {
    if !table.columns().iter().any(|column| column.is_numeric()) {
        Err(CleanError::NoFillableColumns)?
    }
    let mut filled = Vec::new();
    for column in table.columns_mut().iter_mut().filter(|column| column.is_numeric()) {
        let mean = match column.mean() {
            Some(mean) if column.null_count() > 0 => mean,
            _ => continue,
        };
        for cell in column.cells.iter_mut().filter(|cell| cell.is_null()) {
            *cell = CellValue::Number(mean);
        }
        debug!("filled nulls in '{}' with {}", column.name, mean);
        filled.push(column.name.to_owned());
    }
    Ok(filled)
}
