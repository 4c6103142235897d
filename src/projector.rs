//! Column projection ("keep only these columns").
use crate::table::Column;
use crate::table::Table;
use crate::table::TableError;
use std::collections::HashSet;

/// Checks that every selected name exists in `table` and appears once.
pub fn validate<S: AsRef<str>>(table: &Table, selection: &[S]) -> Result<(), TableError> {
    if let Some(missing) = selection.iter().find(|name| table.column(name.as_ref()).is_none()) {
        Err(TableError::UnknownColumn(missing.as_ref().to_owned()))?
    }
    let mut seen = HashSet::with_capacity(selection.len());
    match selection.iter().find(|&name| !seen.insert(name.as_ref())) {
        Some(repeated) => Err(TableError::DuplicateColumn(repeated.as_ref().to_owned())),
        None => Ok(()),
    }
}

/// Restricts a table to the selected columns, in selection order.
///
/// The selection is validated first, so a stale selection fails with
/// [`TableError::UnknownColumn`] and leaves nothing half-projected.
/// An empty selection yields a zero-column table with the same row count.
pub fn project<S: AsRef<str>>(table: Table, selection: &[S]) -> Result<Table, TableError> {
    validate(&table, selection)?;
    let (columns, row_count) = table.into_parts();
    let mut slots: Vec<Option<Column>> = columns.into_iter().map(Some).collect();
    let mut projected = Vec::with_capacity(selection.len());
    for name in selection {
        let slot = slots
            .iter_mut()
            .find(|slot| slot.as_ref().map(|column| column.name == name.as_ref()).unwrap_or(false));
        match slot.and_then(Option::take) {
            Some(column) => projected.push(column),
            None => Err(TableError::DuplicateColumn(name.as_ref().to_owned()))?,
        }
    }
    Table::with_row_count(projected, row_count)
}
