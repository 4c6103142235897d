use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::table::unique_names;
use crate::table::CellValue;
use crate::table::Table;
use tracing::debug;

/// Cells collected from one worksheet, with the bounds of the used range.
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet, in document order
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub(super) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell to the sheet, widening the used range.
    pub(super) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the cells out as a table.
    ///
    /// The topmost used row is the header, every later row up to the last used
    /// one becomes a record (blank rows in between are kept as all-null rows).
    pub(crate) fn into_table(self, shared_strings: &[String]) -> Result<Table, SpreadsheetError> {
        if self.is_empty() {
            debug!("sheet '{}' has no cells", self.name);
            return Ok(Table::default());
        }
        let (header_row, row_upper, col_lower, col_upper) = match (
            self.row_lower_bound,
            self.row_upper_bound,
            self.col_lower_bound,
            self.col_upper_bound,
        ) {
            (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) => {
                (row_lower, row_upper, col_lower, col_upper)
            }
            _ => return Ok(Table::default()),
        };

        let width = col_upper - col_lower + 1;
        let mut header = vec![String::new(); width];
        let mut rows = vec![vec![CellValue::Null; width]; row_upper - header_row];
        for cell in &self.cells {
            let value = cell.to_value(shared_strings)?;
            let col = cell.col - col_lower;
            if cell.row == header_row {
                header[col] = value.to_string();
            } else {
                rows[cell.row - header_row - 1][col] = value;
            }
        }
        Ok(Table::from_rows(unique_names(header), rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Sheet1");

        assert!(sheet.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.row_upper_bound, None);
        assert_eq!(sheet.col_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert_eq!(sheet.into_table(&[]).unwrap(), Table::default());
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 1, 3, "a");
        push(&mut sheet, 3, 1, "b");
        push(&mut sheet, 3, 3, "c");

        assert_eq!(sheet.name, "Sheet1");
        assert_eq!(sheet.cells.len(), 3);
        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));
    }

    #[test]
    fn header_row_and_blank_rows() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 1, 1, "Code");
        push(&mut sheet, 1, 3, "Code");
        push(&mut sheet, 2, 1, "x");
        push(&mut sheet, 4, 3, "y");

        let table = sheet.into_table(&[]).unwrap();
        assert_eq!(table.column_names(), vec!["Code", "Unnamed: 1", "Code.1"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("Code").unwrap().cells, vec![CellValue::from("x"), CellValue::Null, CellValue::Null]);
        assert_eq!(table.column("Code.1").unwrap().cells, vec![CellValue::Null, CellValue::Null, CellValue::from("y")]);
    }
}
