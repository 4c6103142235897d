use crate::table::value::CellValue;

/// Data types a column can be detected as.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColumnType {
    /// No non-null cells at all
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Double-precision floating point numbers
    Number,
    /// Variable-length strings, or mixed content
    Text,
}

impl ColumnType {
    /// Infers the type of a single cell, None for nulls.
    fn from(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Null => None,
            CellValue::Boolean(_) => Some(ColumnType::Boolean),
            CellValue::Number(_) => Some(ColumnType::Number),
            CellValue::Text(_) => Some(ColumnType::Text),
        }
    }

    /// Detects the most specific common type from a collection of cells.
    /// Falls back to Text if types are inconsistent.
    pub fn detect<'a, I>(cells: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let types: Vec<ColumnType> = cells.into_iter().filter_map(ColumnType::from).collect();
        if types.is_empty() {
            ColumnType::Empty
        } else if types.iter().all(|kind| *kind == ColumnType::Boolean) {
            ColumnType::Boolean
        } else if types.iter().all(|kind| *kind == ColumnType::Number) {
            ColumnType::Number
        } else {
            ColumnType::Text
        }
    }
}

/// A named column of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Column name (from header row, query result or caller)
    pub name: String,
    /// Column cells, one per table row
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, cells: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    /// Detected type of the column's cells.
    pub fn kind(&self) -> ColumnType {
        ColumnType::detect(&self.cells)
    }

    /// A column is numeric when it has cells and each of them is a number or null.
    /// All-null columns count as numeric, zero-length columns do not.
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind(), ColumnType::Number | ColumnType::Empty) && !self.cells.is_empty()
    }

    /// Arithmetic mean of the non-null numeric cells, None when there are none.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self.cells
            .iter()
            .filter_map(CellValue::as_number)
            .fold((0f64, 0usize), |(sum, count), value| (sum + value, count + 1));
        if count > 0 {
            Some(sum / count as f64)
        } else {
            None
        }
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_null()).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
