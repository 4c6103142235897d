//! # Spreadsheet Processing Module
//!
//! Reads and writes Office Open XML workbooks (`.xlsx`). Reading exposes only
//! the first worksheet listed in the workbook; writing produces a single sheet
//! workbook with a header row and no styling.
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlError;
use crate::table::Table;
use crate::table::TableError;
use thiserror::Error;

pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod writer;
pub(crate) mod xlsx;

pub use writer::write_workbook;

/// Errors raised while reading or writing a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    XmlHelperError(#[from] XmlError),

    #[error("{0}")]
    TableError(#[from] TableError),

    #[error("Missing '{0}' in workbook")]
    FileError(String),

    #[error("Workbook contains no worksheets")]
    SpreadsheetEmptyError,

    #[error("Invalid cell value at {0}: {1}")]
    CellValueError(String, String),

    #[error("Cannot write value in column '{0}': {1}")]
    UnsupportedValueError(String, String),
}

/// Reads the first worksheet of an `.xlsx` workbook into a table.
///
/// The first non-empty row is the header. Any further worksheets are ignored.
pub(crate) fn read_first_sheet(reader: UnifiedReader) -> Result<Table, SpreadsheetError> {
    let mut workbook = xlsx::XlsxWorkbook::open(reader)?;
    let shared_strings = workbook.load_shared_strings()?;
    let sheet = workbook.read_first_sheet()?;
    sheet.into_table(&shared_strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::table::Column;

    #[test]
    fn written_workbook_reads_back() {
        let table = Table::new(vec![
            Column::new("Id", vec![CellValue::Number(1.0), CellValue::Number(2.5), CellValue::Null]),
            Column::new("Name", vec![CellValue::from("a & b"), CellValue::Null, CellValue::from("<c>")]),
            Column::new("Flag", vec![CellValue::Boolean(true), CellValue::Boolean(false), CellValue::Null]),
        ]).unwrap();
        let bytes = write_workbook(&table).unwrap();
        let read = read_first_sheet(UnifiedReader::from_bytes(bytes)).unwrap();
        assert_eq!(read, table);
    }

    #[test]
    fn header_only_workbook() {
        let table = Table::new(vec![Column::new("X", vec![])]).unwrap();
        let bytes = write_workbook(&table).unwrap();
        let read = read_first_sheet(UnifiedReader::from_bytes(bytes)).unwrap();
        assert_eq!(read.column_names(), vec!["X"]);
        assert_eq!(read.row_count(), 0);
    }

    #[test]
    fn garbage_is_not_a_workbook() {
        let result = read_first_sheet(UnifiedReader::from_bytes(b"not a zip".to_vec()));
        assert!(matches!(result, Err(SpreadsheetError::ZipError(_))));
    }
}
