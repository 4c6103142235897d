//! # Table Export
//!
//! Serializes a table to CSV or `.xlsx` bytes for download, with the MIME
//! type and date-stamped file name the download surface needs.
use crate::spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Table;
use chrono::NaiveDate;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const CSV_MIME_TYPE: &str = "text/csv";
pub const EXCEL_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Errors raised while serializing a table.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot serialize table: {0}")]
    SerializationError(String),

    #[error("Unknown export format '{0}', expected csv or excel")]
    UnknownFormat(String),
}

impl From<csv::Error> for ExportError {
    fn from(error: csv::Error) -> Self {
        ExportError::SerializationError(error.to_string())
    }
}

impl From<SpreadsheetError> for ExportError {
    fn from(error: SpreadsheetError) -> Self {
        ExportError::SerializationError(error.to_string())
    }
}

/// Download formats.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    pub const fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_MIME_TYPE,
            ExportFormat::Excel => EXCEL_MIME_TYPE,
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// Serializes the table in this format.
    pub fn encode(&self, table: &Table) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Csv => to_csv(table),
            ExportFormat::Excel => to_spreadsheet(table),
        }
    }

    /// File name for a query result export: `<db label>_<YYYYMMDD>.xlsx` or
    /// `sql_data_<YYYYMMDD>.csv`.
    pub fn query_filename(&self, database_label: &str, date: NaiveDate) -> String {
        let stamp = date.format("%Y%m%d");
        match self {
            ExportFormat::Csv => format!("sql_data_{stamp}.csv"),
            ExportFormat::Excel => format!("{database_label}_{stamp}.xlsx"),
        }
    }

    /// File name for a converted upload: the upload's stem with this format's extension.
    pub fn upload_filename(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(ExportError::UnknownFormat(value.to_owned())),
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("CSV"),
            ExportFormat::Excel => f.write_str("Excel"),
        }
    }
}

/// One download action.
pub struct ExportRequest<'a> {
    pub table: &'a Table,
    pub format: ExportFormat,
    pub filename: String,
}

/// Rendered download.
#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportRequest<'_> {
    pub fn render(self) -> Result<Export, ExportError> {
        let bytes = self.format.encode(self.table)?;
        debug!("rendered {} as {} ({} bytes)", self.filename, self.format, bytes.len());
        Ok(Export {
            filename: self.filename,
            mime_type: self.format.mime_type(),
            bytes,
        })
    }
}

/// Row-major CSV with a header row. Nulls are empty fields, values use their
/// display form.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    if table.column_count() == 0 {
        return Ok(Vec::new());
    }
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|error| ExportError::SerializationError(error.to_string()))
}

/// Single-sheet workbook with a header row and no styling.
pub fn to_spreadsheet(table: &Table) -> Result<Vec<u8>, ExportError> {
    Ok(spreadsheet::write_workbook(table)?)
}
