//! # Tabular Sources
//!
//! Turns an uploaded or local `.csv` / `.xlsx` file into a [`Table`]. Either
//! the whole file becomes a table or the call fails; there is no partial load.
use crate::helpers::encoding;
use crate::helpers::encoding::EncodingError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::table::unique_names;
use crate::table::value::parse_number;
use crate::table::CellValue;
use crate::table::Column;
use crate::table::Table;
use crate::table::TableError;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a source file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unsupported file format '{0}', expected .csv or .xlsx")]
    UnsupportedFormat(String),

    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("Cannot decode file: {0}")]
    DecodeError(String),

    #[error("{0}")]
    TableError(#[from] TableError),
}

impl From<EncodingError> for SourceError {
    fn from(error: EncodingError) -> Self {
        SourceError::DecodeError(error.to_string())
    }
}

impl From<csv::Error> for SourceError {
    fn from(error: csv::Error) -> Self {
        SourceError::DecodeError(error.to_string())
    }
}

impl From<SpreadsheetError> for SourceError {
    fn from(error: SpreadsheetError) -> Self {
        SourceError::DecodeError(error.to_string())
    }
}

/// File formats accepted as table sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Resolves a file extension, case-insensitively and with or without the dot.
    pub fn from_extension(extension: &str) -> Result<FileFormat, SourceError> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            _ => Err(SourceError::UnsupportedFormat(extension.to_owned())),
        }
    }

    /// Resolves the format from a file path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<FileFormat, SourceError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .ok_or_else(|| SourceError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(extension)
    }
}

/// Display metadata about an uploaded file.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

impl SourceFile {
    pub fn new<S: Into<String>>(name: S, size: u64) -> Self {
        SourceFile { name: name.into(), size }
    }

    pub fn size_kib(&self) -> f64 {
        self.size as f64 / 1024.0
    }

    /// File name without its extension, used to name exports.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.name)
    }
}

impl Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2} KB)", self.name, self.size_kib())
    }
}

/// Loads a local file, picking the format from its extension.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<(Table, SourceFile), SourceError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let size = std::fs::metadata(path)?.len();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let table = load(UnifiedReader::open(path)?, format)?;
    Ok((table, SourceFile::new(name, size)))
}

/// Loads uploaded bytes declared with the given extension.
pub fn load_bytes(bytes: Vec<u8>, extension: &str) -> Result<Table, SourceError> {
    let format = FileFormat::from_extension(extension)?;
    load(UnifiedReader::from_bytes(bytes), format)
}

pub(crate) fn load(reader: UnifiedReader, format: FileFormat) -> Result<Table, SourceError> {
    let table = match format {
        FileFormat::Csv => read_csv(reader)?,
        FileFormat::Xlsx => spreadsheet::read_first_sheet(reader)?,
    };
    debug!("loaded {:?} source with {} rows x {} columns", format, table.row_count(), table.column_count());
    Ok(table)
}

/// Reads a code page 1252 delimited file whose first record is the header.
fn read_csv(reader: UnifiedReader) -> Result<Table, SourceError> {
    let bytes = reader.into_bytes()?;
    let text = encoding::decode(&bytes, encoding::WINDOWS_LATIN_1)?;
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let names: Vec<String> = csv.headers()?.iter().map(|name| name.to_owned()).collect();
    let mut fields: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    let mut row_count = 0usize;
    for record in csv.records() {
        let record = record?;
        for (index, field) in record.iter().enumerate() {
            fields[index].push(field.to_owned());
        }
        row_count += 1;
    }

    let columns = unique_names(names)
        .into_iter()
        .zip(fields)
        .map(|(name, fields)| Column::new(name, infer_cells(fields)))
        .collect();
    Ok(Table::with_row_count(columns, row_count)?)
}

/// Types one column of raw fields: all numeric, all boolean, or text.
fn infer_cells(fields: Vec<String>) -> Vec<CellValue> {
    let present = || fields.iter().filter(|field| !field.is_empty());
    if present().all(|field| parse_number(field).is_some()) {
        fields.iter().map(|field| CellValue::parse_field(field)).collect()
    } else if present().all(|field| parse_boolean(field).is_some()) {
        fields.iter().map(|field| parse_boolean(field).map(CellValue::Boolean).unwrap_or_default()).collect()
    } else {
        fields
            .into_iter()
            .map(|field| if field.is_empty() { CellValue::Null } else { CellValue::Text(field) })
            .collect()
    }
}

fn parse_boolean(field: &str) -> Option<bool> {
    match field.trim() {
        value if value.eq_ignore_ascii_case("true") => Some(true),
        value if value.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
