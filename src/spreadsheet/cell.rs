use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use crate::table::CellValue;
use chrono::NaiveDate;
use chrono::TimeDelta;

/// Types of cell data in xlsx worksheets.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// Represents a single cell in a worksheet with position, type, and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as stored in the worksheet
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw worksheet value into a table cell.
    ///
    /// Date and time cells are rendered as ISO text, error cells become null.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<CellValue, SpreadsheetError> {
        let error = |message: String| SpreadsheetError::CellValueError(self.reference(), message);
        let value = match self.kind {
            CellType::Empty | CellType::Error => CellValue::Null,
            CellType::Boolean => CellValue::Boolean(self.value == "1" || self.value == "true"),
            CellType::Number => self.value
                .parse::<f64>()
                .map(CellValue::Number)
                .map_err(|_| error(format!("parse '{}' to number failed", self.value)))?,
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                CellValue::Text(to_datetime_string(&self.value, self.kind.is_1904()).map_err(error)?)
            }
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                CellValue::Text(to_date_string(&self.value, self.kind.is_1904()).map_err(error)?)
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                CellValue::Text(to_time_string(&self.value).map_err(error)?)
            }
            CellType::IsoDateTime => CellValue::Text(self.value.replace('T', " ")),
            CellType::InlineString => CellValue::Text(self.value.to_owned()),
            CellType::SharedString => {
                let index = self.value.parse::<usize>()?;
                let text = shared_strings
                    .get(index)
                    .ok_or_else(|| error(format!("shared string {index} not found")))?;
                CellValue::Text(text.to_owned())
            }
        };
        Ok(value)
    }
}

/// Converts Excel numeric date to ISO date string.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, String> {
    let days = parse_serial(value)?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(days.checked_add(offset).and_then(TimeDelta::try_days))
        .and_then(|(epoch, delta)| epoch.checked_add_signed(delta))
        .ok_or_else(|| format!("date serial '{value}' is out of range"))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts Excel numeric time to ISO time string.
fn to_time_string(value: &str) -> Result<String, String> {
    let fraction = parse_serial(value)?.fract();
    let mut hours = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(timestamp)
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, String> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

fn parse_serial(value: &str) -> Result<f64, String> {
    value.parse::<f64>().map_err(|_| format!("parse '{value}' to date failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell { row: 0, col: 0, kind, value: value.to_owned() }
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", true), CellType::NumberTime1904);
        assert_eq!(CellType::parse_custom_number_format("d/m/yy h:mm", false), CellType::NumberDateTime1900);
        assert_eq!(CellType::parse_custom_number_format("#,##0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00\"days\"", false), CellType::Number);
    }

    #[test]
    fn date_cells_render_as_text() {
        assert_eq!(cell(CellType::NumberDate1900, "45000").to_value(&[]).unwrap(), CellValue::from("2023-03-15"));
        assert_eq!(cell(CellType::NumberDateTime1900, "45000.5").to_value(&[]).unwrap(), CellValue::from("2023-03-15 12:00:00"));
        assert_eq!(cell(CellType::NumberTime1900, "0.25").to_value(&[]).unwrap(), CellValue::from("06:00:00"));
        assert_eq!(cell(CellType::NumberDate1904, "0").to_value(&[]).unwrap(), CellValue::from("1904-01-01"));
        assert_eq!(cell(CellType::IsoDateTime, "2024-01-02T03:04:05").to_value(&[]).unwrap(), CellValue::from("2024-01-02 03:04:05"));
    }

    #[test]
    fn scalar_cells() {
        let shared = vec!["zero".to_owned(), "one".to_owned()];
        assert_eq!(cell(CellType::SharedString, "1").to_value(&shared).unwrap(), CellValue::from("one"));
        assert_eq!(cell(CellType::Number, "3.5").to_value(&shared).unwrap(), CellValue::Number(3.5));
        assert_eq!(cell(CellType::Boolean, "1").to_value(&shared).unwrap(), CellValue::Boolean(true));
        assert_eq!(cell(CellType::Error, "#DIV/0!").to_value(&shared).unwrap(), CellValue::Null);
        assert!(cell(CellType::SharedString, "7").to_value(&shared).is_err());
        assert!(cell(CellType::Number, "abc").to_value(&shared).is_err());
    }

    #[test]
    fn out_of_range_date_serials() {
        for serial in ["100000000", "-100000000", "1e300"] {
            let result = cell(CellType::NumberDate1900, serial).to_value(&[]);
            assert!(matches!(result, Err(SpreadsheetError::CellValueError(reference, _)) if reference == "A1"));
        }
        let result = cell(CellType::NumberDateTime1904, "100000000.5").to_value(&[]);
        assert!(matches!(result, Err(SpreadsheetError::CellValueError(..))));
        assert_eq!(cell(CellType::NumberDate1900, "2958465").to_value(&[]).unwrap(), CellValue::from("9999-12-31"));
    }
}
