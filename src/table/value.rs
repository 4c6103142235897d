use std::fmt::Display;

/// A single scalar cell of a [`Table`](crate::table::Table).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// Missing value (empty CSV field, empty spreadsheet cell, SQL NULL)
    #[default]
    Null,
    /// Boolean values (true/false)
    Boolean(bool),
    /// Numeric values, always held as double precision
    Number(f64),
    /// Any other value, including rendered dates and times
    Text(String),
}

impl CellValue {
    /// Returns true if the cell holds no value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns true if the cell holds a number.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// Returns the numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Parses a raw text field the way delimited files are interpreted:
    /// empty is null, finite floats are numbers, anything else stays text.
    pub(crate) fn parse_field(field: &str) -> CellValue {
        if field.is_empty() {
            CellValue::Null
        } else if let Some(number) = parse_number(field) {
            CellValue::Number(number)
        } else {
            CellValue::Text(field.to_owned())
        }
    }

    /// Key used for whole-row equality checks.
    pub(crate) fn key(&self) -> CellKey<'_> {
        match self {
            CellValue::Null => CellKey::Null,
            CellValue::Boolean(value) => CellKey::Boolean(*value),
            // -0.0 and 0.0 compare equal as values, so they must hash equal too
            CellValue::Number(value) if *value == 0.0 => CellKey::Number(0f64.to_bits()),
            CellValue::Number(value) => CellKey::Number(value.to_bits()),
            CellValue::Text(value) => CellKey::Text(value.as_str()),
        }
    }
}

/// Parses a finite floating point number, rejecting `inf`/`NaN` spellings.
pub(crate) fn parse_number(field: &str) -> Option<f64> {
    field.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Hashable projection of a [`CellValue`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) enum CellKey<'a> {
    Null,
    Boolean(bool),
    Number(u64),
    Text(&'a str),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Boolean(value) => write!(f, "{}", value),
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_kinds() {
        assert_eq!(CellValue::parse_field(""), CellValue::Null);
        assert_eq!(CellValue::parse_field("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::parse_field("-2.5"), CellValue::Number(-2.5));
        assert_eq!(CellValue::parse_field("x"), CellValue::Text("x".to_owned()));
        assert_eq!(CellValue::parse_field("NaN"), CellValue::Text("NaN".to_owned()));
        assert_eq!(CellValue::parse_field("inf"), CellValue::Text("inf".to_owned()));
    }

    #[test]
    fn display_uses_plain_formatting() {
        assert_eq!(CellValue::Number(1.0).to_string(), "1");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "true");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn signed_zero_shares_a_key() {
        assert_eq!(CellValue::Number(0.0).key(), CellValue::Number(-0.0).key());
        assert_ne!(CellValue::Number(1.0).key(), CellValue::Text("1".to_owned()).key());
    }
}
