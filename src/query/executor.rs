//! Query execution against DuckDB databases.
use crate::query::title_case;
use crate::query::BoundQuery;
use crate::query::QueryError;
use crate::table::unique_names;
use crate::table::CellValue;
use crate::table::Table;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::TimeDelta;
use duckdb::params_from_iter;
use duckdb::types::TimeUnit;
use duckdb::types::ValueRef;
use duckdb::AccessMode;
use duckdb::Config;
use duckdb::Connection;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::info;

/// Anything that can run a bound query and hand back a table.
pub trait QuerySource {
    fn fetch(&self, query: &BoundQuery) -> Result<Table, QueryError>;
}

/// A DuckDB database opened read-only for each query.
///
/// The connection lives only for the duration of [`QuerySource::fetch`] and is
/// closed on every return path.
#[derive(Clone, Debug)]
pub struct DuckDbSource {
    /// Database file, None for a private in-memory database
    path: Option<PathBuf>,
}

impl DuckDbSource {
    pub fn open<P: AsRef<Path>>(path: P) -> DuckDbSource {
        DuckDbSource { path: Some(path.as_ref().to_path_buf()) }
    }

    pub fn in_memory() -> DuckDbSource {
        DuckDbSource { path: None }
    }

    /// Resolves a configured server and database name to a database file:
    /// `<server>/<database>.duckdb`, relative to the working directory when
    /// no server is configured.
    pub fn for_target(server: &str, database: &str) -> DuckDbSource {
        Self::open(Path::new(server).join(format!("{database}.duckdb")))
    }

    fn name(&self) -> String {
        self.path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| ":memory:".to_owned())
    }

    fn connect(&self) -> Result<Connection, QueryError> {
        let connection = match &self.path {
            Some(path) => Config::default()
                .access_mode(AccessMode::ReadOnly)
                .and_then(|config| Connection::open_with_flags(path, config)),
            None => Connection::open_in_memory(),
        };
        connection.map_err(|error| QueryError::ConnectionError(self.name(), error))
    }
}

impl QuerySource for DuckDbSource {
    fn fetch(&self, query: &BoundQuery) -> Result<Table, QueryError> {
        let connection = self.connect()?;
        debug!("connected to {}", self.name());
        let mut statement = connection.prepare(&query.sql)?;
        let mut rows = statement.query(params_from_iter(query.params.iter().cloned()))?;
        let names: Vec<String> = rows
            .as_ref()
            .map(|statement| statement.column_names())
            .unwrap_or_default();

        let mut records = Vec::<Vec<CellValue>>::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(names.len());
            for index in 0..names.len() {
                record.push(to_cell_value(row.get_ref(index)?));
            }
            records.push(record);
        }
        info!("Retrieved {} records", records.len());

        let names = unique_names(names.iter().map(|name| title_case(name)).collect());
        Ok(Table::from_rows(names, records)?)
    }
}

/// Maps a DuckDB value onto a table cell. Integers and decimals become numbers,
/// temporal values are rendered as ISO text.
fn to_cell_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Boolean(value) => CellValue::Boolean(value),
        ValueRef::TinyInt(value) => CellValue::Number(value as f64),
        ValueRef::SmallInt(value) => CellValue::Number(value as f64),
        ValueRef::Int(value) => CellValue::Number(value as f64),
        ValueRef::BigInt(value) => CellValue::Number(value as f64),
        ValueRef::HugeInt(value) => CellValue::Number(value as f64),
        ValueRef::UTinyInt(value) => CellValue::Number(value as f64),
        ValueRef::USmallInt(value) => CellValue::Number(value as f64),
        ValueRef::UInt(value) => CellValue::Number(value as f64),
        ValueRef::UBigInt(value) => CellValue::Number(value as f64),
        ValueRef::Float(value) => CellValue::Number(value as f64),
        ValueRef::Double(value) => CellValue::Number(value),
        ValueRef::Decimal(value) => {
            let text = value.to_string();
            text.parse::<f64>().map(CellValue::Number).unwrap_or(CellValue::Text(text))
        }
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => CellValue::Text(to_date_text(days)),
        ValueRef::Timestamp(unit, value) => CellValue::Text(to_timestamp_text(unit, value)),
        ValueRef::Time64(unit, value) => {
            let text = to_micros(unit, value)
                .map(|micros| {
                    let seconds = micros / 1_000_000;
                    let (hours, minutes, seconds) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
                    format!("{hours:02}:{minutes:02}:{seconds:02}")
                })
                .unwrap_or_else(|| value.to_string());
            CellValue::Text(text)
        }
        other => CellValue::Text(format!("{other:?}")),
    }
}

/// ISO date, `infinity`/`-infinity` for DuckDB's infinite dates.
/// Days outside the calendar range fall back to the raw day count.
fn to_date_text(days: i32) -> String {
    match days {
        i32::MAX => "infinity".to_owned(),
        days if days == -i32::MAX => "-infinity".to_owned(),
        days => NaiveDate::default()
            .checked_add_signed(TimeDelta::days(days as i64))
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| days.to_string()),
    }
}

/// ISO timestamp, with microseconds only when present.
fn to_timestamp_text(unit: TimeUnit, value: i64) -> String {
    match value {
        i64::MAX => "infinity".to_owned(),
        value if value == -i64::MAX => "-infinity".to_owned(),
        value => to_micros(unit, value)
            .and_then(|micros| DateTime::from_timestamp_micros(micros).map(|datetime| (micros, datetime.naive_utc())))
            .map(|(micros, datetime)| {
                if micros % 1_000_000 != 0 {
                    datetime.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
                } else {
                    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            })
            .unwrap_or_else(|| value.to_string()),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> Option<i64> {
    match unit {
        TimeUnit::Second => value.checked_mul(1_000_000),
        TimeUnit::Millisecond => value.checked_mul(1_000),
        TimeUnit::Microsecond => Some(value),
        TimeUnit::Nanosecond => Some(value / 1_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::build_query;
    use crate::query::tests::parameters;
    use crate::query::FilterLiterals;
    use crate::query::InvoiceFilter;
    use crate::query::PaymentFilter;

    fn bound(sql: &str, params: &[&str]) -> BoundQuery {
        BoundQuery {
            sql: sql.to_owned(),
            params: params.iter().map(|param| param.to_string()).collect(),
        }
    }

    #[test]
    fn fetch_in_memory() {
        let query = bound(
            "SELECT 1 AS INST_CODE, CAST(? AS VARCHAR) AS day_limit, CAST(NULL AS VARCHAR) AS remarks, DATE '2024-03-01' AS inv_date, 2.5::DOUBLE AS NET_AMT, true AS paid",
            &["x"],
        );
        let table = DuckDbSource::in_memory().fetch(&query).unwrap();
        assert_eq!(table.column_names(), vec!["Inst Code", "Day Limit", "Remarks", "Inv Date", "Net Amt", "Paid"]);
        assert_eq!(table.row(0).unwrap(), vec![
            &CellValue::Number(1.0),
            &CellValue::from("x"),
            &CellValue::Null,
            &CellValue::from("2024-03-01"),
            &CellValue::Number(2.5),
            &CellValue::Boolean(true),
        ]);
    }

    #[test]
    fn infinite_temporal_values() {
        let query = bound(
            "SELECT 'infinity'::DATE AS d, '-infinity'::DATE AS e, 'infinity'::TIMESTAMP AS t, TIMESTAMP '2024-03-01 10:20:30.5' AS u",
            &[],
        );
        let table = DuckDbSource::in_memory().fetch(&query).unwrap();
        assert_eq!(table.row(0).unwrap(), vec![
            &CellValue::from("infinity"),
            &CellValue::from("-infinity"),
            &CellValue::from("infinity"),
            &CellValue::from("2024-03-01 10:20:30.500000"),
        ]);
    }

    #[test]
    fn out_of_range_temporal_values() {
        assert_eq!(to_date_text(i32::MIN), i32::MIN.to_string());
        assert_eq!(to_date_text(0), "1970-01-01");
        assert_eq!(to_timestamp_text(TimeUnit::Second, i64::MAX / 2), (i64::MAX / 2).to_string());
        assert_eq!(to_timestamp_text(TimeUnit::Millisecond, 1_000), "1970-01-01 00:00:01");
        assert_eq!(to_micros(TimeUnit::Second, i64::MAX / 2), None);
    }

    #[test]
    fn empty_result_keeps_columns() {
        let query = bound("SELECT 1 AS A_B WHERE 1 = 0", &[]);
        let table = DuckDbSource::in_memory().fetch(&query).unwrap();
        assert_eq!(table.column_names(), vec!["A B"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn query_and_connection_errors() {
        let result = DuckDbSource::in_memory().fetch(&bound("SELEC 1", &[]));
        assert!(matches!(result, Err(QueryError::QueryError(_))));

        let directory = tempfile::tempdir().unwrap();
        let result = DuckDbSource::for_target(&directory.path().display().to_string(), "missing")
            .fetch(&bound("SELECT 1", &[]));
        assert!(matches!(result, Err(QueryError::ConnectionError(..))));
    }

    #[test]
    fn listing_query() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("PS_TRADE.duckdb");
        {
            let connection = Connection::open(&path).unwrap();
            connection.execute_batch(
                "CREATE TABLE OUTSTANDINGLISTING_NEW (
                    acc1 VARCHAR, acc4 INTEGER, Company VARCHAR, HTPersonName VARCHAR, personName VARCHAR,
                    Id INTEGER, refDate DATE, AmtPayable DOUBLE, AmtReceived DOUBLE, remarks VARCHAR,
                    CR_Days INTEGER, ReportType VARCHAR, PaymentTerms VARCHAR, Terms VARCHAR, ProductCode VARCHAR
                );
                CREATE TABLE M_PARTY (Id INTEGER, creditLimit DOUBLE, Days INTEGER);
                INSERT INTO M_PARTY VALUES (7, 1000, 30);
                INSERT INTO OUTSTANDINGLISTING_NEW VALUES
                    ('', 7, 'City Clinic', 'Ali', 'Sara', 1, DATE '2024-01-10', 100, 40, 'ok', 0, 'Sales Invoices', 'Credit', 'CASH', '0100'),
                    ('', 7, 'City Clinic', 'Ali', 'Sara', 2, DATE '2024-01-11', 50, 0, NULL, 15, 'Sales Invoices', 'No Credit', 'cheque', '0100'),
                    ('', 7, 'City Clinic', 'Ali', 'Sara', 3, DATE '2023-12-01', 80, 0, NULL, 0, 'Sales Invoices', 'Credit', 'CASH', '0100'),
                    ('', 7, 'City Clinic', 'Ali', 'Sara', 4, DATE '2024-01-12', 70, 0, NULL, 0, 'Returns', 'Credit', 'CASH', '0100');",
            ).unwrap();
        }

        let source = DuckDbSource::for_target(&directory.path().display().to_string(), "PS_TRADE");
        let query = build_query(&parameters(), InvoiceFilter::All, PaymentFilter::Cash, &FilterLiterals::default()).unwrap();
        let table = source.fetch(&query).unwrap();
        assert_eq!(table.column_names(), vec![
            "Inst Code", "Institute Name", "Ht Person", "Related Person", "Invoice No", "Inv Date",
            "Net Amt", "Recvd Amt", "Balance", "Remarks", "Day Passed", "Day Limit",
        ]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column("Invoice No").unwrap().cells, vec![CellValue::Number(1.0)]);
        assert_eq!(table.column("Inv Date").unwrap().cells, vec![CellValue::from("10-Jan-2024")]);
        assert_eq!(table.column("Balance").unwrap().cells, vec![CellValue::Number(60.0)]);
        assert_eq!(table.column("Day Limit").unwrap().cells, vec![CellValue::Number(30.0)]);

        let query = build_query(&parameters(), InvoiceFilter::NoCredit, PaymentFilter::All, &FilterLiterals::default()).unwrap();
        let table = source.fetch(&query).unwrap();
        assert_eq!(table.column("Invoice No").unwrap().cells, vec![CellValue::Number(2.0)]);
        assert_eq!(table.column("Day Limit").unwrap().cells, vec![CellValue::Number(15.0)]);
    }
}
