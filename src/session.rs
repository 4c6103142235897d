//! # Session
//!
//! One user's working state. A session owns at most one active table and
//! remembers where it came from; every pipeline step takes the session
//! explicitly and mutates or reads that table. Sessions share nothing.
use crate::auth::Identity;
use crate::cleaner;
use crate::cleaner::CleanError;
use crate::export::Export;
use crate::export::ExportError;
use crate::export::ExportFormat;
use crate::export::ExportRequest;
use crate::helpers::reader::UnifiedReader;
use crate::projector;
use crate::query;
use crate::query::FilterLiterals;
use crate::query::InvoiceFilter;
use crate::query::PaymentFilter;
use crate::query::QueryError;
use crate::query::QueryParameters;
use crate::query::QuerySource;
use crate::source;
use crate::source::FileFormat;
use crate::source::SourceError;
use crate::source::SourceFile;
use crate::stats;
use crate::stats::NumericSeries;
use crate::table::Table;
use crate::table::TableError;
use chrono::NaiveDate;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;
use tracing::error;
use tracing::info;

/// Rows shown by a preview.
pub const PREVIEW_ROWS: usize = 20;

/// Errors raised by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No data loaded, load a file or run a query first")]
    NoActiveTable,

    #[error("{0}")]
    SourceError(#[from] SourceError),

    #[error("{0}")]
    CleanError(#[from] CleanError),

    #[error("{0}")]
    TableError(#[from] TableError),

    #[error("{0}")]
    QueryError(#[from] QueryError),

    #[error("{0}")]
    ExportError(#[from] ExportError),
}

/// Where the active table came from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceLabel {
    Upload(SourceFile),
    /// Display label of the queried database
    Database(String),
}

impl Display for SourceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLabel::Upload(file) => write!(f, "{}", file),
            SourceLabel::Database(label) => write!(f, "database {}", label),
        }
    }
}

/// First rows of the active table and its charted numeric columns.
#[derive(Debug)]
pub struct Preview<'a> {
    pub head: Table,
    pub series: Vec<NumericSeries<'a>>,
}

pub struct Session {
    identity: Identity,
    active: Option<(Table, SourceLabel)>,
}

impl Session {
    pub fn new(identity: Identity) -> Session {
        Session { identity, active: None }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn table(&self) -> Option<&Table> {
        self.active.as_ref().map(|(table, _)| table)
    }

    pub fn source(&self) -> Option<&SourceLabel> {
        self.active.as_ref().map(|(_, label)| label)
    }

    /// Replaces the active table with a local file.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&Table, SessionError> {
        let (table, file) = logged("load file", source::load_path(path).map_err(SessionError::from))?;
        Ok(self.activate(table, SourceLabel::Upload(file)))
    }

    /// Replaces the active table with uploaded bytes named `name`.
    pub fn load_upload(&mut self, bytes: Vec<u8>, name: &str) -> Result<&Table, SessionError> {
        let file = SourceFile::new(name, bytes.len() as u64);
        let table = logged(
            "load upload",
            FileFormat::from_path(name)
                .and_then(|format| source::load(UnifiedReader::from_bytes(bytes), format))
                .map_err(SessionError::from),
        )?;
        Ok(self.activate(table, SourceLabel::Upload(file)))
    }

    /// Runs the listing query and makes its result the active table.
    pub fn run_query(
        &mut self,
        source: &dyn QuerySource,
        database_label: &str,
        params: &QueryParameters,
        invoice: InvoiceFilter,
        payment: PaymentFilter,
        literals: &FilterLiterals,
    ) -> Result<&Table, SessionError> {
        let result = query::build_query(params, invoice, payment, literals).and_then(|query| source.fetch(&query));
        let table = logged("run query", result.map_err(SessionError::from))?;
        info!("Query returned {} rows for {}", table.row_count(), self.identity.username);
        Ok(self.activate(table, SourceLabel::Database(database_label.to_owned())))
    }

    /// Drops repeated rows, returning how many were removed.
    pub fn remove_duplicates(&mut self) -> Result<usize, SessionError> {
        let table = logged("remove duplicates", self.active_mut())?;
        let removed = cleaner::remove_duplicates(table);
        info!("Removed {} duplicate rows, {} left", removed, table.row_count());
        Ok(removed)
    }

    /// Fills numeric nulls with column means, returning the filled columns.
    pub fn fill_missing_numeric(&mut self) -> Result<Vec<String>, SessionError> {
        let result = self
            .active_mut()
            .and_then(|table| cleaner::fill_missing_numeric(table).map_err(SessionError::from));
        let filled = logged("fill missing values", result)?;
        info!("Filled missing values in {:?}", filled);
        Ok(filled)
    }

    /// Keeps only the selected columns. The active table is unchanged on failure.
    pub fn keep_columns<S: AsRef<str>>(&mut self, selection: &[S]) -> Result<&Table, SessionError> {
        let result = self.active_mut().and_then(|table| {
            projector::validate(table, selection)?;
            *table = projector::project(std::mem::take(table), selection)?;
            Ok(table.column_names().join(", "))
        });
        let columns = logged("keep columns", result)?;
        info!("Kept columns: {}", columns);
        self.active_mut().map(|table| &*table)
    }

    /// The first `rows` rows plus the numeric columns to chart.
    pub fn preview(&self, rows: usize) -> Result<Preview<'_>, SessionError> {
        let (table, _) = logged("preview", self.active.as_ref().ok_or(SessionError::NoActiveTable))?;
        Ok(Preview {
            head: table.head(rows),
            series: stats::preview(table),
        })
    }

    /// Serializes the active table. Uploads keep their file stem; query
    /// results are named after the database and `today`.
    pub fn export(&self, format: ExportFormat, today: NaiveDate) -> Result<Export, SessionError> {
        let result = self
            .active
            .as_ref()
            .ok_or(SessionError::NoActiveTable)
            .and_then(|(table, label)| {
                let filename = match label {
                    SourceLabel::Upload(file) => format.upload_filename(file.stem()),
                    SourceLabel::Database(label) => format.query_filename(label, today),
                };
                Ok(ExportRequest { table, format, filename }.render()?)
            });
        let export = logged("export", result)?;
        info!("Exported {} ({} bytes)", export.filename, export.bytes.len());
        Ok(export)
    }

    fn activate(&mut self, table: Table, label: SourceLabel) -> &Table {
        info!(
            "Loaded {} rows x {} columns from {}",
            table.row_count(),
            table.column_count(),
            label
        );
        let (table, _) = self.active.insert((table, label));
        table
    }

    fn active_mut(&mut self) -> Result<&mut Table, SessionError> {
        self.active
            .as_mut()
            .map(|(table, _)| table)
            .ok_or(SessionError::NoActiveTable)
    }
}

fn logged<T>(operation: &str, result: Result<T, SessionError>) -> Result<T, SessionError> {
    if let Err(e) = &result {
        error!("Error in {}: {}", operation, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::parameters;
    use crate::query::BoundQuery;
    use crate::table::CellValue;
    use crate::table::Column;
    use std::cell::RefCell;

    fn identity() -> Identity {
        Identity { username: "ali".to_owned(), name: "Ali".to_owned() }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    struct FixedSource {
        table: Table,
        seen: RefCell<Vec<BoundQuery>>,
    }

    impl QuerySource for FixedSource {
        fn fetch(&self, query: &BoundQuery) -> Result<Table, QueryError> {
            self.seen.borrow_mut().push(query.clone());
            Ok(self.table.clone())
        }
    }

    #[test]
    fn without_table() {
        let mut session = Session::new(identity());
        assert!(matches!(session.remove_duplicates(), Err(SessionError::NoActiveTable)));
        assert!(matches!(session.fill_missing_numeric(), Err(SessionError::NoActiveTable)));
        assert!(matches!(session.keep_columns(&["A"]), Err(SessionError::NoActiveTable)));
        assert!(matches!(session.preview(PREVIEW_ROWS), Err(SessionError::NoActiveTable)));
        assert!(matches!(session.export(ExportFormat::Csv, today()), Err(SessionError::NoActiveTable)));
    }

    #[test]
    fn upload_clean_project_export() {
        let mut session = Session::new(identity());
        session.load_upload(b"A,V,Note\n1,,x\n1,,x\n2,5,y\n".to_vec(), "sales.csv").unwrap();
        assert_eq!(session.fill_missing_numeric().unwrap(), vec!["V".to_owned()]);
        assert_eq!(session.remove_duplicates().unwrap(), 1);

        let table = session.keep_columns(&["V", "A"]).unwrap();
        assert_eq!(table.column_names(), vec!["V", "A"]);
        assert_eq!(table.row_count(), 2);

        let export = session.export(ExportFormat::Csv, today()).unwrap();
        assert_eq!(export.filename, "sales.csv");
        assert_eq!(export.bytes, b"V,A\n5,1\n5,2\n");
        let export = session.export(ExportFormat::Excel, today()).unwrap();
        assert_eq!(export.filename, "sales.xlsx");
    }

    #[test]
    fn failed_projection_keeps_table() {
        let mut session = Session::new(identity());
        session.load_upload(b"A,B\n1,2\n".to_vec(), "data.csv").unwrap();
        session.keep_columns(&["B"]).unwrap();
        let result = session.keep_columns(&["A"]);
        assert!(matches!(result, Err(SessionError::TableError(TableError::UnknownColumn(_)))));
        assert_eq!(session.table().unwrap().column_names(), vec!["B"]);
    }

    #[test]
    fn repeated_projection_keeps_table() {
        let mut session = Session::new(identity());
        session.load_upload(b"A,B\n1,2\n3,4\n".to_vec(), "data.csv").unwrap();
        let result = session.keep_columns(&["B", "A", "B"]);
        assert!(matches!(result, Err(SessionError::TableError(TableError::DuplicateColumn(_)))));
        let table = session.table().unwrap();
        assert_eq!(table.column_names(), vec!["A", "B"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn unsupported_upload() {
        let mut session = Session::new(identity());
        let result = session.load_upload(b"a".to_vec(), "notes.txt");
        assert!(matches!(result, Err(SessionError::SourceError(SourceError::UnsupportedFormat(_)))));
        assert!(session.table().is_none());
    }

    #[test]
    fn query_result_becomes_active() {
        let table = Table::new(vec![
            Column::new("Inst Code", vec!["A1".into(), "A2".into()]),
            Column::new("Balance", vec![10.0.into(), CellValue::Null]),
        ]).unwrap();
        let source = FixedSource { table, seen: RefCell::new(Vec::new()) };
        let mut session = Session::new(identity());
        session
            .run_query(
                &source,
                "Pharma Solution",
                &parameters(),
                InvoiceFilter::All,
                PaymentFilter::Cash,
                &FilterLiterals::default(),
            )
            .unwrap();
        assert_eq!(source.seen.borrow().len(), 1);
        assert_eq!(session.source(), Some(&SourceLabel::Database("Pharma Solution".to_owned())));

        let preview = session.preview(1).unwrap();
        assert_eq!(preview.head.row_count(), 1);
        assert_eq!(preview.series.len(), 1);
        assert_eq!(preview.series[0].name, "Balance");

        let export = session.export(ExportFormat::Excel, today()).unwrap();
        assert_eq!(export.filename, "Pharma Solution_20240309.xlsx");
        let export = session.export(ExportFormat::Csv, today()).unwrap();
        assert_eq!(export.filename, "sql_data_20240309.csv");
    }

    #[test]
    fn invalid_query_is_not_sent() {
        let source = FixedSource { table: Table::default(), seen: RefCell::new(Vec::new()) };
        let mut params = parameters();
        params.account_filter = "x;DROP".to_owned();
        let mut session = Session::new(identity());
        let result = session.run_query(
            &source,
            "Pharma Solution",
            &params,
            InvoiceFilter::All,
            PaymentFilter::All,
            &FilterLiterals::default(),
        );
        assert!(matches!(result, Err(SessionError::QueryError(QueryError::ValidationError { .. }))));
        assert!(source.seen.borrow().is_empty());
    }
}
