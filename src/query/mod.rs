//! # Outstanding Invoice Query
//!
//! Builds the outstanding-invoice listing query from typed parameters and
//! filter selections, and runs it through a [`QuerySource`]. Every value that
//! comes from the caller or from configuration is bound as a positional `?`
//! parameter; the SQL text itself only ever contains fixed fragments.
use crate::table::TableError;
use chrono::NaiveDate;
use regex::Regex;
use std::fmt::Debug;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub mod executor;
pub mod filter;

pub use executor::DuckDbSource;
pub use executor::QuerySource;
pub use filter::FilterLiterals;
pub use filter::FilterNode;
pub use filter::InvoiceFilter;
pub use filter::PaymentFilter;

/// Date format of the listing's date parameters (`05-Jan-2024`).
pub const DATE_FORMAT: &str = "%d-%b-%Y";

/// Errors raised while building or running a query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid {field}: '{value}' may only contain letters, digits, spaces, '_', '.' and '-'")]
    ValidationError { field: &'static str, value: String },

    #[error("Unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("Cannot connect to database '{0}': {1}")]
    ConnectionError(String, duckdb::Error),

    #[error("Query execution error: {0}")]
    QueryError(#[from] duckdb::Error),

    #[error("{0}")]
    TableError(#[from] TableError),
}

/// Connection and listing parameters for one query run.
#[derive(Clone)]
pub struct QueryParameters {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub product_code_first: String,
    pub product_code_last: String,
    /// Optional account restriction, empty for all accounts
    pub account_filter: String,
}

impl Debug for QueryParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParameters")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("product_code_first", &self.product_code_first)
            .field("product_code_last", &self.product_code_last)
            .field("account_filter", &self.account_filter)
            .finish()
    }
}

impl QueryParameters {
    /// Rejects bound values with characters outside `[A-Za-z0-9 _.-]`.
    ///
    /// The account filter may be empty. An end date before the start date is
    /// accepted; it only yields an empty listing, so it is logged and let through.
    pub fn validate(&self) -> Result<(), QueryError> {
        check_value("account filter", &self.account_filter)?;
        check_value("first product code", &self.product_code_first)?;
        check_value("last product code", &self.product_code_last)?;
        if self.end_date < self.start_date {
            warn!("end date {} is before start date {}", self.end_date, self.start_date);
        }
        Ok(())
    }
}

impl FilterLiterals {
    pub fn validate(&self) -> Result<(), QueryError> {
        check_value("INVOICE_NO_CREDIT", &self.no_credit)?;
        check_value("INVOICE_REMOVED_NO_CREDIT", &self.removed_no_credit)?;
        check_value("PAYMENT_CASH", &self.cash)?;
        check_value("PAYMENT_CHEQUE", &self.cheque)?;
        Ok(())
    }
}

fn check_value(field: &'static str, value: &str) -> Result<(), QueryError> {
    let pattern = Regex::new(r"^[A-Za-z0-9 _.\-]*$").expect("Hardcode regex pattern");
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(QueryError::ValidationError { field, value: value.to_owned() })
    }
}

/// SQL text with positional `?` placeholders and the values bound to them, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<String>,
}

const SELECT_LISTING: &str = "SELECT
  TR.acc4 AS INST_Code,
  TR.Company AS Institute_Name,
  TR.HTPersonName AS HT_Person,
  TR.personName AS Related_Person,
  TR.Id AS INVOICE_NO,
  strftime(TR.refDate, '%d-%b-%Y') AS INV_Date,
  round(TR.AmtPayable, 2) AS NET_AMT,
  round(TR.AmtReceived, 2) AS RECVD_AMT,
  round(SUM(TR.AmtPayable - TR.AmtReceived), 2) AS Balance,
  TR.remarks AS REMARKS,
  date_diff('day', TR.refDate, current_date) AS Day_Passed,
  CASE WHEN TR.CR_Days = 0 THEN M_PARTY.Days ELSE TR.CR_Days END AS Day_LIMIT
FROM OUTSTANDINGLISTING_NEW AS TR
LEFT JOIN M_PARTY ON TR.acc4 = M_PARTY.Id
WHERE TR.ReportType = 'Sales Invoices'
  AND TR.refDate BETWEEN CAST(strptime(CAST(? AS VARCHAR), '%d-%b-%Y') AS DATE)
                     AND CAST(strptime(CAST(? AS VARCHAR), '%d-%b-%Y') AS DATE)
  AND (CAST(? AS VARCHAR) = '' OR TR.acc1 = CAST(? AS VARCHAR))
  AND TR.ProductCode BETWEEN CAST(? AS VARCHAR) AND CAST(? AS VARCHAR)";

const GROUP_LISTING: &str = "
GROUP BY TR.refDate, TR.acc4, TR.Company, TR.HTPersonName, TR.personName, TR.Id,
  TR.AmtPayable, TR.AmtReceived, TR.remarks, M_PARTY.creditLimit, M_PARTY.Days, TR.CR_Days";

/// Renders the listing query for the given parameters and filters.
///
/// Parameters are validated first; nothing is rendered for invalid input.
pub fn build_query(
    params: &QueryParameters,
    invoice: InvoiceFilter,
    payment: PaymentFilter,
    literals: &FilterLiterals,
) -> Result<BoundQuery, QueryError> {
    params.validate()?;
    literals.validate()?;

    let start = params.start_date.format(DATE_FORMAT).to_string();
    let end = params.end_date.format(DATE_FORMAT).to_string();
    let mut sql = SELECT_LISTING.to_owned();
    let mut values = vec![
        start.to_owned(),
        end.to_owned(),
        params.account_filter.to_owned(),
        params.account_filter.to_owned(),
        params.product_code_first.to_owned(),
        params.product_code_last.to_owned(),
    ];
    invoice.to_node(literals).render(&mut sql, &mut values);
    payment.to_node(literals).render(&mut sql, &mut values);
    sql.push_str(GROUP_LISTING);

    info!(
        "Running query on DB: {}, From: {} To: {}, InvoiceType: {}, PaymentTerms: {}",
        params.database, start, end, invoice, payment
    );
    debug!("SQL Query: {}\nParameters: {:?}", sql, values);
    Ok(BoundQuery { sql, params: values })
}

/// Display form of a result column name: `INST_CODE` becomes `Inst Code`.
///
/// Underscores turn into spaces, then each run of letters is capitalized with
/// the rest lowercased.
pub fn title_case(name: &str) -> String {
    let mut title = String::with_capacity(name.len());
    let mut previous_is_letter = false;
    for character in name.chars() {
        let character = if character == '_' { ' ' } else { character };
        if character.is_alphabetic() {
            if previous_is_letter {
                title.extend(character.to_lowercase());
            } else {
                title.extend(character.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            title.push(character);
            previous_is_letter = false;
        }
    }
    title
}
