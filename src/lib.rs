//! # Rusty Export
//!
//! Loads tabular data from CSV and Excel files or from an outstanding-invoice
//! listing query, lets a signed-in user clean and narrow it, and exports the
//! result as CSV or Excel.
//!
//! ## Pipeline
//!
//! - [`source`]: reads `.csv` (code page 1252) and `.xlsx` (first sheet) into a [`Table`]
//! - [`query`]: builds the listing query with bound parameters and runs it through a [`QuerySource`]
//! - [`cleaner`]: removes duplicate rows and fills missing numeric values with column means
//! - [`projector`]: keeps an ordered subset of columns
//! - [`stats`]: picks the first two numeric columns for charting
//! - [`export`]: serializes a table to CSV or `.xlsx` bytes with a download name
//!
//! A [`Session`] owns the active table of one signed-in user and runs every
//! step against it. [`Config`] and [`CredentialStore`] come from the
//! environment; [`logging::init`] installs the console and query log output.
mod helpers;

pub mod auth;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod projector;
pub mod query;
pub mod session;
pub mod source;
pub mod spreadsheet;
pub mod stats;
pub mod table;

pub use auth::CredentialStore;
pub use auth::Identity;
pub use config::Config;
pub use error::RustyExportError;
pub use error::ResultMessage;
pub use export::Export;
pub use export::ExportFormat;
pub use query::QuerySource;
pub use session::Session;
pub use table::Table;
