//! # Configuration
//!
//! Named options read from the process environment. Every option has a
//! documented default so an empty environment still yields a complete
//! [`Config`]; credentials are the exception and are checked by
//! [`CredentialStore`](crate::auth::CredentialStore).
use crate::query::FilterLiterals;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving configuration values.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Unknown database '{0}', expected one of: {1}")]
    UnknownDatabase(String, String),
}

/// A selectable database: display label and the database name behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub label: String,
    pub value: String,
}

/// Raw account entry (`USERn_USERNAME`, `USERn_NAME`, `USERn_PASSWORD`).
#[derive(Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub username: String,
    pub name: String,
    /// Plaintext or an already hashed PHC string
    pub password: String,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub sql_server: String,
    pub sql_user: String,
    pub sql_password: String,
    pub databases: Vec<DatabaseTarget>,
    pub literals: FilterLiterals,
    pub first_product_code: String,
    pub last_product_code: String,
    pub users: Vec<UserEntry>,
    pub query_log_file: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sql_server", &self.sql_server)
            .field("sql_user", &self.sql_user)
            .field("databases", &self.databases)
            .field("literals", &self.literals)
            .field("first_product_code", &self.first_product_code)
            .field("last_product_code", &self.last_product_code)
            .field("users", &self.users)
            .field("query_log_file", &self.query_log_file)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads the configuration from environment variables.
    pub fn from_env() -> Config {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let defaults = FilterLiterals::default();
        let user = |index: usize| UserEntry {
            username: get(&format!("USER{index}_USERNAME"), ""),
            name: get(&format!("USER{index}_NAME"), ""),
            password: get(&format!("USER{index}_PASSWORD"), ""),
        };
        Config {
            sql_server: get("SQL_SERVER", ""),
            sql_user: get("SQL_USER", ""),
            sql_password: get("SQL_PASSWORD", ""),
            databases: vec![
                DatabaseTarget {
                    label: get("DB1_NAME", "Pharma Solution"),
                    value: get("DB1_VALUE", "PS_TRADE"),
                },
                DatabaseTarget {
                    label: get("DB2_NAME", "Hussain Trader"),
                    value: get("DB2_VALUE", "Pharma_solution"),
                },
            ],
            literals: FilterLiterals {
                no_credit: get("INVOICE_NO_CREDIT", &defaults.no_credit),
                removed_no_credit: get("INVOICE_REMOVED_NO_CREDIT", &defaults.removed_no_credit),
                cash: get("PAYMENT_CASH", &defaults.cash),
                cheque: get("PAYMENT_CHEQUE", &defaults.cheque),
            },
            first_product_code: get("FIRST_PRODUCT_CODE", "0001"),
            last_product_code: get("LAST_PRODUCT_CODE", "989801"),
            users: vec![user(1), user(2)],
            query_log_file: PathBuf::from(get("QUERY_LOG_FILE", "query_log.log")),
        }
    }

    /// Looks a database up by its display label.
    pub fn database(&self, label: &str) -> Result<&DatabaseTarget, ConfigError> {
        self.databases
            .iter()
            .find(|target| target.label == label)
            .ok_or_else(|| {
                let labels: Vec<&str> = self.databases.iter().map(|target| target.label.as_str()).collect();
                ConfigError::UnknownDatabase(label.to_owned(), labels.join(", "))
            })
    }
}
