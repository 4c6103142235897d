//! # Credentials
//!
//! Local account store built from configuration. Passwords are held only as
//! Argon2 PHC strings: configured plaintext is hashed once when the store is
//! built. A store with no usable account is a configuration error; there is no
//! fallback account.
use crate::config::Config;
use crate::config::UserEntry;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Errors raised by the credential store.
#[derive(Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("No valid users configured, set USER1_USERNAME, USER1_NAME and USER1_PASSWORD")]
    ConfigurationError,

    #[error("Username/password is incorrect")]
    AuthenticationError,

    #[error("Cannot hash password: {0}")]
    HashError(String),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(error: argon2::password_hash::Error) -> Self {
        AuthError::HashError(error.to_string())
    }
}

/// An authenticated user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    /// Display name
    pub name: String,
}

struct Account {
    name: String,
    /// PHC string
    hash: String,
}

/// Usable accounts keyed by username.
pub struct CredentialStore {
    accounts: BTreeMap<String, Account>,
}

impl CredentialStore {
    pub fn from_config(config: &Config) -> Result<CredentialStore, AuthError> {
        Self::from_users(&config.users)
    }

    /// Builds the store from raw entries. Entries missing a username, name or
    /// password are skipped; plaintext passwords are hashed.
    pub fn from_users(users: &[UserEntry]) -> Result<CredentialStore, AuthError> {
        let mut accounts = BTreeMap::new();
        for user in users {
            if user.username.is_empty() || user.name.is_empty() || user.password.is_empty() {
                continue;
            }
            let hash = if is_hashed(&user.password) {
                user.password.to_owned()
            } else {
                hash_password(&user.password)?
            };
            debug!("User: {}, name: {}", user.username, user.name);
            accounts.insert(user.username.to_owned(), Account { name: user.name.to_owned(), hash });
        }
        if accounts.is_empty() {
            Err(AuthError::ConfigurationError)?
        }
        let store = CredentialStore { accounts };
        info!("Available users: {:?}", store.usernames());
        Ok(store)
    }

    pub fn usernames(&self) -> Vec<&str> {
        self.accounts.keys().map(|username| username.as_str()).collect()
    }

    /// Checks a username and password. Unknown users and wrong passwords fail
    /// the same way.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self.accounts.get(username).ok_or(AuthError::AuthenticationError)?;
        let hash = PasswordHash::new(&account.hash)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .map_err(|_| AuthError::AuthenticationError)?;
        info!("Login - username: {}", username);
        Ok(Identity {
            username: username.to_owned(),
            name: account.name.to_owned(),
        })
    }
}

/// Hashes a plaintext password into an Argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// True when the value already is a PHC hash string.
pub fn is_hashed(value: &str) -> bool {
    value.starts_with('$') && PasswordHash::new(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, name: &str, password: &str) -> UserEntry {
        UserEntry {
            username: username.to_owned(),
            name: name.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn plaintext_is_hashed_once() {
        let store = CredentialStore::from_users(&[entry("ali", "Ali Raza", "az4176")]).unwrap();
        let account = &store.accounts["ali"];
        assert!(account.hash.starts_with("$argon2"));
        assert!(!account.hash.contains("az4176"));

        let identity = store.authenticate("ali", "az4176").unwrap();
        assert_eq!(identity, Identity { username: "ali".to_owned(), name: "Ali Raza".to_owned() });
    }

    #[test]
    fn hashed_passwords_are_kept() {
        let hash = hash_password("sal4176").unwrap();
        assert!(is_hashed(&hash));
        assert!(!is_hashed("sal4176"));
        let store = CredentialStore::from_users(&[entry("sara", "Sara", &hash)]).unwrap();
        assert_eq!(store.accounts["sara"].hash, hash);
        assert!(store.authenticate("sara", "sal4176").is_ok());
    }

    #[test]
    fn wrong_credentials() {
        let store = CredentialStore::from_users(&[entry("ali", "Ali", "right")]).unwrap();
        assert_eq!(store.authenticate("ali", "wrong"), Err(AuthError::AuthenticationError));
        assert_eq!(store.authenticate("nobody", "right"), Err(AuthError::AuthenticationError));
    }

    #[test]
    fn fail_closed_without_accounts() {
        let result = CredentialStore::from_users(&[entry("", "", ""), entry("ali", "", "pw")]);
        assert!(matches!(result, Err(AuthError::ConfigurationError)));
        let result = CredentialStore::from_config(&Config::from_lookup(|_| None));
        assert!(matches!(result, Err(AuthError::ConfigurationError)));
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let store = CredentialStore::from_users(&[entry("ali", "", "pw"), entry("sara", "Sara", "pw")]).unwrap();
        assert_eq!(store.usernames(), vec!["sara"]);
    }
}
