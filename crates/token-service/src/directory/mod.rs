//! User lookup collaborators.
//!
//! The exchanges depend only on the [`Authenticator`] and [`UserDirectory`]
//! traits. [`InMemoryUserStore`] is a bcrypt-backed implementation of both,
//! loaded from a JSON file by the binary and seeded directly by tests.

use crate::models::{User, UserId};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::instrument;

/// Precomputed bcrypt hash verified when the identifier is unknown, so that
/// unknown-user and wrong-password take the same time.
const DUMMY_BCRYPT_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("User directory unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid user records: {0}")]
    InvalidRecords(String),
}

/// Checks login credentials.
pub trait Authenticator: Send + Sync {
    /// Return the user if `password` matches, regardless of `is_active`.
    ///
    /// Must return `Ok(None)` for both unknown identifiers and wrong
    /// passwords, without a timing difference between the two.
    fn authenticate(
        &self,
        identifier: &str,
        password: &SecretString,
    ) -> Result<Option<User>, DirectoryError>;
}

/// Looks users up by primary key.
pub trait UserDirectory: Send + Sync {
    /// Return the user only if it exists AND is active.
    fn find_active_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError>;
}

/// A stored user with its password hash.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Which `User` field the login identifier is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupField {
    Username,
    Email,
}

impl LookupField {
    fn resolve(username_field: &str) -> Result<Self, DirectoryError> {
        match username_field {
            "username" => Ok(LookupField::Username),
            "email" => Ok(LookupField::Email),
            other => Err(DirectoryError::InvalidRecords(format!(
                "unsupported username field '{}'",
                other
            ))),
        }
    }

    fn value_of<'a>(&self, user: &'a User) -> Option<&'a str> {
        match self {
            LookupField::Username => Some(user.username.as_str()),
            LookupField::Email => user.email.as_deref(),
        }
    }
}

/// Read-only user store held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryUserStore {
    by_identifier: HashMap<String, UserRecord>,
    by_id: HashMap<UserId, User>,
}

impl InMemoryUserStore {
    /// Index `records` by id and by the login identifier `username_field`.
    ///
    /// Rejects duplicate ids, duplicate identifiers, and records that have no
    /// value for the identifier field.
    pub fn new(records: Vec<UserRecord>, username_field: &str) -> Result<Self, DirectoryError> {
        let lookup = LookupField::resolve(username_field)?;
        let mut by_identifier = HashMap::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for record in records {
            let identifier = lookup
                .value_of(&record.user)
                .ok_or_else(|| {
                    DirectoryError::InvalidRecords(format!(
                        "user {} has no '{}'",
                        record.user.id, username_field
                    ))
                })?
                .to_string();

            if by_id.insert(record.user.id, record.user.clone()).is_some() {
                return Err(DirectoryError::InvalidRecords(format!(
                    "duplicate user id {}",
                    record.user.id
                )));
            }
            if by_identifier.insert(identifier, record.clone()).is_some() {
                return Err(DirectoryError::InvalidRecords(format!(
                    "duplicate '{}' for user {}",
                    username_field, record.user.id
                )));
            }
        }

        Ok(Self {
            by_identifier,
            by_id,
        })
    }

    /// Load a JSON array of [`UserRecord`]s.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        username_field: &str,
    ) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DirectoryError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        let records: Vec<UserRecord> = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::InvalidRecords(format!("{}: {}", path.display(), e)))?;

        Self::new(records, username_field)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Authenticator for InMemoryUserStore {
    #[instrument(skip_all)]
    fn authenticate(
        &self,
        identifier: &str,
        password: &SecretString,
    ) -> Result<Option<User>, DirectoryError> {
        let record = self.by_identifier.get(identifier);

        // Always run bcrypt to prevent timing attacks
        let hash_to_verify = record
            .map(|r| r.password_hash.as_str())
            .unwrap_or(DUMMY_BCRYPT_HASH);

        let is_valid = bcrypt::verify(password.expose_secret(), hash_to_verify)
            .map_err(|e| DirectoryError::Unavailable(format!("Password verification failed: {}", e)))?;

        Ok(record.filter(|_| is_valid).map(|r| r.user.clone()))
    }
}

impl UserDirectory for InMemoryUserStore {
    fn find_active_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        Ok(self.by_id.get(&id).filter(|u| u.is_active).cloned())
    }
}
