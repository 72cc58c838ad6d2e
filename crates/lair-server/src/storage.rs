//! Redb-backed local persistence.
//!
//! Holds one record per SSH login name, written on first login. The page
//! state machine never touches the store; it is opened before sessions are
//! served, health-checked at startup and closed after the last session ends.

use std::{
    fmt,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Table: users
/// Key: username
/// Value: CBOR-encoded UserRecord
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Errors from the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database could not be opened, read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A user with this name already exists.
    #[error("user already exists: {0}")]
    Conflict(String),
}

/// A user, recorded on first login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique username.
    pub username: String,
    /// SHA-256 fingerprint of the first public key used, if any.
    pub key_fingerprint: Option<String>,
    /// Unix timestamp (seconds) of the first login.
    pub created_at_secs: u64,
}

impl UserRecord {
    /// Record stamped with the current time.
    pub fn new(username: impl Into<String>, key_fingerprint: Option<String>) -> Self {
        let created_at_secs =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
        Self { username: username.into(), key_fingerprint, created_at_secs }
    }
}

/// Store health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Readable.
    Up,
    /// Not readable.
    Down,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// Result of [`Store::health`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Health {
    /// Up or down.
    pub status: HealthStatus,
    /// Number of stored users (0 when down).
    pub users: u64,
    /// Human-readable detail.
    pub message: String,
}

/// Durable user store.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| StoreError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(USERS).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        info!(path = %path.as_ref().display(), "store opened");
        Ok(Self { db })
    }

    /// Check that the store is readable.
    pub fn health(&self) -> Health {
        match self.user_count() {
            Ok(users) => Health { status: HealthStatus::Up, users, message: "It's healthy".into() },
            Err(e) => Health { status: HealthStatus::Down, users: 0, message: format!("db down: {e}") },
        }
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(USERS).map_err(|e| StoreError::Io(e.to_string()))?;
        table.len().map_err(|e| StoreError::Io(e.to_string()))
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is taken.
    pub fn put_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(user, &mut bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(USERS).map_err(|e| StoreError::Io(e.to_string()))?;
            let exists = table
                .get(user.username.as_str())
                .map_err(|e| StoreError::Io(e.to_string()))?
                .is_some();
            if exists {
                return Err(StoreError::Conflict(user.username.clone()));
            }
            table
                .insert(user.username.as_str(), bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    /// Look up a user. `None` if not registered.
    pub fn user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(USERS).map_err(|e| StoreError::Io(e.to_string()))?;

        match table.get(username).map_err(|e| StoreError::Io(e.to_string()))? {
            Some(value) => {
                let user: UserRecord = ciborium::from_reader(value.value())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(user))
            },
            None => Ok(None),
        }
    }

    /// Record a login by `username`.
    ///
    /// Returns the stored record for a returning user, `None` on first
    /// login.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Serialization` if the store
    /// cannot be read or written.
    pub fn record_visit(
        &self,
        username: &str,
        key_fingerprint: Option<String>,
    ) -> Result<Option<UserRecord>, StoreError> {
        if let Some(existing) = self.user(username)? {
            return Ok(Some(existing));
        }
        match self.put_user(&UserRecord::new(username, key_fingerprint)) {
            // Lost a race with a concurrent first login
            Ok(()) | Err(StoreError::Conflict(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Close the database.
    pub fn close(self) {
        drop(self.db);
        info!("store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("lair.redb")).unwrap();
        let health = store.health();
        assert_eq!(health.status, HealthStatus::Up);
        assert_eq!(health.users, 0);
        store.close();
    }

    #[test]
    fn users_round_trip_and_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lair.redb");

        let store = Store::open(&path).unwrap();
        let ada = UserRecord::new("ada", Some("SHA256:abc".into()));
        store.put_user(&ada).unwrap();
        assert!(matches!(store.put_user(&ada), Err(StoreError::Conflict(name)) if name == "ada"));
        store.close();

        let store = Store::open(&path).unwrap();
        assert_eq!(store.user("ada").unwrap(), Some(ada));
        assert_eq!(store.user("grace").unwrap(), None);
        assert_eq!(store.health().users, 1);
    }

    #[test]
    fn visits_are_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("lair.redb")).unwrap();

        assert_eq!(store.record_visit("grace", None).unwrap(), None);
        let again = store.record_visit("grace", Some("SHA256:later".into())).unwrap().unwrap();
        assert_eq!(again.username, "grace");
        assert_eq!(again.key_fingerprint, None);
        assert_eq!(store.health().users, 1);
    }
}
