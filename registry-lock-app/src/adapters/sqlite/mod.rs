//! SQLite-based unified store using `SeaORM`.
//!
//! A single `SqliteStore` implements `RegistryStore`, `DomainRepository`,
//! `AuditRepository`, `RegistrarRepository` and `EmailSender` (as a durable
//! outbox), backed by a local `SQLite` database.

mod audit_repo;
mod domain_repo;
pub(crate) mod entity;
mod migration;
mod outbox;
mod registrar_repo;
mod transaction;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use registry_lock_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::sync::Mutex;

use migration::Migrator;

pub use outbox::OutboxEmail;

/// SQLite-based unified store for the CLI and worker frontends.
///
/// Lock transactions are serialized through `write_lock`; the domain
/// revision check in `update_domain` still catches writers from other
/// processes sharing the file.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
    pub(crate) write_lock: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Create a new `SQLite` store.
    ///
    /// - `db_path`: Path to the `SQLite` database file (created if not exists).
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        };

        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        log::debug!("Opened registry database at {}", db_path.display());
        Ok(store)
    }
}

/// Parse an RFC 3339 column into UTC.
pub(crate) fn parse_time(column: &str, value: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_optional_time(
    column: &str,
    value: Option<&str>,
) -> CoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_time(column, v)).transpose()
}

/// Parse a unit enum stored under its serde name.
pub(crate) fn parse_enum<T: serde::de::DeserializeOwned>(column: &str, value: String) -> CoreResult<T> {
    serde_json::from_value(serde_json::Value::String(value))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {column}: {e}")))
}

/// Serde name of a unit enum.
pub(crate) fn enum_name<T: serde::Serialize>(value: &T) -> CoreResult<String> {
    serde_json::to_value(value)
        .map_err(|e| CoreError::SerializationError(e.to_string()))?
        .as_str()
        .map(String::from)
        .ok_or_else(|| CoreError::SerializationError("Expected a unit enum".to_string()))
}
