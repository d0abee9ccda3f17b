//! Request / response types of the lock services

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::registry_lock::LockAction;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub email: String,
    /// Registry staff
    #[serde(default)]
    pub is_admin: bool,
}

impl Actor {
    #[must_use]
    pub fn user(email: &str) -> Self {
        Self {
            email: email.to_string(),
            is_admin: false,
        }
    }

    #[must_use]
    pub fn admin(email: &str) -> Self {
        Self {
            email: email.to_string(),
            is_admin: true,
        }
    }
}

/// Console lock / unlock request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    pub registrar_id: String,
    pub domain_name: String,
    pub is_lock: bool,
    /// Registry lock password; ignored for admins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Unlocks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relock_duration: Option<Duration>,
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub domain_name: String,
    pub action: LockAction,
}

/// Currently locked domain of a registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedDomainView {
    pub domain_name: String,
    pub locked_time: Option<DateTime<Utc>>,
    /// `admin` for superuser locks, else the requesting contact
    pub locked_by: String,
}

/// Registry lock page data for one registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocksOverview {
    pub lock_enabled_for_contact: bool,
    pub email: String,
    pub registrar_id: String,
    pub locks: Vec<LockedDomainView>,
}

/// Bulk admin lock / unlock result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLockResult {
    pub success_count: usize,
    pub failed_count: usize,
    pub failures: Vec<BatchLockFailure>,
}

/// Bulk admin lock / unlock failure detail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLockFailure {
    pub domain_name: String,
    pub reason: String,
}

/// Result of one automated relock attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RelockOutcome {
    /// Domain locked again; carries the new lock's revision id
    Relocked { domain_name: String, revision_id: i64 },
    /// Someone already re-locked the domain
    Skipped { message: String },
    /// Preconditions failed; will not be retried
    Failed { message: String },
}

/// Result of one relock sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelockSweepResult {
    pub relocked: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Unexpected errors, retried on the next sweep
    pub errors: usize,
}
