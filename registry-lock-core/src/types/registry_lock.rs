//! Registry lock record and the lock state machine vocabulary

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    /// Lowercase verb used in emails and history reasons
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }
}

impl fmt::Display for LockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Domain level lock view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockStatus {
    NotLocked,
    Pending,
    Locked,
}

/// Lifecycle state of a single lock record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LockRecordState {
    /// Waiting for email verification
    Pending,
    /// Verification window elapsed without completion
    Expired,
    /// Verified and applied to the domain
    Completed,
}

/// A lock or unlock request and, once verified, its completion.
///
/// Records are pending until `completion_time` is set. A pending record older
/// than the verification window is expired and can no longer be verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryLock {
    /// Assigned by the store on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<i64>,
    pub repo_id: String,
    pub domain_name: String,
    pub registrar_id: String,
    /// Requesting contact; `None` for admin actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar_poc_id: Option<String>,
    pub action: LockAction,
    pub is_superuser: bool,
    pub verification_code: String,
    pub creation_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    /// Unlocks only: re-lock automatically this long after completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relock_duration: Option<Duration>,
    /// Revision of the lock that re-locked the domain after this unlock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relock_revision_id: Option<i64>,
    /// Set once the automatic relock for this unlock has been handled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relock_processed_time: Option<DateTime<Utc>>,
}

impl RegistryLock {
    /// Create a pending record with a fresh verification code
    #[must_use]
    pub fn new_pending(
        repo_id: String,
        domain_name: String,
        registrar_id: String,
        registrar_poc_id: Option<String>,
        action: LockAction,
        is_superuser: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            revision_id: None,
            repo_id,
            domain_name,
            registrar_id,
            registrar_poc_id,
            action,
            is_superuser,
            verification_code: uuid::Uuid::new_v4().to_string(),
            creation_time: now,
            completion_time: None,
            relock_duration: None,
            relock_revision_id: None,
            relock_processed_time: None,
        }
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.completion_time.is_some()
    }

    /// Pending past the window; a record created at `t` is still live at `t + window`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.is_verified() {
            return false;
        }
        match chrono::Duration::from_std(window) {
            Ok(window) => self.creation_time + window < now,
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, now: DateTime<Utc>, window: Duration) -> bool {
        !self.is_verified() && !self.is_expired(now, window)
    }

    #[must_use]
    pub fn state(&self, now: DateTime<Utc>, window: Duration) -> LockRecordState {
        if self.is_verified() {
            LockRecordState::Completed
        } else if self.is_expired(now, window) {
            LockRecordState::Expired
        } else {
            LockRecordState::Pending
        }
    }

    /// When the automatic relock of this unlock becomes due
    #[must_use]
    pub fn relock_due_time(&self) -> Option<DateTime<Utc>> {
        if self.action != LockAction::Unlock {
            return None;
        }
        let completed = self.completion_time?;
        let duration = chrono::Duration::from_std(self.relock_duration?).ok()?;
        completed.checked_add_signed(duration)
    }

    /// Verified unlock whose automatic relock has not been handled yet
    #[must_use]
    pub fn has_pending_relock(&self) -> bool {
        self.relock_due_time().is_some()
            && self.relock_revision_id.is_none()
            && self.relock_processed_time.is_none()
    }
}
