//! Type definitions

mod config;
mod domain;
mod email;
mod history;
mod registrar;
mod registry_lock;
mod request;
mod status;

pub use config::LockConfig;
pub use domain::{tld_of, Domain};
pub use email::EmailMessage;
pub use history::{BillingEvent, BillingReason, HistoryEntry, HistoryType, Money};
pub use registrar::{is_valid_email, Registrar, RegistrarContact};
pub use registry_lock::{LockAction, LockRecordState, LockStatus, RegistryLock};
pub use request::{
    Actor, BatchLockFailure, BatchLockResult, LockRequest, LockedDomainView, LocksOverview,
    RelockOutcome, RelockSweepResult, VerificationOutcome,
};
pub use status::{with_lock_statuses, without_lock_statuses, StatusValue, REGISTRY_LOCK_STATUSES};
