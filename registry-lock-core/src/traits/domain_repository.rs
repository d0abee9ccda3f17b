//! Domain provisioning and audit read access

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{BillingEvent, Domain, HistoryEntry};

/// Domain repository Trait
///
/// Used for provisioning and inspection outside the lock workflow; lock
/// mutations go through [`super::LockTransaction`].
#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<Domain>>;

    async fn find_by_name(&self, domain_name: &str) -> CoreResult<Option<Domain>>;

    /// Upsert a domain, bumping its revision
    async fn save(&self, domain: &Domain) -> CoreResult<()>;
}

/// Audit trail read access
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// History of a domain, oldest first
    async fn find_history_by_repo_id(&self, repo_id: &str) -> CoreResult<Vec<HistoryEntry>>;

    /// Billing events targeting a domain name, oldest first
    async fn find_billing_events_by_target(&self, target_id: &str)
        -> CoreResult<Vec<BillingEvent>>;
}
