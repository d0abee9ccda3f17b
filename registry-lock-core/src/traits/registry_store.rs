//! Transactional storage abstraction for the lock workflow

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{BillingEvent, Domain, HistoryEntry, RegistryLock};

/// Opens units of work against the registry store
///
/// Platform implementation:
/// - `SqliteStore` (`SeaORM`, registry-lock-app)
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Begin a transaction. Dropping it without `commit` discards every write.
    async fn begin(&self) -> CoreResult<Box<dyn LockTransaction>>;
}

/// All reads and writes of one unit of work
#[async_trait]
pub trait LockTransaction: Send {
    // === Domains ===

    /// Load a domain by fully qualified name
    async fn load_domain(&mut self, domain_name: &str) -> CoreResult<Option<Domain>>;

    /// Load a domain by repository id
    async fn load_domain_by_repo_id(&mut self, repo_id: &str) -> CoreResult<Option<Domain>>;

    /// Write a domain loaded in this transaction.
    ///
    /// # Errors
    /// `CoreError::ConcurrentModification` when the stored revision no longer
    /// equals `domain.revision`.
    ///
    /// # Returns
    /// The domain as stored, with the bumped revision
    async fn update_domain(&mut self, domain: &Domain) -> CoreResult<Domain>;

    // === Lock records ===

    async fn find_lock_by_verification_code(
        &mut self,
        verification_code: &str,
    ) -> CoreResult<Option<RegistryLock>>;

    async fn find_lock_by_revision_id(&mut self, revision_id: i64)
        -> CoreResult<Option<RegistryLock>>;

    /// Highest revision for the domain, verified or not
    async fn find_most_recent_lock(&mut self, repo_id: &str) -> CoreResult<Option<RegistryLock>>;

    /// Highest verified revision for the domain
    async fn find_most_recent_verified_lock(
        &mut self,
        repo_id: &str,
    ) -> CoreResult<Option<RegistryLock>>;

    /// Every record of a registrar, oldest first
    async fn find_locks_by_registrar(&mut self, registrar_id: &str)
        -> CoreResult<Vec<RegistryLock>>;

    /// Verified unlocks with a relock duration whose relock is unprocessed
    async fn find_relock_candidates(&mut self) -> CoreResult<Vec<RegistryLock>>;

    /// Insert (no revision id yet) or update a lock record.
    ///
    /// # Errors
    /// Fails on a duplicate verification code.
    ///
    /// # Returns
    /// The record with its revision id
    async fn save_lock(&mut self, lock: &RegistryLock) -> CoreResult<RegistryLock>;

    // === Audit ===

    async fn insert_history(&mut self, entry: &HistoryEntry) -> CoreResult<()>;

    async fn insert_billing_event(&mut self, event: &BillingEvent) -> CoreResult<()>;

    /// Make every write of this transaction durable
    async fn commit(self: Box<Self>) -> CoreResult<()>;
}
