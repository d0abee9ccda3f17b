//! Business logic service layer

mod domain_lock_service;
mod lock_request_service;
mod relock_service;

pub use domain_lock_service::DomainLockService;
pub use lock_request_service::LockRequestService;
pub use relock_service::RelockService;

use std::future::Future;
use std::sync::Arc;

use crate::error::CoreResult;
use crate::traits::{
    AuditRepository, Clock, DomainRepository, EmailSender, RegistrarRepository, RegistryStore,
};
use crate::types::LockConfig;

/// Service context - holds all dependencies
///
/// The platform layer creates this context and injects its storage, email and
/// clock implementations.
pub struct ServiceContext {
    registry_store: Arc<dyn RegistryStore>,
    registrar_repository: Arc<dyn RegistrarRepository>,
    domain_repository: Arc<dyn DomainRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    email_sender: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    config: LockConfig,
}

impl ServiceContext {
    /// Create a service context
    #[must_use]
    pub fn new(
        registry_store: Arc<dyn RegistryStore>,
        registrar_repository: Arc<dyn RegistrarRepository>,
        domain_repository: Arc<dyn DomainRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        email_sender: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        config: LockConfig,
    ) -> Self {
        Self {
            registry_store,
            registrar_repository,
            domain_repository,
            audit_repository,
            email_sender,
            clock,
            config,
        }
    }

    #[must_use]
    pub fn registry_store(&self) -> &dyn RegistryStore {
        self.registry_store.as_ref()
    }

    #[must_use]
    pub fn registrar_repository(&self) -> &dyn RegistrarRepository {
        self.registrar_repository.as_ref()
    }

    #[must_use]
    pub fn domain_repository(&self) -> &dyn DomainRepository {
        self.domain_repository.as_ref()
    }

    #[must_use]
    pub fn audit_repository(&self) -> &dyn AuditRepository {
        self.audit_repository.as_ref()
    }

    #[must_use]
    pub fn email_sender(&self) -> &dyn EmailSender {
        self.email_sender.as_ref()
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Run a unit of work, rerunning it from scratch while it fails with a
    /// retryable error, up to `max_transaction_attempts` times.
    ///
    /// Every attempt must open and commit its own transaction.
    pub async fn retry_on_conflict<T, F, Fut>(&self, operation: &str, mut work: F) -> CoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let max_attempts = self.config.max_transaction_attempts.max(1);
        let mut attempt = 1;
        loop {
            match work().await {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    log::warn!("{operation}: attempt {attempt}/{max_attempts} conflicted, retrying: {e}");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
