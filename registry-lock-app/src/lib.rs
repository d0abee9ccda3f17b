//! Platform-agnostic application bootstrap for Registry Lock.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter
//! injection), `AppConfig` (TOML configuration) and the background relock
//! worker.

pub mod adapters;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::services::{
    DomainLockService, LockRequestService, RelockService, ServiceContext,
};
use registry_lock_core::traits::{
    AuditRepository, Clock, DomainRepository, EmailSender, RegistrarRepository, RegistryStore,
    SystemClock,
};
use registry_lock_core::types::{LockConfig, RelockSweepResult};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use adapters::LogEmailSender;
#[cfg(feature = "sqlite-store")]
use adapters::SqliteStore;
#[cfg(feature = "sqlite-store")]
use config::{AppConfig, EmailBackend};

/// Platform-agnostic application state.
///
/// Holds all services and the `ServiceContext`. Every frontend constructs this
/// once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Service context (holds all adapters)
    pub ctx: Arc<ServiceContext>,
    /// Lock state machine, used directly by admin tooling
    pub domain_lock_service: Arc<DomainLockService>,
    /// Console-facing lock / unlock flow
    pub lock_request_service: LockRequestService,
    /// Automatic relock after temporary unlocks
    pub relock_service: Arc<RelockService>,
}

impl AppState {
    /// Run one relock sweep now.
    pub async fn run_relock_sweep(&self) -> CoreResult<RelockSweepResult> {
        self.relock_service.run_due_relocks().await
    }

    /// Spawn the relock worker.
    ///
    /// Sweeps every `interval` (first sweep immediately) until `shutdown`
    /// becomes `true` or its sender is dropped.
    pub fn spawn_relock_worker(
        &self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let relock_service = Arc::clone(&self.relock_service);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!("Relock worker started, interval {}s", interval.as_secs());

            loop {
                if *shutdown.borrow() {
                    break;
                }

                tokio::select! {
                    _ = ticker.tick() => {
                        match relock_service.run_due_relocks().await {
                            Ok(result) => log::debug!("Relock sweep finished: {result:?}"),
                            Err(e) => log::error!("Relock sweep failed: {e}"),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            log::info!("Relock worker stopped");
        })
    }
}

#[cfg(feature = "sqlite-store")]
impl AppState {
    /// Open the configured `SQLite` database and wire every adapter to it.
    ///
    /// The store is returned as well so frontends can reach the outbox.
    pub async fn open_sqlite(config: &AppConfig) -> CoreResult<(Self, Arc<SqliteStore>)> {
        let store = Arc::new(SqliteStore::new(&config.resolved_database_path()).await?);

        let email_sender: Arc<dyn EmailSender> = match config.email.backend {
            EmailBackend::Log => Arc::new(LogEmailSender::new()),
            EmailBackend::Outbox => Arc::clone(&store) as Arc<dyn EmailSender>,
        };

        let state = AppStateBuilder::new()
            .sqlite_store(Arc::clone(&store))
            .email_sender(email_sender)
            .config(config.lock.clone())
            .build()?;

        Ok((state, store))
    }
}

/// Builder for constructing `AppState` from storage and email adapters.
///
/// # Required adapters
/// - `registry_store` — transactional lock storage
/// - `registrar_repository` — registrars and their contacts
/// - `domain_repository` — domain provisioning outside the lock flow
/// - `audit_repository` — history and billing reads
///
/// # Optional
/// - `email_sender` — defaults to `LogEmailSender`
/// - `clock` — defaults to `SystemClock`
/// - `config` — defaults to `LockConfig::default()`
pub struct AppStateBuilder {
    registry_store: Option<Arc<dyn RegistryStore>>,
    registrar_repository: Option<Arc<dyn RegistrarRepository>>,
    domain_repository: Option<Arc<dyn DomainRepository>>,
    audit_repository: Option<Arc<dyn AuditRepository>>,
    email_sender: Option<Arc<dyn EmailSender>>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<LockConfig>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry_store: None,
            registrar_repository: None,
            domain_repository: None,
            audit_repository: None,
            email_sender: None,
            clock: None,
            config: None,
        }
    }

    #[must_use]
    pub fn registry_store(mut self, store: Arc<dyn RegistryStore>) -> Self {
        self.registry_store = Some(store);
        self
    }

    #[must_use]
    pub fn registrar_repository(mut self, repo: Arc<dyn RegistrarRepository>) -> Self {
        self.registrar_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn domain_repository(mut self, repo: Arc<dyn DomainRepository>) -> Self {
        self.domain_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn audit_repository(mut self, repo: Arc<dyn AuditRepository>) -> Self {
        self.audit_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn email_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn config(mut self, config: LockConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use one `SqliteStore` for every storage adapter.
    #[cfg(feature = "sqlite-store")]
    #[must_use]
    pub fn sqlite_store(self, store: Arc<SqliteStore>) -> Self {
        self.registry_store(Arc::clone(&store) as Arc<dyn RegistryStore>)
            .registrar_repository(Arc::clone(&store) as Arc<dyn RegistrarRepository>)
            .domain_repository(Arc::clone(&store) as Arc<dyn DomainRepository>)
            .audit_repository(store)
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let registry_store = self.registry_store.ok_or_else(|| {
            CoreError::ValidationError("registry_store is required".to_string())
        })?;
        let registrar_repository = self.registrar_repository.ok_or_else(|| {
            CoreError::ValidationError("registrar_repository is required".to_string())
        })?;
        let domain_repository = self.domain_repository.ok_or_else(|| {
            CoreError::ValidationError("domain_repository is required".to_string())
        })?;
        let audit_repository = self.audit_repository.ok_or_else(|| {
            CoreError::ValidationError("audit_repository is required".to_string())
        })?;
        let email_sender = self
            .email_sender
            .unwrap_or_else(|| Arc::new(LogEmailSender::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let config = self.config.unwrap_or_default();

        let ctx = Arc::new(ServiceContext::new(
            registry_store,
            registrar_repository,
            domain_repository,
            audit_repository,
            email_sender,
            clock,
            config,
        ));

        let domain_lock_service = Arc::new(DomainLockService::new(Arc::clone(&ctx)));
        let lock_request_service = LockRequestService::new(Arc::clone(&ctx));
        let relock_service = Arc::new(RelockService::new(Arc::clone(&ctx)));

        Ok(AppState {
            ctx,
            domain_lock_service,
            lock_request_service,
            relock_service,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
