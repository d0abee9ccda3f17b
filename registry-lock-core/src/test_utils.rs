//! Test helper module
//!
//! In-memory mock implementations and a harness wiring them into a `ServiceContext`.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::services::{DomainLockService, LockRequestService, RelockService, ServiceContext};
use crate::traits::{
    AuditRepository, DomainRepository, EmailSender, LockTransaction, ManualClock,
    RegistrarRepository, RegistryStore,
};
use crate::types::{
    with_lock_statuses, BillingEvent, Domain, EmailMessage, HistoryEntry, LockConfig, Registrar,
    RegistrarContact, RegistryLock,
};

/// Registry lock password of every contact created by [`TestHarness::add_registrar`]
pub const LOCK_PASSWORD: &str = "correct horse battery staple";

// ===== MockRegistryStore =====

#[derive(Clone, Default)]
struct MockState {
    /// Keyed by repo id
    domains: HashMap<String, Domain>,
    /// Keyed by revision id
    locks: BTreeMap<i64, RegistryLock>,
    history: Vec<HistoryEntry>,
    billing: Vec<BillingEvent>,
    last_revision_id: i64,
}

impl MockState {
    fn domain_by_name(&self, domain_name: &str) -> Option<&Domain> {
        self.domains
            .values()
            .find(|d| d.domain_name.eq_ignore_ascii_case(domain_name))
    }
}

/// In-memory store; transactions are serialized and staged until commit
pub struct MockRegistryStore {
    state: Arc<Mutex<MockState>>,
    /// Number of upcoming `update_domain` calls that fail with a conflict
    conflicts: Arc<AtomicU32>,
}

impl MockRegistryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            conflicts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn inject_conflicts(&self, count: u32) {
        self.conflicts.store(count, Ordering::SeqCst);
    }

    /// Write a domain directly, bumping its stored revision
    pub async fn put_domain(&self, mut domain: Domain) {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.domains.get(&domain.repo_id) {
            domain.revision = existing.revision + 1;
        }
        state.domains.insert(domain.repo_id.clone(), domain);
    }

    /// Overwrite a stored lock record
    pub async fn put_lock(&self, lock: RegistryLock) {
        if let Some(revision_id) = lock.revision_id {
            self.state.lock().await.locks.insert(revision_id, lock);
        }
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.state.lock().await.history.clone()
    }

    pub async fn billing_events(&self) -> Vec<BillingEvent> {
        self.state.lock().await.billing.clone()
    }

    pub async fn lock_by_code(&self, code: &str) -> Option<RegistryLock> {
        let state = self.state.lock().await;
        state
            .locks
            .values()
            .find(|l| l.verification_code == code)
            .cloned()
    }

    pub async fn lock_by_revision(&self, revision_id: i64) -> Option<RegistryLock> {
        self.state.lock().await.locks.get(&revision_id).cloned()
    }

    pub async fn most_recent_lock(&self, domain_name: &str) -> Option<RegistryLock> {
        let state = self.state.lock().await;
        state
            .locks
            .values()
            .rev()
            .find(|l| l.domain_name == domain_name)
            .cloned()
    }
}

struct MockTransaction {
    guard: OwnedMutexGuard<MockState>,
    staged: MockState,
    conflicts: Arc<AtomicU32>,
}

#[async_trait]
impl RegistryStore for MockRegistryStore {
    async fn begin(&self) -> CoreResult<Box<dyn LockTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MockTransaction {
            guard,
            staged,
            conflicts: Arc::clone(&self.conflicts),
        }))
    }
}

#[async_trait]
impl LockTransaction for MockTransaction {
    async fn load_domain(&mut self, domain_name: &str) -> CoreResult<Option<Domain>> {
        Ok(self.staged.domain_by_name(domain_name).cloned())
    }

    async fn load_domain_by_repo_id(&mut self, repo_id: &str) -> CoreResult<Option<Domain>> {
        Ok(self.staged.domains.get(repo_id).cloned())
    }

    async fn update_domain(&mut self, domain: &Domain) -> CoreResult<Domain> {
        let injected = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let stored_revision = self.staged.domains.get(&domain.repo_id).map(|d| d.revision);
        if injected || stored_revision != Some(domain.revision) {
            return Err(CoreError::ConcurrentModification(format!(
                "domain {}",
                domain.domain_name
            )));
        }
        let mut updated = domain.clone();
        updated.revision += 1;
        self.staged
            .domains
            .insert(updated.repo_id.clone(), updated.clone());
        Ok(updated)
    }

    async fn find_lock_by_verification_code(
        &mut self,
        verification_code: &str,
    ) -> CoreResult<Option<RegistryLock>> {
        Ok(self
            .staged
            .locks
            .values()
            .find(|l| l.verification_code == verification_code)
            .cloned())
    }

    async fn find_lock_by_revision_id(
        &mut self,
        revision_id: i64,
    ) -> CoreResult<Option<RegistryLock>> {
        Ok(self.staged.locks.get(&revision_id).cloned())
    }

    async fn find_most_recent_lock(&mut self, repo_id: &str) -> CoreResult<Option<RegistryLock>> {
        Ok(self
            .staged
            .locks
            .values()
            .rev()
            .find(|l| l.repo_id == repo_id)
            .cloned())
    }

    async fn find_most_recent_verified_lock(
        &mut self,
        repo_id: &str,
    ) -> CoreResult<Option<RegistryLock>> {
        Ok(self
            .staged
            .locks
            .values()
            .rev()
            .find(|l| l.repo_id == repo_id && l.is_verified())
            .cloned())
    }

    async fn find_locks_by_registrar(
        &mut self,
        registrar_id: &str,
    ) -> CoreResult<Vec<RegistryLock>> {
        Ok(self
            .staged
            .locks
            .values()
            .filter(|l| l.registrar_id == registrar_id)
            .cloned()
            .collect())
    }

    async fn find_relock_candidates(&mut self) -> CoreResult<Vec<RegistryLock>> {
        Ok(self
            .staged
            .locks
            .values()
            .filter(|l| {
                l.is_verified() && l.relock_duration.is_some() && l.relock_processed_time.is_none()
            })
            .cloned()
            .collect())
    }

    async fn save_lock(&mut self, lock: &RegistryLock) -> CoreResult<RegistryLock> {
        let mut saved = lock.clone();
        let revision_id = match lock.revision_id {
            Some(id) => id,
            None => {
                let duplicate = self
                    .staged
                    .locks
                    .values()
                    .any(|l| l.verification_code == lock.verification_code);
                if duplicate {
                    return Err(CoreError::StorageError(
                        "duplicate verification code".to_string(),
                    ));
                }
                self.staged.last_revision_id += 1;
                self.staged.last_revision_id
            }
        };
        saved.revision_id = Some(revision_id);
        self.staged.locks.insert(revision_id, saved.clone());
        Ok(saved)
    }

    async fn insert_history(&mut self, entry: &HistoryEntry) -> CoreResult<()> {
        self.staged.history.push(entry.clone());
        Ok(())
    }

    async fn insert_billing_event(&mut self, event: &BillingEvent) -> CoreResult<()> {
        self.staged.billing.push(event.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let MockTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl DomainRepository for MockRegistryStore {
    async fn find_all(&self) -> CoreResult<Vec<Domain>> {
        Ok(self.state.lock().await.domains.values().cloned().collect())
    }

    async fn find_by_name(&self, domain_name: &str) -> CoreResult<Option<Domain>> {
        Ok(self.state.lock().await.domain_by_name(domain_name).cloned())
    }

    async fn save(&self, domain: &Domain) -> CoreResult<()> {
        self.put_domain(domain.clone()).await;
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for MockRegistryStore {
    async fn find_history_by_repo_id(&self, repo_id: &str) -> CoreResult<Vec<HistoryEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.repo_id == repo_id)
            .cloned()
            .collect())
    }

    async fn find_billing_events_by_target(
        &self,
        target_id: &str,
    ) -> CoreResult<Vec<BillingEvent>> {
        let state = self.state.lock().await;
        Ok(state
            .billing
            .iter()
            .filter(|b| b.target_id == target_id)
            .cloned()
            .collect())
    }
}

// ===== MockRegistrarRepository =====

pub struct MockRegistrarRepository {
    registrars: RwLock<HashMap<String, Registrar>>,
}

impl MockRegistrarRepository {
    pub fn new() -> Self {
        Self {
            registrars: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RegistrarRepository for MockRegistrarRepository {
    async fn find_all(&self) -> CoreResult<Vec<Registrar>> {
        Ok(self.registrars.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, registrar_id: &str) -> CoreResult<Option<Registrar>> {
        Ok(self.registrars.read().await.get(registrar_id).cloned())
    }

    async fn save(&self, registrar: &Registrar) -> CoreResult<()> {
        self.registrars
            .write()
            .await
            .insert(registrar.registrar_id.clone(), registrar.clone());
        Ok(())
    }
}

// ===== MockEmailSender =====

pub struct MockEmailSender {
    sent: RwLock<Vec<EmailMessage>>,
    fail: RwLock<bool>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail: RwLock::new(false),
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().await.clone()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()> {
        if *self.fail.read().await {
            return Err(CoreError::EmailError("mail relay unavailable".to_string()));
        }
        self.sent.write().await.push(message.clone());
        Ok(())
    }
}

// ===== TestHarness =====

pub struct TestHarness {
    pub store: Arc<MockRegistryStore>,
    pub registrars: Arc<MockRegistrarRepository>,
    pub emails: Arc<MockEmailSender>,
    pub clock: ManualClock,
    pub ctx: Arc<ServiceContext>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(customize: impl FnOnce(&mut LockConfig)) -> Self {
        let mut config = LockConfig::default();
        customize(&mut config);

        let store = Arc::new(MockRegistryStore::new());
        let registrars = Arc::new(MockRegistrarRepository::new());
        let emails = Arc::new(MockEmailSender::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let ctx = Arc::new(ServiceContext::new(
            store.clone(),
            registrars.clone(),
            store.clone(),
            store.clone(),
            emails.clone(),
            Arc::new(clock.clone()),
            config,
        ));
        Self {
            store,
            registrars,
            emails,
            clock,
            ctx,
        }
    }

    pub fn lock_service(&self) -> DomainLockService {
        DomainLockService::new(Arc::clone(&self.ctx))
    }

    pub fn request_service(&self) -> LockRequestService {
        LockRequestService::new(Arc::clone(&self.ctx))
    }

    pub fn relock_service(&self) -> RelockService {
        RelockService::new(Arc::clone(&self.ctx))
    }

    /// Add a live, unlocked domain
    pub async fn add_domain(&self, domain_name: &str, registrar_id: &str) -> Domain {
        let count = self.store.state.lock().await.domains.len();
        let domain = Domain::new(
            format!("{}-TLD", count + 1),
            domain_name.to_string(),
            registrar_id.to_string(),
        );
        self.store.put_domain(domain.clone()).await;
        domain
    }

    /// Add a domain carrying every lock status, with no lock record behind it
    pub async fn add_locked_domain(&self, domain_name: &str, registrar_id: &str) -> Domain {
        let mut domain = self.add_domain(domain_name, registrar_id).await;
        domain.statuses = with_lock_statuses(&domain.statuses);
        self.store.put_domain(domain.clone()).await;
        self.domain(domain_name).await
    }

    pub async fn domain(&self, domain_name: &str) -> Domain {
        self.store
            .find_by_name(domain_name)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("domain {domain_name} not found"))
    }

    /// Add a registrar whose contacts all have registry lock enabled with
    /// [`LOCK_PASSWORD`] and lock email `lock-<email>`
    pub async fn add_registrar(&self, registrar_id: &str, lock_allowed: bool, emails: &[&str]) {
        let contacts = emails
            .iter()
            .map(|email| {
                let mut contact = RegistrarContact::new((*email).to_string());
                contact.enable_registry_lock(format!("lock-{email}"), LOCK_PASSWORD);
                contact
            })
            .collect();
        let registrar = Registrar {
            registrar_id: registrar_id.to_string(),
            name: format!("{registrar_id} Inc."),
            registry_lock_allowed: lock_allowed,
            contacts,
        };
        self.registrars.save(&registrar).await.unwrap();
    }
}
