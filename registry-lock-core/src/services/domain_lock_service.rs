//! Registry lock state machine
//!
//! Every operation runs as one unit of work: the preconditions are checked
//! against the state read inside the transaction, and the lock record, the
//! domain statuses, the history entry and the billing event are committed
//! together or not at all.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::LockTransaction;
use crate::types::{
    with_lock_statuses, without_lock_statuses, BatchLockFailure, BatchLockResult, BillingEvent,
    BillingReason, Domain, HistoryEntry, HistoryType, LockAction, LockStatus, RegistryLock,
};

/// Lock / unlock requests, verification and admin application
pub struct DomainLockService {
    ctx: Arc<ServiceContext>,
}

impl DomainLockService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    // ===== Two-phase requests =====

    /// Persist a pending lock request for a domain
    pub async fn create_registry_lock_request(
        &self,
        domain_name: &str,
        registrar_id: &str,
        registrar_poc_id: Option<&str>,
        is_admin: bool,
    ) -> CoreResult<RegistryLock> {
        self.ctx
            .retry_on_conflict("create lock request", || {
                self.create_request_once(
                    domain_name,
                    registrar_id,
                    registrar_poc_id,
                    LockAction::Lock,
                    is_admin,
                    None,
                )
            })
            .await
    }

    /// Persist a pending unlock request for a domain
    ///
    /// # Arguments
    /// * `relock_duration` - Lock the domain again this long after the unlock completes
    pub async fn create_registry_unlock_request(
        &self,
        domain_name: &str,
        registrar_id: &str,
        is_admin: bool,
        relock_duration: Option<Duration>,
    ) -> CoreResult<RegistryLock> {
        self.ctx
            .retry_on_conflict("create unlock request", || {
                self.create_request_once(
                    domain_name,
                    registrar_id,
                    None,
                    LockAction::Unlock,
                    is_admin,
                    relock_duration,
                )
            })
            .await
    }

    /// Complete a pending request identified by its verification code
    pub async fn verify_and_apply(
        &self,
        verification_code: &str,
        is_admin: bool,
    ) -> CoreResult<RegistryLock> {
        self.ctx
            .retry_on_conflict("verify lock request", || {
                self.verify_once(verification_code, is_admin)
            })
            .await
    }

    // ===== Single-step admin application =====

    /// Create and apply a lock in one transaction, without the email round trip
    pub async fn administratively_apply_lock(
        &self,
        domain_name: &str,
        registrar_id: &str,
        registrar_poc_id: Option<&str>,
        is_admin: bool,
    ) -> CoreResult<RegistryLock> {
        self.ctx
            .retry_on_conflict("apply lock", || {
                self.apply_once(
                    domain_name,
                    registrar_id,
                    registrar_poc_id,
                    LockAction::Lock,
                    is_admin,
                    None,
                )
            })
            .await
    }

    /// Create and apply an unlock in one transaction, without the email round trip
    pub async fn administratively_apply_unlock(
        &self,
        domain_name: &str,
        registrar_id: &str,
        is_admin: bool,
        relock_duration: Option<Duration>,
    ) -> CoreResult<RegistryLock> {
        self.ctx
            .retry_on_conflict("apply unlock", || {
                self.apply_once(
                    domain_name,
                    registrar_id,
                    None,
                    LockAction::Unlock,
                    is_admin,
                    relock_duration,
                )
            })
            .await
    }

    /// Lock or unlock several domains as registry staff
    ///
    /// Each domain is applied independently; failures are counted, not fatal.
    ///
    /// # Arguments
    /// * `registrar_id` - Requesting registrar, defaults to the registry admin registrar
    pub async fn bulk_apply(
        &self,
        domain_names: &[String],
        registrar_id: Option<&str>,
        action: LockAction,
        relock_duration: Option<Duration>,
    ) -> CoreResult<BatchLockResult> {
        let duplicates = find_duplicates(domain_names);
        if !duplicates.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Duplicate domain arguments found: '{}'",
                duplicates.join(", ")
            )));
        }

        let registrar_id =
            registrar_id.unwrap_or(self.ctx.config().registry_admin_registrar_id.as_str());

        let mut failures = Vec::new();
        for domain_name in domain_names {
            let result = match action {
                LockAction::Lock => {
                    self.administratively_apply_lock(domain_name, registrar_id, None, true)
                        .await
                }
                LockAction::Unlock => {
                    self.administratively_apply_unlock(
                        domain_name,
                        registrar_id,
                        true,
                        relock_duration,
                    )
                    .await
                }
            };
            if let Err(e) = result {
                if e.is_expected() {
                    log::warn!("Error when {}ing domain {domain_name}: {e}", action.verb());
                } else {
                    log::error!("Error when {}ing domain {domain_name}: {e}", action.verb());
                }
                failures.push(BatchLockFailure {
                    domain_name: domain_name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(BatchLockResult {
            success_count: domain_names.len() - failures.len(),
            failed_count: failures.len(),
            failures,
        })
    }

    // ===== Queries =====

    /// Domain level lock view
    pub async fn lock_status(&self, domain_name: &str) -> CoreResult<LockStatus> {
        let now = self.ctx.clock().now();
        let mut tx = self.ctx.registry_store().begin().await?;
        let domain = load_live_domain(tx.as_mut(), domain_name, now).await?;
        if domain.is_registry_locked() {
            return Ok(LockStatus::Locked);
        }
        let window = self.ctx.config().verification_window();
        let pending = tx
            .find_most_recent_lock(&domain.repo_id)
            .await?
            .is_some_and(|lock| lock.is_pending(now, window));
        Ok(if pending {
            LockStatus::Pending
        } else {
            LockStatus::NotLocked
        })
    }

    // ===== Units of work =====

    async fn create_request_once(
        &self,
        domain_name: &str,
        registrar_id: &str,
        registrar_poc_id: Option<&str>,
        action: LockAction,
        is_admin: bool,
        relock_duration: Option<Duration>,
    ) -> CoreResult<RegistryLock> {
        let now = self.ctx.clock().now();
        let mut tx = self.ctx.registry_store().begin().await?;
        let request = self
            .prepare_request(
                tx.as_mut(),
                domain_name,
                registrar_id,
                registrar_poc_id,
                action,
                is_admin,
                relock_duration,
                now,
            )
            .await?;
        let saved = tx.save_lock(&request).await?;
        tx.commit().await?;

        log::info!(
            "Created pending {} request for domain {} (registrar {registrar_id})",
            action.verb(),
            saved.domain_name
        );
        Ok(saved)
    }

    async fn verify_once(
        &self,
        verification_code: &str,
        is_admin: bool,
    ) -> CoreResult<RegistryLock> {
        let now = self.ctx.clock().now();
        let mut tx = self.ctx.registry_store().begin().await?;
        let lock = tx
            .find_lock_by_verification_code(verification_code)
            .await?
            .ok_or(CoreError::UnknownVerificationCode)?;

        if lock.is_verified() {
            return Err(CoreError::AlreadyVerified);
        }
        if lock.is_expired(now, self.ctx.config().verification_window()) {
            return Err(CoreError::LockExpired);
        }
        if lock.is_superuser && !is_admin {
            return Err(CoreError::AdminVerificationRequired);
        }

        let applied = self.apply_lock(tx.as_mut(), lock, now).await?;
        tx.commit().await?;

        log::info!(
            "Verified {} of domain {}",
            applied.action.verb(),
            applied.domain_name
        );
        Ok(applied)
    }

    async fn apply_once(
        &self,
        domain_name: &str,
        registrar_id: &str,
        registrar_poc_id: Option<&str>,
        action: LockAction,
        is_admin: bool,
        relock_duration: Option<Duration>,
    ) -> CoreResult<RegistryLock> {
        let now = self.ctx.clock().now();
        let mut tx = self.ctx.registry_store().begin().await?;
        let lock = self
            .apply_new_lock(
                tx.as_mut(),
                domain_name,
                registrar_id,
                registrar_poc_id,
                action,
                is_admin,
                relock_duration,
                now,
            )
            .await?;
        tx.commit().await?;

        log::info!(
            "Administratively applied {} to domain {}",
            action.verb(),
            lock.domain_name
        );
        Ok(lock)
    }

    // ===== Transaction steps =====

    /// Build and apply a fresh request inside an open transaction
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn apply_new_lock(
        &self,
        tx: &mut dyn LockTransaction,
        domain_name: &str,
        registrar_id: &str,
        registrar_poc_id: Option<&str>,
        action: LockAction,
        is_admin: bool,
        relock_duration: Option<Duration>,
        now: DateTime<Utc>,
    ) -> CoreResult<RegistryLock> {
        let request = self
            .prepare_request(
                tx,
                domain_name,
                registrar_id,
                registrar_poc_id,
                action,
                is_admin,
                relock_duration,
                now,
            )
            .await?;
        self.apply_lock(tx, request, now).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn prepare_request(
        &self,
        tx: &mut dyn LockTransaction,
        domain_name: &str,
        registrar_id: &str,
        registrar_poc_id: Option<&str>,
        action: LockAction,
        is_admin: bool,
        relock_duration: Option<Duration>,
        now: DateTime<Utc>,
    ) -> CoreResult<RegistryLock> {
        let domain = load_live_domain(tx, domain_name, now).await?;
        if !is_admin && domain.current_sponsor_registrar_id != registrar_id {
            return Err(CoreError::RegistrarAccessDenied(format!(
                "Domain {} is not owned by registrar {registrar_id}",
                domain.domain_name
            )));
        }

        // One pending action per domain, admins included
        let previous = tx.find_most_recent_lock(&domain.repo_id).await?;
        if let Some(previous) = &previous {
            if previous.is_pending(now, self.ctx.config().verification_window()) {
                return Err(CoreError::PendingActionExists {
                    domain: domain.domain_name.clone(),
                    action: previous.action,
                });
            }
        }

        let mut registrar_poc_id = registrar_poc_id.map(str::to_string);
        if action == LockAction::Unlock && !is_admin {
            let last_verified = match previous {
                Some(previous) if previous.is_verified() => Some(previous),
                _ => tx.find_most_recent_verified_lock(&domain.repo_id).await?,
            };
            let last_verified = last_verified.ok_or(CoreError::NoVerifiedLock)?;
            if last_verified.action != LockAction::Lock {
                return Err(CoreError::AlreadyUnlockedByRequest);
            }
            if last_verified.is_superuser {
                return Err(CoreError::AdminLockedDomain(domain.domain_name.clone()));
            }
            if registrar_poc_id.is_none() {
                registrar_poc_id = last_verified.registrar_poc_id;
            }
        }

        verify_current_statuses(&domain, action)?;

        let mut request = RegistryLock::new_pending(
            domain.repo_id,
            domain.domain_name,
            registrar_id.to_string(),
            registrar_poc_id,
            action,
            is_admin,
            now,
        );
        if action == LockAction::Unlock {
            request.relock_duration = relock_duration;
        }
        Ok(request)
    }

    /// Mutate the domain and stamp the lock as completed
    async fn apply_lock(
        &self,
        tx: &mut dyn LockTransaction,
        mut lock: RegistryLock,
        now: DateTime<Utc>,
    ) -> CoreResult<RegistryLock> {
        let mut domain = tx
            .load_domain(&lock.domain_name)
            .await?
            .filter(|d| !d.is_deleted_at(now))
            .ok_or_else(|| CoreError::DomainVanished(lock.domain_name.clone()))?;
        verify_current_statuses(&domain, lock.action)?;

        domain.statuses = match lock.action {
            LockAction::Lock => with_lock_statuses(&domain.statuses),
            LockAction::Unlock => without_lock_statuses(&domain.statuses),
        };
        domain.updated_at = now;
        let domain = tx.update_domain(&domain).await?;

        // Read before saving so the record being applied is not its own predecessor
        let superseded_unlock = match lock.action {
            LockAction::Lock => tx
                .find_most_recent_verified_lock(&domain.repo_id)
                .await?
                .filter(RegistryLock::has_pending_relock),
            LockAction::Unlock => None,
        };

        lock.completion_time = Some(now);
        let lock = tx.save_lock(&lock).await?;

        // A lock completed by any path closes the relock of the unlock before it
        if let Some(mut unlock) = superseded_unlock {
            unlock.relock_revision_id = lock.revision_id;
            unlock.relock_processed_time = Some(now);
            tx.save_lock(&unlock).await?;
        }

        let history = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            repo_id: domain.repo_id.clone(),
            domain_name: domain.domain_name.clone(),
            registrar_id: domain.current_sponsor_registrar_id.clone(),
            history_type: HistoryType::DomainUpdate,
            by_superuser: lock.is_superuser,
            requested_by_registrar: !lock.is_superuser,
            reason: lock.action.verb().to_string(),
            modification_time: now,
        };
        tx.insert_history(&history).await?;

        // Admin actions are free
        if !lock.is_superuser {
            let event = BillingEvent {
                id: uuid::Uuid::new_v4().to_string(),
                reason: BillingReason::ServerStatus,
                target_id: domain.domain_name.clone(),
                registrar_id: domain.current_sponsor_registrar_id.clone(),
                cost: self.ctx.config().server_status_change_cost(&domain.tld),
                event_time: now,
                billing_time: now,
                history_id: history.id.clone(),
            };
            tx.insert_billing_event(&event).await?;
        }

        Ok(lock)
    }
}

async fn load_live_domain(
    tx: &mut dyn LockTransaction,
    domain_name: &str,
    now: DateTime<Utc>,
) -> CoreResult<Domain> {
    tx.load_domain(domain_name)
        .await?
        .filter(|d| !d.is_deleted_at(now))
        .ok_or_else(|| CoreError::DomainNotFound(domain_name.to_string()))
}

fn verify_current_statuses(domain: &Domain, action: LockAction) -> CoreResult<()> {
    match action {
        LockAction::Lock if domain.is_registry_locked() => {
            Err(CoreError::AlreadyLocked(domain.domain_name.clone()))
        }
        LockAction::Unlock if !domain.has_any_lock_status() => {
            Err(CoreError::AlreadyUnlocked(domain.domain_name.clone()))
        }
        _ => Ok(()),
    }
}

fn find_duplicates(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            duplicates.insert(name.clone());
        }
    }
    duplicates.into_iter().collect()
}
