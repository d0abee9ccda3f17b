//! Automatic re-lock of temporarily unlocked domains
//!
//! An unlock may carry a relock duration. Once it has elapsed the domain is
//! locked again as long as it was not deleted, transferred or put in a pending
//! state in the meantime. Each unlock is handled exactly once: every terminal
//! outcome stamps `relock_processed_time` in the same transaction as its
//! effects. Only the domain state checks are terminal; a failure to apply the
//! lock itself leaves the unlock unprocessed so the next sweep retries it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::services::{DomainLockService, ServiceContext};
use crate::traits::LockTransaction;
use crate::types::{
    Domain, EmailMessage, LockAction, RegistryLock, RelockOutcome, RelockSweepResult, StatusValue,
};

enum RelockAttempt {
    Relocked {
        old: RegistryLock,
        new: RegistryLock,
    },
    Skipped(String),
    Rejected {
        old: Option<RegistryLock>,
        message: String,
    },
}

/// Relock job
pub struct RelockService {
    ctx: Arc<ServiceContext>,
    domain_lock_service: DomainLockService,
}

impl RelockService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            domain_lock_service: DomainLockService::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Re-lock the domain of a verified unlock
    ///
    /// # Arguments
    /// * `old_unlock_revision_id` - Revision id of the unlock being reversed
    ///
    /// # Errors
    /// Failures while applying the new lock, such as a storage error or a
    /// pending request on the domain. The unlock stays unprocessed and an alert
    /// is sent. Rejected domain preconditions are reported as
    /// [`RelockOutcome::Failed`] instead.
    pub async fn relock(&self, old_unlock_revision_id: i64) -> CoreResult<RelockOutcome> {
        let attempt = self
            .ctx
            .retry_on_conflict("relock domain", || self.relock_once(old_unlock_revision_id))
            .await;

        match attempt {
            Ok(RelockAttempt::Relocked { old, new }) => {
                log::info!("Relocked domain {}.", old.domain_name);
                self.send_success_email(&old).await;
                Ok(RelockOutcome::Relocked {
                    domain_name: new.domain_name,
                    revision_id: new.revision_id.unwrap_or_default(),
                })
            }
            Ok(RelockAttempt::Skipped(message)) => {
                log::info!("{message}");
                Ok(RelockOutcome::Skipped { message })
            }
            Ok(RelockAttempt::Rejected { old, message }) => {
                log::warn!(
                    "Exception when attempting to relock domain with old revision ID \
                     {old_unlock_revision_id}: {message}"
                );
                if let Some(old) = old {
                    self.send_failure_email(&old, &message).await;
                }
                Ok(RelockOutcome::Failed { message })
            }
            Err(e) => {
                if e.is_expected() {
                    log::warn!(
                        "Relock of old revision ID {old_unlock_revision_id} deferred: {e}"
                    );
                } else {
                    log::error!(
                        "Exception when attempting to relock domain with old revision ID \
                         {old_unlock_revision_id}: {e}"
                    );
                }
                if let Some(old) = self.load_lock(old_unlock_revision_id).await {
                    self.send_failure_email(&old, &e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    /// Relock every unlock whose relock time has come
    pub async fn run_due_relocks(&self) -> CoreResult<RelockSweepResult> {
        let now = self.ctx.clock().now();
        let candidates = {
            let mut tx = self.ctx.registry_store().begin().await?;
            tx.find_relock_candidates().await?
        };

        let mut result = RelockSweepResult::default();
        for candidate in candidates {
            let (Some(revision_id), Some(due)) =
                (candidate.revision_id, candidate.relock_due_time())
            else {
                continue;
            };
            if due > now {
                continue;
            }
            match self.relock(revision_id).await {
                Ok(RelockOutcome::Relocked { .. }) => result.relocked += 1,
                Ok(RelockOutcome::Skipped { .. }) => result.skipped += 1,
                Ok(RelockOutcome::Failed { .. }) => result.failed += 1,
                Err(_) => result.errors += 1,
            }
        }

        if result.relocked + result.skipped + result.failed + result.errors > 0 {
            log::info!(
                "Relock sweep: {} relocked, {} skipped, {} failed, {} errors",
                result.relocked,
                result.skipped,
                result.failed,
                result.errors
            );
        }
        Ok(result)
    }

    async fn relock_once(&self, old_unlock_revision_id: i64) -> CoreResult<RelockAttempt> {
        let now = self.ctx.clock().now();
        let mut tx = self.ctx.registry_store().begin().await?;

        let Some(old) = tx.find_lock_by_revision_id(old_unlock_revision_id).await? else {
            return Ok(RelockAttempt::Rejected {
                old: None,
                message: CoreError::UnknownRevision(old_unlock_revision_id).to_string(),
            });
        };
        if old.action != LockAction::Unlock || !old.is_verified() {
            let message =
                format!("Lock with revision ID {old_unlock_revision_id} is not a verified unlock");
            return Ok(RelockAttempt::Rejected {
                old: None,
                message,
            });
        }

        let Some(domain) = tx.load_domain_by_repo_id(&old.repo_id).await? else {
            let message = format!("Domain {} has been deleted.", old.domain_name);
            return reject(tx, old, message, now).await;
        };

        let superseded = tx
            .find_most_recent_verified_lock(&old.repo_id)
            .await?
            .is_some_and(|latest| latest.revision_id > old.revision_id);
        if domain.is_registry_locked() || old.relock_revision_id.is_some() || superseded {
            let message = format!(
                "Domain {} is already manually relocked, skipping automated relock.",
                domain.domain_name
            );
            mark_processed(tx.as_mut(), old, now).await?;
            tx.commit().await?;
            return Ok(RelockAttempt::Skipped(message));
        }

        if let Err(message) = check_relockable(&old, &domain, now) {
            return reject(tx, old, message, now).await;
        }

        // Failures past this point leave the unlock unprocessed for the next sweep
        let new = self
            .domain_lock_service
            .apply_new_lock(
                tx.as_mut(),
                &domain.domain_name,
                &old.registrar_id,
                old.registrar_poc_id.as_deref(),
                LockAction::Lock,
                old.is_superuser,
                None,
                now,
            )
            .await?;

        let mut old = old;
        old.relock_revision_id = new.revision_id;
        let old = mark_processed(tx.as_mut(), old, now).await?;
        tx.commit().await?;
        Ok(RelockAttempt::Relocked { old, new })
    }

    async fn load_lock(&self, revision_id: i64) -> Option<RegistryLock> {
        let mut tx = self.ctx.registry_store().begin().await.ok()?;
        tx.find_lock_by_revision_id(revision_id).await.ok().flatten()
    }

    /// Registry lock contacts of a registrar; empty when the registrar is unknown
    async fn lock_recipients(&self, registrar_id: &str) -> Vec<String> {
        match self.ctx.registrar_repository().find_by_id(registrar_id).await {
            Ok(Some(registrar)) => registrar.registry_lock_recipients(),
            Ok(None) => {
                log::warn!("Unknown registrar {registrar_id}");
                Vec::new()
            }
            Err(e) => {
                log::error!("Failed to load registrar {registrar_id}: {e}");
                Vec::new()
            }
        }
    }

    async fn send_success_email(&self, old: &RegistryLock) {
        let config = self.ctx.config();
        let recipients = self.lock_recipients(&old.registrar_id).await;
        if recipients.is_empty() {
            log::warn!(
                "No registry lock contacts to notify about the re-lock of {}",
                old.domain_name
            );
            return;
        }
        let message = EmailMessage {
            from: config.outgoing_email_address.clone(),
            recipients,
            subject: format!("Successful re-lock of domain {}", old.domain_name),
            body: format!(
                "The domain {} was successfully re-locked.\n\nPlease contact support at {} if \
                 you have any questions.",
                old.domain_name, config.support_email
            ),
        };
        self.send(&message).await;
    }

    async fn send_failure_email(&self, old: &RegistryLock, error: &str) {
        let config = self.ctx.config();
        let mut recipients = self.lock_recipients(&old.registrar_id).await;
        if !recipients.contains(&config.alert_recipient_email_address) {
            recipients.push(config.alert_recipient_email_address.clone());
        }
        let message = EmailMessage {
            from: config.outgoing_email_address.clone(),
            recipients,
            subject: format!("Error re-locking domain {}", old.domain_name),
            body: format!(
                "There was an error when automatically re-locking {}. Error message: {error}\n\n\
                 Please contact support at {} if you have any questions.",
                old.domain_name, config.support_email
            ),
        };
        self.send(&message).await;
    }

    async fn send(&self, message: &EmailMessage) {
        if let Err(e) = self.ctx.email_sender().send(message).await {
            log::error!("Failed to send email '{}': {e}", message.subject);
        }
    }
}

/// Preconditions on the domain, checked at relock time
fn check_relockable(old: &RegistryLock, domain: &Domain, now: DateTime<Utc>) -> Result<(), String> {
    let name = &domain.domain_name;
    if domain.is_deleted_at(now) {
        return Err(format!("Domain {name} has been deleted."));
    }
    if domain.has_status(StatusValue::PendingDelete) {
        return Err(format!("Domain {name} has a pending delete."));
    }
    if domain.has_status(StatusValue::PendingTransfer) {
        return Err(format!("Domain {name} has a pending transfer."));
    }
    if domain.current_sponsor_registrar_id != old.registrar_id {
        return Err(format!(
            "Domain {name} has been transferred from registrar {} to registrar {} since the unlock.",
            old.registrar_id, domain.current_sponsor_registrar_id
        ));
    }
    Ok(())
}

async fn mark_processed(
    tx: &mut dyn LockTransaction,
    mut old: RegistryLock,
    now: DateTime<Utc>,
) -> CoreResult<RegistryLock> {
    old.relock_processed_time = Some(now);
    tx.save_lock(&old).await
}

/// Record a terminal failure so the sweep does not pick the unlock up again
async fn reject(
    mut tx: Box<dyn LockTransaction>,
    old: RegistryLock,
    message: String,
    now: DateTime<Utc>,
) -> CoreResult<RelockAttempt> {
    let old = mark_processed(tx.as_mut(), old, now).await?;
    tx.commit().await?;
    Ok(RelockAttempt::Rejected {
        old: Some(old),
        message,
    })
}
