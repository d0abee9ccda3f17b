//! Console-facing lock workflow
//!
//! Checks registrar access and the registry lock password, then delegates to
//! [`DomainLockService`] and mails the verification link to the requester.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::{DomainLockService, ServiceContext};
use crate::types::{
    Actor, EmailMessage, LockAction, LockRequest, LockedDomainView, LocksOverview, Registrar,
    RegistryLock, VerificationOutcome,
};

/// Registry lock console service
pub struct LockRequestService {
    ctx: Arc<ServiceContext>,
    domain_lock_service: DomainLockService,
}

impl LockRequestService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            domain_lock_service: DomainLockService::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Submit a lock or unlock request
    ///
    /// The request is committed before the verification email goes out; if
    /// sending fails the record stays pending and simply expires.
    pub async fn submit(&self, actor: &Actor, request: LockRequest) -> CoreResult<RegistryLock> {
        if request.registrar_id.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Missing key for registrarId".to_string(),
            ));
        }
        if request.domain_name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Missing key for domainName".to_string(),
            ));
        }

        let registrar = self.registrar_for(actor, &request.registrar_id).await?;
        if !registrar.registry_lock_allowed {
            return Err(CoreError::RegistryLockNotAllowed(
                "Registry lock not allowed for this registrar".to_string(),
            ));
        }
        if !actor.is_admin {
            verify_registry_lock_password(actor, &registrar, request.password.as_deref())?;
        }

        let domain_name = request.domain_name.trim().to_ascii_lowercase();
        let lock = if request.is_lock {
            let poc = (!actor.is_admin).then_some(actor.email.as_str());
            self.domain_lock_service
                .create_registry_lock_request(
                    &domain_name,
                    &request.registrar_id,
                    poc,
                    actor.is_admin,
                )
                .await?
        } else {
            self.domain_lock_service
                .create_registry_unlock_request(
                    &domain_name,
                    &request.registrar_id,
                    actor.is_admin,
                    request.relock_duration,
                )
                .await?
        };

        if let Err(e) = self.send_verification_email(actor, &lock).await {
            log::error!(
                "Failed to send {} verification email for {}: {e}",
                lock.action.verb(),
                lock.domain_name
            );
            return Err(e);
        }
        Ok(lock)
    }

    /// Complete a request from its emailed verification link
    pub async fn verify(
        &self,
        actor: &Actor,
        verification_code: &str,
    ) -> CoreResult<VerificationOutcome> {
        let lock = self
            .domain_lock_service
            .verify_and_apply(verification_code, actor.is_admin)
            .await?;
        log::info!(
            "{} verified {} of {}",
            actor.email,
            lock.action.verb(),
            lock.domain_name
        );
        Ok(VerificationOutcome {
            domain_name: lock.domain_name,
            action: lock.action,
        })
    }

    /// Registry lock page data: whether the caller may lock, and what is locked now
    pub async fn locks_overview(
        &self,
        actor: &Actor,
        registrar_id: &str,
    ) -> CoreResult<LocksOverview> {
        let registrar = self.registrar_for(actor, registrar_id).await?;
        if !actor.is_admin && !registrar.registry_lock_allowed {
            return Err(CoreError::RegistryLockNotAllowed(
                "Registry lock not allowed for this registrar".to_string(),
            ));
        }

        let lock_enabled_for_contact = actor.is_admin
            || registrar
                .find_contact(&actor.email)
                .is_some_and(|c| c.registry_lock_allowed);

        let mut tx = self.ctx.registry_store().begin().await?;
        let records = tx.find_locks_by_registrar(&registrar.registrar_id).await?;

        // Records come oldest first, so the last verified one per domain wins
        let mut latest: BTreeMap<String, RegistryLock> = BTreeMap::new();
        for record in records.into_iter().filter(RegistryLock::is_verified) {
            latest.insert(record.repo_id.clone(), record);
        }
        let mut locks: Vec<LockedDomainView> = latest
            .into_values()
            .filter(|r| r.action == LockAction::Lock)
            .map(|r| LockedDomainView {
                locked_by: if r.is_superuser {
                    "admin".to_string()
                } else {
                    r.registrar_poc_id.clone().unwrap_or_default()
                },
                domain_name: r.domain_name,
                locked_time: r.completion_time,
            })
            .collect();
        locks.sort_by(|a, b| a.domain_name.cmp(&b.domain_name));

        Ok(LocksOverview {
            lock_enabled_for_contact,
            email: actor.email.clone(),
            registrar_id: registrar.registrar_id,
            locks,
        })
    }

    /// Load a registrar the actor may act for
    async fn registrar_for(&self, actor: &Actor, registrar_id: &str) -> CoreResult<Registrar> {
        let registrar = self
            .ctx
            .registrar_repository()
            .find_by_id(registrar_id)
            .await?
            .ok_or_else(|| CoreError::RegistrarNotFound(registrar_id.to_string()))?;
        if !actor.is_admin && registrar.find_contact(&actor.email).is_none() {
            log::warn!(
                "User {} doesn't have access to registrar {registrar_id}",
                actor.email
            );
            return Err(CoreError::RegistrarAccessDenied(format!(
                "{} cannot act for registrar {registrar_id}",
                actor.email
            )));
        }
        Ok(registrar)
    }

    async fn send_verification_email(&self, actor: &Actor, lock: &RegistryLock) -> CoreResult<()> {
        let config = self.ctx.config();
        let action = lock.action.verb();
        let url = config.verification_url(&lock.verification_code);
        let message = EmailMessage {
            from: config.outgoing_email_address.clone(),
            recipients: vec![actor.email.clone()],
            subject: format!("Registry {action} verification"),
            body: format!(
                "Please click the link below to perform the {action} on domain {}. \
                 Note: this code will expire in one hour.\n\n{url}",
                lock.domain_name
            ),
        };
        self.ctx.email_sender().send(&message).await
    }
}

fn verify_registry_lock_password(
    actor: &Actor,
    registrar: &Registrar,
    password: Option<&str>,
) -> CoreResult<()> {
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CoreError::ValidationError("Missing key for password".to_string()))?;
    let contact = registrar
        .find_contact(&actor.email)
        .ok_or_else(|| CoreError::RegistrarAccessDenied(actor.email.clone()))?;
    if !contact.registry_lock_allowed {
        return Err(CoreError::RegistryLockNotAllowed(
            "Registry lock not allowed for this contact".to_string(),
        ));
    }
    if !contact.verify_registry_lock_password(password) {
        return Err(CoreError::IncorrectPassword);
    }
    Ok(())
}
