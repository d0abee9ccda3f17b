//! `RegistryStore` implementation for `SqliteStore`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
    sea_query::Expr,
};
use tokio::sync::OwnedMutexGuard;

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::traits::{LockTransaction, RegistryStore};
use registry_lock_core::types::{BillingEvent, Domain, HistoryEntry, RegistryLock};

use super::audit_repo::{billing_to_active_model, history_to_active_model};
use super::domain_repo::statuses_to_json;
use super::entity::{billing_event, domain, history_entry, registry_lock};
use super::{enum_name, parse_enum, parse_optional_time, parse_time, SqliteStore};

impl registry_lock::Model {
    /// Convert a `SeaORM` row model into a `RegistryLock`.
    fn into_registry_lock(self) -> CoreResult<RegistryLock> {
        let relock_duration = self
            .relock_duration_ms
            .map(|ms| {
                u64::try_from(ms).map(Duration::from_millis).map_err(|e| {
                    CoreError::SerializationError(format!("Invalid relock_duration_ms: {e}"))
                })
            })
            .transpose()?;

        Ok(RegistryLock {
            revision_id: Some(self.revision_id),
            action: parse_enum("action", self.action)?,
            creation_time: parse_time("creation_time", &self.creation_time)?,
            completion_time: parse_optional_time(
                "completion_time",
                self.completion_time.as_deref(),
            )?,
            relock_processed_time: parse_optional_time(
                "relock_processed_time",
                self.relock_processed_time.as_deref(),
            )?,
            repo_id: self.repo_id,
            domain_name: self.domain_name,
            registrar_id: self.registrar_id,
            registrar_poc_id: self.registrar_poc_id,
            is_superuser: self.is_superuser != 0,
            verification_code: self.verification_code,
            relock_duration,
            relock_revision_id: self.relock_revision_id,
        })
    }
}

fn lock_to_active_model(lock: &RegistryLock) -> CoreResult<registry_lock::ActiveModel> {
    let relock_duration_ms = lock
        .relock_duration
        .map(|d| {
            i64::try_from(d.as_millis()).map_err(|e| {
                CoreError::SerializationError(format!("Relock duration out of range: {e}"))
            })
        })
        .transpose()?;

    Ok(registry_lock::ActiveModel {
        revision_id: lock.revision_id.map_or(NotSet, Set),
        repo_id: Set(lock.repo_id.clone()),
        domain_name: Set(lock.domain_name.clone()),
        registrar_id: Set(lock.registrar_id.clone()),
        registrar_poc_id: Set(lock.registrar_poc_id.clone()),
        action: Set(enum_name(&lock.action)?),
        is_superuser: Set(i32::from(lock.is_superuser)),
        verification_code: Set(lock.verification_code.clone()),
        creation_time: Set(lock.creation_time.to_rfc3339()),
        completion_time: Set(lock.completion_time.map(|t| t.to_rfc3339())),
        relock_duration_ms: Set(relock_duration_ms),
        relock_revision_id: Set(lock.relock_revision_id),
        relock_processed_time: Set(lock.relock_processed_time.map(|t| t.to_rfc3339())),
    })
}

/// One unit of work over a `SeaORM` transaction.
///
/// Dropping it rolls back, then releases the store's write lock.
/// Map a database error. A busy or locked database file means another process
/// holds the write lock, which is reported as a retryable conflict.
fn db_error(context: &str, e: &DbErr) -> CoreError {
    let message = e.to_string();
    if message.contains("database is locked") || message.contains("database table is locked") {
        CoreError::ConcurrentModification(format!("{context}: {message}"))
    } else {
        CoreError::StorageError(format!("{context}: {message}"))
    }
}

pub(crate) struct SqliteLockTransaction {
    txn: DatabaseTransaction,
    _write_guard: OwnedMutexGuard<()>,
}

impl SqliteLockTransaction {
    async fn one_lock(
        &self,
        query: sea_orm::Select<registry_lock::Entity>,
    ) -> CoreResult<Option<RegistryLock>> {
        query
            .one(&self.txn)
            .await
            .map_err(|e| db_error("Failed to query registry lock", &e))?
            .map(registry_lock::Model::into_registry_lock)
            .transpose()
    }

    async fn all_locks(
        &self,
        query: sea_orm::Select<registry_lock::Entity>,
    ) -> CoreResult<Vec<RegistryLock>> {
        query
            .order_by_asc(registry_lock::Column::RevisionId)
            .all(&self.txn)
            .await
            .map_err(|e| db_error("Failed to query registry locks", &e))?
            .into_iter()
            .map(registry_lock::Model::into_registry_lock)
            .collect()
    }
}

#[async_trait]
impl RegistryStore for SqliteStore {
    async fn begin(&self) -> CoreResult<Box<dyn LockTransaction>> {
        let write_guard = Arc::clone(&self.write_lock).lock_owned().await;
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", &e))?;

        Ok(Box::new(SqliteLockTransaction {
            txn,
            _write_guard: write_guard,
        }))
    }
}

#[async_trait]
impl LockTransaction for SqliteLockTransaction {
    async fn load_domain(&mut self, domain_name: &str) -> CoreResult<Option<Domain>> {
        domain::Entity::find()
            .filter(domain::Column::DomainName.eq(domain_name))
            .one(&self.txn)
            .await
            .map_err(|e| db_error("Failed to query domain", &e))?
            .map(domain::Model::into_domain)
            .transpose()
    }

    async fn load_domain_by_repo_id(&mut self, repo_id: &str) -> CoreResult<Option<Domain>> {
        domain::Entity::find_by_id(repo_id)
            .one(&self.txn)
            .await
            .map_err(|e| db_error("Failed to query domain", &e))?
            .map(domain::Model::into_domain)
            .transpose()
    }

    async fn update_domain(&mut self, domain: &Domain) -> CoreResult<Domain> {
        let next_revision = domain.revision + 1;

        let result = domain::Entity::update_many()
            .col_expr(
                domain::Column::CurrentSponsorRegistrarId,
                Expr::value(domain.current_sponsor_registrar_id.clone()),
            )
            .col_expr(
                domain::Column::Statuses,
                Expr::value(statuses_to_json(&domain.statuses)?),
            )
            .col_expr(
                domain::Column::DeletionTime,
                Expr::value(domain.deletion_time.map(|t| t.to_rfc3339())),
            )
            .col_expr(domain::Column::Revision, Expr::value(next_revision))
            .col_expr(
                domain::Column::UpdatedAt,
                Expr::value(domain.updated_at.to_rfc3339()),
            )
            .filter(domain::Column::RepoId.eq(&domain.repo_id))
            .filter(domain::Column::Revision.eq(domain.revision))
            .exec(&self.txn)
            .await
            .map_err(|e| db_error("Failed to update domain", &e))?;

        if result.rows_affected == 0 {
            return Err(CoreError::ConcurrentModification(format!(
                "domain {} changed since revision {}",
                domain.domain_name, domain.revision
            )));
        }

        let mut updated = domain.clone();
        updated.revision = next_revision;
        Ok(updated)
    }

    async fn find_lock_by_verification_code(
        &mut self,
        verification_code: &str,
    ) -> CoreResult<Option<RegistryLock>> {
        self.one_lock(
            registry_lock::Entity::find()
                .filter(registry_lock::Column::VerificationCode.eq(verification_code)),
        )
        .await
    }

    async fn find_lock_by_revision_id(
        &mut self,
        revision_id: i64,
    ) -> CoreResult<Option<RegistryLock>> {
        self.one_lock(registry_lock::Entity::find_by_id(revision_id))
            .await
    }

    async fn find_most_recent_lock(&mut self, repo_id: &str) -> CoreResult<Option<RegistryLock>> {
        self.one_lock(
            registry_lock::Entity::find()
                .filter(registry_lock::Column::RepoId.eq(repo_id))
                .order_by_desc(registry_lock::Column::RevisionId),
        )
        .await
    }

    async fn find_most_recent_verified_lock(
        &mut self,
        repo_id: &str,
    ) -> CoreResult<Option<RegistryLock>> {
        self.one_lock(
            registry_lock::Entity::find()
                .filter(registry_lock::Column::RepoId.eq(repo_id))
                .filter(registry_lock::Column::CompletionTime.is_not_null())
                .order_by_desc(registry_lock::Column::RevisionId),
        )
        .await
    }

    async fn find_locks_by_registrar(
        &mut self,
        registrar_id: &str,
    ) -> CoreResult<Vec<RegistryLock>> {
        self.all_locks(
            registry_lock::Entity::find()
                .filter(registry_lock::Column::RegistrarId.eq(registrar_id)),
        )
        .await
    }

    async fn find_relock_candidates(&mut self) -> CoreResult<Vec<RegistryLock>> {
        self.all_locks(
            registry_lock::Entity::find()
                .filter(registry_lock::Column::CompletionTime.is_not_null())
                .filter(registry_lock::Column::RelockDurationMs.is_not_null())
                .filter(registry_lock::Column::RelockProcessedTime.is_null()),
        )
        .await
    }

    async fn save_lock(&mut self, lock: &RegistryLock) -> CoreResult<RegistryLock> {
        let active_model = lock_to_active_model(lock)?;

        let model = if lock.revision_id.is_some() {
            active_model
                .update(&self.txn)
                .await
                .map_err(|e| db_error("Failed to update registry lock", &e))?
        } else {
            active_model
                .insert(&self.txn)
                .await
                .map_err(|e| db_error("Failed to insert registry lock", &e))?
        };

        model.into_registry_lock()
    }

    async fn insert_history(&mut self, entry: &HistoryEntry) -> CoreResult<()> {
        history_entry::Entity::insert(history_to_active_model(entry)?)
            .exec(&self.txn)
            .await
            .map_err(|e| db_error("Failed to insert history entry", &e))?;
        Ok(())
    }

    async fn insert_billing_event(&mut self, event: &BillingEvent) -> CoreResult<()> {
        billing_event::Entity::insert(billing_to_active_model(event)?)
            .exec(&self.txn)
            .await
            .map_err(|e| db_error("Failed to insert billing event", &e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let Self { txn, _write_guard } = *self;
        txn.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_database_is_a_retryable_conflict() {
        let err = db_error(
            "Failed to update domain",
            &DbErr::Custom("error returned from database: (code: 5) database is locked".into()),
        );
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Failed to update domain"));
    }

    #[test]
    fn other_database_errors_stay_storage_errors() {
        let err = db_error(
            "Failed to insert registry lock",
            &DbErr::Custom("UNIQUE constraint failed: registry_locks.verification_code".into()),
        );
        assert!(matches!(err, CoreError::StorageError(_)));
        assert!(!err.is_retryable());
    }
}
