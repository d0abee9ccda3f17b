//! `DomainRepository` implementation for `SqliteStore`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set,
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, ExprTrait, OnConflict},
};

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::traits::DomainRepository;
use registry_lock_core::types::{Domain, StatusValue};

use super::entity::domain;
use super::{parse_optional_time, parse_time, SqliteStore};

impl domain::Model {
    /// Convert a `SeaORM` row model into a `Domain`.
    pub(super) fn into_domain(self) -> CoreResult<Domain> {
        let statuses: BTreeSet<StatusValue> = serde_json::from_str(&self.statuses)
            .map_err(|e| CoreError::SerializationError(format!("Invalid statuses JSON: {e}")))?;

        Ok(Domain {
            repo_id: self.repo_id,
            domain_name: self.domain_name,
            tld: self.tld,
            current_sponsor_registrar_id: self.current_sponsor_registrar_id,
            statuses,
            deletion_time: parse_optional_time("deletion_time", self.deletion_time.as_deref())?,
            revision: self.revision,
            updated_at: parse_time("updated_at", &self.updated_at)?,
        })
    }
}

pub(super) fn statuses_to_json(statuses: &BTreeSet<StatusValue>) -> CoreResult<String> {
    serde_json::to_string(statuses).map_err(|e| CoreError::SerializationError(e.to_string()))
}

fn domain_to_active_model(domain: &Domain) -> CoreResult<domain::ActiveModel> {
    Ok(domain::ActiveModel {
        repo_id: Set(domain.repo_id.clone()),
        domain_name: Set(domain.domain_name.clone()),
        tld: Set(domain.tld.clone()),
        current_sponsor_registrar_id: Set(domain.current_sponsor_registrar_id.clone()),
        statuses: Set(statuses_to_json(&domain.statuses)?),
        deletion_time: Set(domain.deletion_time.map(|t| t.to_rfc3339())),
        revision: Set(domain.revision),
        updated_at: Set(domain.updated_at.to_rfc3339()),
    })
}

#[async_trait]
impl DomainRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Domain>> {
        let rows = domain::Entity::find()
            .order_by_asc(domain::Column::DomainName)
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query domains: {e}")))?;

        rows.into_iter().map(domain::Model::into_domain).collect()
    }

    async fn find_by_name(&self, domain_name: &str) -> CoreResult<Option<Domain>> {
        let row = domain::Entity::find()
            .filter(domain::Column::DomainName.eq(domain_name))
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query domain: {e}")))?;

        row.map(domain::Model::into_domain).transpose()
    }

    async fn save(&self, domain: &Domain) -> CoreResult<()> {
        let active_model = domain_to_active_model(domain)?;

        // An overwrite bumps the stored revision so open lock transactions notice.
        domain::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(domain::Column::RepoId)
                    .update_columns([
                        domain::Column::DomainName,
                        domain::Column::Tld,
                        domain::Column::CurrentSponsorRegistrarId,
                        domain::Column::Statuses,
                        domain::Column::DeletionTime,
                        domain::Column::UpdatedAt,
                    ])
                    .value(
                        domain::Column::Revision,
                        Expr::col(domain::Column::Revision).add(1),
                    )
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to save domain: {e}")))?;

        Ok(())
    }
}
