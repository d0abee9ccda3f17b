//! `AuditRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::traits::AuditRepository;
use registry_lock_core::types::{BillingEvent, HistoryEntry, Money};

use super::entity::{billing_event, history_entry};
use super::{enum_name, parse_enum, parse_time, SqliteStore};

impl history_entry::Model {
    fn into_history_entry(self) -> CoreResult<HistoryEntry> {
        Ok(HistoryEntry {
            modification_time: parse_time("modification_time", &self.modification_time)?,
            history_type: parse_enum("history_type", self.history_type)?,
            id: self.id,
            repo_id: self.repo_id,
            domain_name: self.domain_name,
            registrar_id: self.registrar_id,
            by_superuser: self.by_superuser != 0,
            requested_by_registrar: self.requested_by_registrar != 0,
            reason: self.reason,
        })
    }
}

impl billing_event::Model {
    fn into_billing_event(self) -> CoreResult<BillingEvent> {
        let cost: Money = self.cost.parse()?;

        Ok(BillingEvent {
            reason: parse_enum("reason", self.reason)?,
            event_time: parse_time("event_time", &self.event_time)?,
            billing_time: parse_time("billing_time", &self.billing_time)?,
            id: self.id,
            target_id: self.target_id,
            registrar_id: self.registrar_id,
            cost,
            history_id: self.history_id,
        })
    }
}

pub(super) fn history_to_active_model(entry: &HistoryEntry) -> CoreResult<history_entry::ActiveModel> {
    Ok(history_entry::ActiveModel {
        id: Set(entry.id.clone()),
        repo_id: Set(entry.repo_id.clone()),
        domain_name: Set(entry.domain_name.clone()),
        registrar_id: Set(entry.registrar_id.clone()),
        history_type: Set(enum_name(&entry.history_type)?),
        by_superuser: Set(i32::from(entry.by_superuser)),
        requested_by_registrar: Set(i32::from(entry.requested_by_registrar)),
        reason: Set(entry.reason.clone()),
        modification_time: Set(entry.modification_time.to_rfc3339()),
    })
}

pub(super) fn billing_to_active_model(event: &BillingEvent) -> CoreResult<billing_event::ActiveModel> {
    Ok(billing_event::ActiveModel {
        id: Set(event.id.clone()),
        reason: Set(enum_name(&event.reason)?),
        target_id: Set(event.target_id.clone()),
        registrar_id: Set(event.registrar_id.clone()),
        cost: Set(event.cost.to_string()),
        event_time: Set(event.event_time.to_rfc3339()),
        billing_time: Set(event.billing_time.to_rfc3339()),
        history_id: Set(event.history_id.clone()),
    })
}

#[async_trait]
impl AuditRepository for SqliteStore {
    async fn find_history_by_repo_id(&self, repo_id: &str) -> CoreResult<Vec<HistoryEntry>> {
        let rows = history_entry::Entity::find()
            .filter(history_entry::Column::RepoId.eq(repo_id))
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query history: {e}")))?;

        let mut entries = rows
            .into_iter()
            .map(history_entry::Model::into_history_entry)
            .collect::<CoreResult<Vec<_>>>()?;
        // RFC 3339 text does not sort lexically once fractional seconds vary
        entries.sort_by_key(|e| e.modification_time);
        Ok(entries)
    }

    async fn find_billing_events_by_target(
        &self,
        target_id: &str,
    ) -> CoreResult<Vec<BillingEvent>> {
        let rows = billing_event::Entity::find()
            .filter(billing_event::Column::TargetId.eq(target_id))
            .all(&self.db)
            .await
            .map_err(|e| {
                CoreError::StorageError(format!("Failed to query billing events: {e}"))
            })?;

        let mut events = rows
            .into_iter()
            .map(billing_event::Model::into_billing_event)
            .collect::<CoreResult<Vec<_>>>()?;
        events.sort_by_key(|e| e.event_time);
        Ok(events)
    }
}
