//! `RegistrarRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, EntityTrait, QueryOrder, sea_query::OnConflict};

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::traits::RegistrarRepository;
use registry_lock_core::types::{Registrar, RegistrarContact};

use super::SqliteStore;
use super::entity::registrar;

impl registrar::Model {
    fn into_registrar(self) -> CoreResult<Registrar> {
        let contacts: Vec<RegistrarContact> = serde_json::from_str(&self.contacts)
            .map_err(|e| CoreError::SerializationError(format!("Invalid contacts JSON: {e}")))?;

        Ok(Registrar {
            registrar_id: self.registrar_id,
            name: self.name,
            registry_lock_allowed: self.registry_lock_allowed != 0,
            contacts,
        })
    }
}

fn registrar_to_active_model(registrar: &Registrar) -> CoreResult<registrar::ActiveModel> {
    let contacts_json = serde_json::to_string(&registrar.contacts)
        .map_err(|e| CoreError::SerializationError(e.to_string()))?;

    Ok(registrar::ActiveModel {
        registrar_id: Set(registrar.registrar_id.clone()),
        name: Set(registrar.name.clone()),
        registry_lock_allowed: Set(i32::from(registrar.registry_lock_allowed)),
        contacts: Set(contacts_json),
    })
}

#[async_trait]
impl RegistrarRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Registrar>> {
        let rows = registrar::Entity::find()
            .order_by_asc(registrar::Column::RegistrarId)
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query registrars: {e}")))?;

        rows.into_iter().map(registrar::Model::into_registrar).collect()
    }

    async fn find_by_id(&self, registrar_id: &str) -> CoreResult<Option<Registrar>> {
        let row = registrar::Entity::find_by_id(registrar_id)
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query registrar: {e}")))?;

        row.map(registrar::Model::into_registrar).transpose()
    }

    async fn save(&self, registrar: &Registrar) -> CoreResult<()> {
        let active_model = registrar_to_active_model(registrar)?;

        registrar::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(registrar::Column::RegistrarId)
                    .update_columns([
                        registrar::Column::Name,
                        registrar::Column::RegistryLockAllowed,
                        registrar::Column::Contacts,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to save registrar: {e}")))?;

        Ok(())
    }
}
