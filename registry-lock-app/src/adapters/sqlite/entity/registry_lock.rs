//! `SeaORM` entity for the `registry_locks` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registry_locks")]
/// Database row model for one lock / unlock record.
pub struct Model {
    #[sea_orm(primary_key)]
    pub revision_id: i64,
    pub repo_id: String,
    pub domain_name: String,
    pub registrar_id: String,
    pub registrar_poc_id: Option<String>,
    /// `LOCK` or `UNLOCK`
    pub action: String,
    pub is_superuser: i32,
    #[sea_orm(unique)]
    pub verification_code: String,
    pub creation_time: String,
    pub completion_time: Option<String>,
    pub relock_duration_ms: Option<i64>,
    pub relock_revision_id: Option<i64>,
    pub relock_processed_time: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
