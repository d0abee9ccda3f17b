//! `SeaORM` entity for the `history_entries` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "history_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub repo_id: String,
    pub domain_name: String,
    pub registrar_id: String,
    pub history_type: String,
    pub by_superuser: i32,
    pub requested_by_registrar: i32,
    pub reason: String,
    pub modification_time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
