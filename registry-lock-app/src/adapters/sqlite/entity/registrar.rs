//! `SeaORM` entity for the `registrars` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registrars")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub registrar_id: String,
    pub name: String,
    pub registry_lock_allowed: i32,
    /// JSON array of `RegistrarContact`
    pub contacts: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
