//! `SeaORM` entity for the `billing_events` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "billing_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub reason: String,
    pub target_id: String,
    pub registrar_id: String,
    /// `Money` display form, e.g. `USD 20.00`
    pub cost: String,
    pub event_time: String,
    pub billing_time: String,
    pub history_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
