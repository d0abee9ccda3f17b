//! `SeaORM` entity for the `domains` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "domains")]
/// Database row model for a domain.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_id: String,
    #[sea_orm(unique)]
    pub domain_name: String,
    pub tld: String,
    pub current_sponsor_registrar_id: String,
    /// JSON array of EPP status wire names
    pub statuses: String,
    pub deletion_time: Option<String>,
    pub revision: i64,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
