//! `SeaORM` entity for the `email_outbox` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "email_outbox")]
/// Database row model for a queued outgoing email.
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub from_address: String,
    /// JSON array of recipient addresses
    pub recipients: String,
    pub subject: String,
    pub body: String,
    pub queued_at: String,
    pub sent_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
