//! `SeaORM` entities backing `SqliteStore`.

pub mod billing_event;
pub mod domain;
pub mod email_outbox;
pub mod history_entry;
pub mod registrar;
pub mod registry_lock;
