//! Durable email outbox: `EmailSender` implementation for `SqliteStore`.
//!
//! Messages are queued in `email_outbox`; an external mailer drains the
//! unsent rows and marks them delivered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};
use serde::Serialize;

use registry_lock_core::error::{CoreError, CoreResult};
use registry_lock_core::traits::EmailSender;
use registry_lock_core::types::EmailMessage;

use super::entity::email_outbox;
use super::{parse_optional_time, parse_time, SqliteStore};

/// A queued outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEmail {
    pub id: i64,
    pub message: EmailMessage,
    pub queued_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl email_outbox::Model {
    fn into_outbox_email(self) -> CoreResult<OutboxEmail> {
        let recipients: Vec<String> = serde_json::from_str(&self.recipients)
            .map_err(|e| CoreError::SerializationError(format!("Invalid recipients JSON: {e}")))?;

        Ok(OutboxEmail {
            id: self.id,
            queued_at: parse_time("queued_at", &self.queued_at)?,
            sent_at: parse_optional_time("sent_at", self.sent_at.as_deref())?,
            message: EmailMessage {
                from: self.from_address,
                recipients,
                subject: self.subject,
                body: self.body,
            },
        })
    }
}

impl SqliteStore {
    /// Unsent emails, oldest first.
    pub async fn pending_emails(&self) -> CoreResult<Vec<OutboxEmail>> {
        let rows = email_outbox::Entity::find()
            .filter(email_outbox::Column::SentAt.is_null())
            .order_by_asc(email_outbox::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query outbox: {e}")))?;

        rows.into_iter()
            .map(email_outbox::Model::into_outbox_email)
            .collect()
    }

    /// Mark queued emails as delivered. Returns how many rows changed.
    pub async fn mark_emails_sent(&self, ids: &[i64], sent_at: DateTime<Utc>) -> CoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = email_outbox::Entity::update_many()
            .col_expr(email_outbox::Column::SentAt, Expr::value(sent_at.to_rfc3339()))
            .filter(email_outbox::Column::Id.is_in(ids.iter().copied()))
            .filter(email_outbox::Column::SentAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to update outbox: {e}")))?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl EmailSender for SqliteStore {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()> {
        let recipients = serde_json::to_string(&message.recipients)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;

        let active_model = email_outbox::ActiveModel {
            id: NotSet,
            from_address: Set(message.from.clone()),
            recipients: Set(recipients),
            subject: Set(message.subject.clone()),
            body: Set(message.body.clone()),
            queued_at: Set(Utc::now().to_rfc3339()),
            sent_at: Set(None),
        };

        email_outbox::Entity::insert(active_model)
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::EmailError(format!("Failed to queue email: {e}")))?;

        log::info!(
            "Queued email '{}' for {}",
            message.subject,
            message.recipients.join(", ")
        );
        Ok(())
    }
}
