//! Outgoing email abstraction

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::EmailMessage;

/// Email sender Trait
///
/// Platform implementation:
/// - `LogEmailSender` (log only)
/// - `SqliteStore` (durable outbox)
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hand a message off for delivery
    async fn send(&self, message: &EmailMessage) -> CoreResult<()>;
}
