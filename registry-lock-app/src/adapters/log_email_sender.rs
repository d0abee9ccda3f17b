//! `EmailSender` that only writes messages to the log.

use async_trait::async_trait;

use registry_lock_core::error::CoreResult;
use registry_lock_core::traits::EmailSender;
use registry_lock_core::types::EmailMessage;

/// Development email backend: every message is logged at `info` and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmailSender;

impl LogEmailSender {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()> {
        log::info!(
            "Email from {} to [{}]: {}\n{}",
            message.from,
            message.recipients.join(", "),
            message.subject,
            message.body
        );
        Ok(())
    }
}
