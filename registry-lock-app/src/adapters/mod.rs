//! Platform-agnostic adapters for the CLI and worker frontends.

mod log_email_sender;

pub use log_email_sender::LogEmailSender;

#[cfg(feature = "sqlite-store")]
mod sqlite;

#[cfg(feature = "sqlite-store")]
pub use sqlite::{OutboxEmail, SqliteStore};
