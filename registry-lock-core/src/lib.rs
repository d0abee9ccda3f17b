//! Registry Lock Core Library
//!
//! Provides the core business logic of domain registry lock, including:
//! - Two-phase lock / unlock requests with email verification
//! - Administrative lock application
//! - Automatic re-lock after a temporary unlock
//!
//! This library is platform-independent: storage, email and time are abstracted
//! through traits and injected by the application layer.

pub mod crypto;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{
    AuditRepository, Clock, DomainRepository, EmailSender, LockTransaction, RegistrarRepository,
    RegistryStore,
};
