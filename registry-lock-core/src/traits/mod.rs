//! Storage layer abstraction trait definition

mod clock;
mod domain_repository;
mod email_sender;
mod registrar_repository;
mod registry_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain_repository::{AuditRepository, DomainRepository};
pub use email_sender::EmailSender;
pub use registrar_repository::RegistrarRepository;
pub use registry_store::{LockTransaction, RegistryStore};
