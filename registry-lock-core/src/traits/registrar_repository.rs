//! Registrar persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Registrar;

/// Registrar repository Trait
///
/// Platform implementation:
/// - `SqliteStore` (`SeaORM`)
#[async_trait]
pub trait RegistrarRepository: Send + Sync {
    /// Get all registrars
    async fn find_all(&self) -> CoreResult<Vec<Registrar>>;

    /// Get registrar based on ID
    ///
    /// # Arguments
    /// * `registrar_id` - Registrar ID
    async fn find_by_id(&self, registrar_id: &str) -> CoreResult<Option<Registrar>>;

    /// Save registrar (new or update)
    ///
    /// # Arguments
    /// * `registrar` - Registrar data, contacts included
    async fn save(&self, registrar: &Registrar) -> CoreResult<()>;
}
