#[cfg(feature = "mongo-store")]
pub mod mongodb;

pub mod file;

use futures::future::BoxFuture;

use crate::dao::models::{SettingsEntity, WhitelistEntries};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for the settings document, the
/// whitelist document, and the optional custom icon.
///
/// Loading a missing document bootstraps and persists the default one, so
/// `load_*` only fails when the medium is unreachable or the stored document
/// is corrupt.
pub trait ConfigStore: Send + Sync {
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>>;
    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn load_whitelist(&self) -> BoxFuture<'static, StorageResult<WhitelistEntries>>;
    fn save_whitelist(&self, entries: WhitelistEntries) -> BoxFuture<'static, StorageResult<()>>;
    /// Raw bytes of the custom service icon, when one has been provisioned.
    fn load_icon(&self) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
