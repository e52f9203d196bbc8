use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::info;

use crate::dao::{
    config_store::ConfigStore,
    models::{SettingsEntity, WhitelistEntries, default_whitelist},
    storage::{StorageError, StorageResult},
};

const SETTINGS_FILE: &str = "settings.json";
const WHITELIST_FILE: &str = "whitelist.json";
/// File name of the custom icon inside the data directory. Shared with the
/// MongoDB backend, which keeps the icon file-provisioned.
pub const ICON_FILE: &str = "maintenance-icon.png";

/// Flat-file backend persisting the settings and whitelist documents as
/// pretty-printed JSON inside a single data directory.
#[derive(Clone)]
pub struct FileConfigStore {
    data_dir: PathBuf,
}

impl FileConfigStore {
    /// Open the store rooted at `data_dir`, creating the directory when absent.
    pub async fn open(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await.map_err(|source| {
            StorageError::unavailable(
                format!("creating data directory `{}`", data_dir.display()),
                source,
            )
        })?;
        Ok(Self { data_dir })
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    fn whitelist_path(&self) -> PathBuf {
        self.data_dir.join(WHITELIST_FILE)
    }

    fn icon_path(&self) -> PathBuf {
        self.data_dir.join(ICON_FILE)
    }

    /// Read and parse a JSON document, bootstrapping `default_value` into the
    /// file when it does not exist yet.
    async fn load_document<T>(path: &Path, default_value: impl FnOnce() -> T) -> StorageResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        match fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                StorageError::corrupt(format!("parsing `{}`", path.display()), source)
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let value = default_value();
                info!(path = %path.display(), "document missing; writing defaults");
                Self::save_document(path, &value).await?;
                Ok(value)
            }
            Err(source) => Err(StorageError::unavailable(
                format!("reading `{}`", path.display()),
                source,
            )),
        }
    }

    /// Serialize first, then replace the file through a temporary sibling so
    /// a failed write never truncates the previous document.
    async fn save_document<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
        let payload = serde_json::to_vec_pretty(value).map_err(|source| {
            StorageError::corrupt(format!("serializing `{}`", path.display()), source)
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &payload).await.map_err(|source| {
            StorageError::unavailable(format!("writing `{}`", tmp_path.display()), source)
        })?;
        fs::rename(&tmp_path, path).await.map_err(|source| {
            StorageError::unavailable(format!("replacing `{}`", path.display()), source)
        })
    }
}

impl ConfigStore for FileConfigStore {
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>> {
        let path = self.settings_path();
        Box::pin(async move { Self::load_document(&path, SettingsEntity::default).await })
    }

    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.settings_path();
        Box::pin(async move { Self::save_document(&path, &settings).await })
    }

    fn load_whitelist(&self) -> BoxFuture<'static, StorageResult<WhitelistEntries>> {
        let path = self.whitelist_path();
        Box::pin(async move { Self::load_document(&path, default_whitelist).await })
    }

    fn save_whitelist(&self, entries: WhitelistEntries) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.whitelist_path();
        Box::pin(async move { Self::save_document(&path, &entries).await })
    }

    fn load_icon(&self) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let path = self.icon_path();
        Box::pin(async move {
            match fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(StorageError::unavailable(
                    format!("reading `{}`", path.display()),
                    source,
                )),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let data_dir = self.data_dir.clone();
        Box::pin(async move {
            fs::metadata(&data_dir).await.map_err(|source| {
                StorageError::unavailable(
                    format!("data directory `{}` unavailable", data_dir.display()),
                    source,
                )
            })?;
            Ok(())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let data_dir = self.data_dir.clone();
        Box::pin(async move {
            fs::create_dir_all(&data_dir).await.map_err(|source| {
                StorageError::unavailable(
                    format!("recreating data directory `{}`", data_dir.display()),
                    source,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::dao::models::PLACEHOLDER_IDENTITY;

    async fn temp_store() -> (FileConfigStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("maintenance-back-{}", Uuid::new_v4()));
        let store = FileConfigStore::open(&dir).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn bootstraps_default_documents() {
        let (store, dir) = temp_store().await;

        let settings = store.load_settings().await.unwrap();
        assert!(!settings.maintenance);
        assert!(dir.join(SETTINGS_FILE).exists());

        let whitelist = store.load_whitelist().await.unwrap();
        assert_eq!(whitelist.len(), 1);
        assert!(whitelist.contains_key(&PLACEHOLDER_IDENTITY));

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn settings_round_trip_preserves_values() {
        let (store, dir) = temp_store().await;

        let mut settings = store.load_settings().await.unwrap();
        settings.maintenance = true;
        settings.ping_messages = vec!["first".into(), "second".into()];
        store.save_settings(settings).await.unwrap();

        let reloaded = store.load_settings().await.unwrap();
        assert!(reloaded.maintenance);
        assert_eq!(reloaded.ping_messages, vec!["first", "second"]);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_settings_surface_as_corrupt_error() {
        let (store, dir) = temp_store().await;

        tokio::fs::write(dir.join(SETTINGS_FILE), b"{ not json")
            .await
            .unwrap();

        match store.load_settings().await {
            Err(StorageError::Corrupt { .. }) => {}
            other => panic!("expected corrupt error, got {other:?}"),
        }

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_icon_is_not_an_error() {
        let (store, dir) = temp_store().await;
        assert!(store.load_icon().await.unwrap().is_none());

        tokio::fs::write(dir.join(ICON_FILE), b"\x89PNG").await.unwrap();
        assert_eq!(store.load_icon().await.unwrap().unwrap(), b"\x89PNG");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
