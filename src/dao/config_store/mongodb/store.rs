use std::{path::PathBuf, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, bson::doc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{
    config_store::ConfigStore,
    models::{SettingsEntity, WhitelistEntries},
    storage::StorageResult,
};

const SETTINGS_COLLECTION: &str = "settings";
const WHITELIST_COLLECTION: &str = "whitelist";
const SETTINGS_DOC_ID: &str = "settings";

/// Remote settings/whitelist backend shared by several service processes.
/// The custom icon stays file-provisioned next to the process even when the
/// documents live in MongoDB, so `icon_path` points into the local data
/// directory.
#[derive(Clone)]
pub struct MongoConfigStore {
    inner: Arc<MongoInner>,
    icon_path: PathBuf,
}

struct MongoInner {
    // A Database handle keeps its client topology alive, so holding the
    // database alone is enough.
    database: RwLock<Database>,
    config: MongoConfig,
}

/// Settings wrapped with a fixed `_id` so the collection holds exactly one
/// document that `replace_one` upserts in place.
#[derive(Serialize, Deserialize)]
struct MongoSettingsDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    entity: SettingsEntity,
}

/// One whitelist row per identity; `_id` carries the string form of the id.
#[derive(Serialize, Deserialize)]
struct MongoWhitelistRow {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoConfigStore {
    /// Establish a connection and seed the settings document on first run.
    pub async fn connect(config: MongoConfig, icon_path: PathBuf) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
            icon_path,
        };
        store.bootstrap_settings().await?;
        Ok(store)
    }

    async fn database(&self) -> Database {
        self.inner.database.read().await.clone()
    }

    async fn settings_collection(&self) -> Collection<MongoSettingsDocument> {
        self.database()
            .await
            .collection::<MongoSettingsDocument>(SETTINGS_COLLECTION)
    }

    async fn whitelist_collection(&self) -> Collection<MongoWhitelistRow> {
        self.database()
            .await
            .collection::<MongoWhitelistRow>(WHITELIST_COLLECTION)
    }

    async fn bootstrap_settings(&self) -> MongoResult<()> {
        let collection = self.settings_collection().await;
        let existing = collection
            .find_one(doc! { "_id": SETTINGS_DOC_ID })
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: SETTINGS_COLLECTION,
                source,
            })?;

        if existing.is_none() {
            self.replace_settings(SettingsEntity::default()).await?;
        }
        Ok(())
    }

    async fn fetch_settings(&self) -> MongoResult<SettingsEntity> {
        let collection = self.settings_collection().await;
        let document = collection
            .find_one(doc! { "_id": SETTINGS_DOC_ID })
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: SETTINGS_COLLECTION,
                source,
            })?;

        match document {
            Some(doc) => Ok(doc.entity),
            None => {
                let entity = SettingsEntity::default();
                self.replace_settings(entity.clone()).await?;
                Ok(entity)
            }
        }
    }

    async fn replace_settings(&self, entity: SettingsEntity) -> MongoResult<()> {
        let collection = self.settings_collection().await;
        let document = MongoSettingsDocument {
            id: SETTINGS_DOC_ID.to_owned(),
            entity,
        };
        collection
            .replace_one(doc! { "_id": SETTINGS_DOC_ID }, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: SETTINGS_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn fetch_whitelist(&self) -> MongoResult<WhitelistEntries> {
        let collection = self.whitelist_collection().await;
        let rows: Vec<MongoWhitelistRow> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: WHITELIST_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: WHITELIST_COLLECTION,
                source,
            })?;

        let mut entries = WhitelistEntries::with_capacity(rows.len());
        for row in rows {
            let id = Uuid::parse_str(&row.id).map_err(|source| {
                MongoDaoError::MalformedIdentity {
                    id: row.id.clone(),
                    source,
                }
            })?;
            entries.insert(id, row.name);
        }
        Ok(entries)
    }

    /// The whitelist is small, so a full rewrite (delete + insert) keeps the
    /// collection exactly in sync with the in-memory mapping.
    async fn replace_whitelist(&self, entries: WhitelistEntries) -> MongoResult<()> {
        let collection = self.whitelist_collection().await;
        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: WHITELIST_COLLECTION,
                source,
            })?;

        if entries.is_empty() {
            return Ok(());
        }

        let rows: Vec<MongoWhitelistRow> = entries
            .into_iter()
            .map(|(id, name)| MongoWhitelistRow {
                id: id.to_string(),
                name,
            })
            .collect();
        collection
            .insert_many(rows)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: WHITELIST_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn read_icon(&self) -> MongoResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.icon_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(MongoDaoError::IconRead {
                path: self.icon_path.display().to_string(),
                source,
            }),
        }
    }
}

impl ConfigStore for MongoConfigStore {
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>> {
        let store = self.clone();
        Box::pin(async move { store.fetch_settings().await.map_err(Into::into) })
    }

    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_settings(settings).await.map_err(Into::into) })
    }

    fn load_whitelist(&self) -> BoxFuture<'static, StorageResult<WhitelistEntries>> {
        let store = self.clone();
        Box::pin(async move { store.fetch_whitelist().await.map_err(Into::into) })
    }

    fn save_whitelist(&self, entries: WhitelistEntries) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_whitelist(entries).await.map_err(Into::into) })
    }

    fn load_icon(&self) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let store = self.clone();
        Box::pin(async move { store.read_icon().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
