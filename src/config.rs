//! Process-level runtime configuration read from the environment.

use std::{env, path::PathBuf};

use tracing::warn;

/// Default directory holding the settings document, the whitelist document,
/// and the optional custom icon.
const DEFAULT_DATA_DIR: &str = "data";
/// Environment variable overriding [`DEFAULT_DATA_DIR`].
const DATA_DIR_ENV: &str = "MAINTENANCE_DATA_DIR";
/// Environment variable selecting the persistence backend.
const STORE_ENV: &str = "MAINTENANCE_STORE";
/// Environment variable carrying the shared bypass capability token.
const BYPASS_TOKEN_ENV: &str = "MAINTENANCE_BYPASS_TOKEN";

/// Which persistence backend to construct at startup. Selection is explicit
/// runtime configuration, not compile-time wiring alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackendConfig {
    /// Flat JSON files inside the data directory.
    File,
    /// Shared MongoDB database (requires the `mongo-store` feature).
    Mongo {
        /// Connection URI.
        uri: String,
        /// Database name override.
        database: Option<String>,
    },
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Local directory for file-backed documents and the icon.
    pub data_dir: PathBuf,
    /// Persistence backend selection.
    pub backend: StoreBackendConfig,
    /// Sessions presenting this token hold the bypass capability. Absent
    /// means no session can bypass gating without a whitelist entry.
    pub bypass_token: Option<String>,
}

impl AppConfig {
    /// Read the configuration from the environment, falling back to the
    /// file backend on unknown selections.
    pub fn from_env() -> Self {
        let data_dir = env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let backend = parse_backend(
            env::var(STORE_ENV).ok().as_deref(),
            env::var("MONGO_URI").ok(),
            env::var("MONGO_DB").ok(),
        );

        let bypass_token = env::var(BYPASS_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty());

        Self {
            data_dir,
            backend,
            bypass_token,
        }
    }
}

fn parse_backend(
    selection: Option<&str>,
    mongo_uri: Option<String>,
    mongo_db: Option<String>,
) -> StoreBackendConfig {
    match selection {
        None | Some("file") => StoreBackendConfig::File,
        Some("mongo") | Some("mongodb") => StoreBackendConfig::Mongo {
            uri: mongo_uri.unwrap_or_else(|| "mongodb://localhost:27017".into()),
            database: mongo_db,
        },
        Some(other) => {
            warn!(backend = other, "unknown store backend; using file backend");
            StoreBackendConfig::File
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_selection_defaults_to_file() {
        assert_eq!(parse_backend(None, None, None), StoreBackendConfig::File);
        assert_eq!(
            parse_backend(Some("file"), None, None),
            StoreBackendConfig::File
        );
        assert_eq!(
            parse_backend(Some("something-else"), None, None),
            StoreBackendConfig::File
        );
    }

    #[test]
    fn mongo_selection_carries_uri_and_database() {
        let backend = parse_backend(
            Some("mongo"),
            Some("mongodb://db:27017".into()),
            Some("gate".into()),
        );
        assert_eq!(
            backend,
            StoreBackendConfig::Mongo {
                uri: "mongodb://db:27017".into(),
                database: Some("gate".into()),
            }
        );
    }
}
