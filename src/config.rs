//! Application-level configuration loading: storage backend selection and scoring defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CARDSCORE_CONFIG_PATH";
/// Environment variable selecting the storage backend (`memory` or `mongo`).
const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
const MONGO_URI_ENV: &str = "MONGO_URI";
const MONGO_DB_ENV: &str = "MONGO_DB";

const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_MONGO_DB: &str = "cardscore";
/// Target applied to rum and gin games created without one.
const DEFAULT_TARGET_SCORE: i64 = 500;
/// Number of games returned by the recent games listing.
const DEFAULT_RECENT_GAMES_LIMIT: usize = 50;

/// Persistence backend used by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local tables; data is lost on restart.
    Memory,
    /// MongoDB replica set (transactions are required).
    Mongo,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(StorageBackend::Memory),
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Selected persistence backend.
    pub storage: StorageBackend,
    /// Connection string for the MongoDB backend.
    pub mongo_uri: String,
    /// Database name for the MongoDB backend.
    pub mongo_db: String,
    /// Target score given to rum and gin games created without one.
    pub default_target_score: i64,
    /// Maximum number of games returned by the recent games listing.
    pub recent_games_limit: usize,
}

impl AppConfig {
    /// Load the configuration from disk, then apply environment overrides.
    ///
    /// A missing or unreadable file falls back to the built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        storage = ?app_config.storage,
                        "loaded configuration file"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = env::var(STORAGE_BACKEND_ENV) {
            match StorageBackend::parse(&value) {
                Some(backend) => self.storage = backend,
                None => warn!(value = %value, "ignoring unknown storage backend"),
            }
        }
        if let Ok(uri) = env::var(MONGO_URI_ENV) {
            self.mongo_uri = uri;
        }
        if let Ok(db) = env::var(MONGO_DB_ENV) {
            self.mongo_db = db;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            mongo_uri: DEFAULT_MONGO_URI.to_owned(),
            mongo_db: DEFAULT_MONGO_DB.to_owned(),
            default_target_score: DEFAULT_TARGET_SCORE,
            recent_games_limit: DEFAULT_RECENT_GAMES_LIMIT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    storage: Option<StorageBackend>,
    mongo: Option<RawMongo>,
    default_target_score: Option<i64>,
    recent_games_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMongo {
    uri: Option<String>,
    database: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let mongo = value.mongo.unwrap_or_default();
        Self {
            storage: value.storage.unwrap_or(defaults.storage),
            mongo_uri: mongo.uri.unwrap_or(defaults.mongo_uri),
            mongo_db: mongo.database.unwrap_or(defaults.mongo_db),
            default_target_score: value
                .default_target_score
                .filter(|target| *target > 0)
                .unwrap_or(defaults.default_target_score),
            recent_games_limit: value
                .recent_games_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.recent_games_limit),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
