use media_shelf_models::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub collections: CollectionNames,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBackend {
    /// Process-local, lost on exit. Useful for dry runs.
    Memory,
    /// JSON files under the data directory.
    File,
    /// Cloud Firestore over REST.
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_backend")]
    pub backend: GatewayBackend,
    /// Overrides `<data_dir>/collections` for the file backend
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub firestore: Option<FirestoreConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionNames {
    #[serde(default = "default_favorites_collection")]
    pub favorites: String,
    #[serde(default = "default_recently_watched_collection")]
    pub recently_watched: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// `key` matches items on (kind, id); `structural` requires every field to match
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    pub file: Option<PathBuf>,
}

fn default_backend() -> GatewayBackend {
    GatewayBackend::File
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_auth_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_favorites_collection() -> String {
    "favorites".to_string()
}

fn default_recently_watched_collection() -> String {
    "recently_watched".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: None,
            firestore: None,
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            favorites: default_favorites_collection(),
            recently_watched: default_recently_watched_collection(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Missing file means defaults; a file that exists but does not parse is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.collections.favorites.trim().is_empty() || self.collections.recently_watched.trim().is_empty() {
            return Err(anyhow::anyhow!("collection names cannot be empty"));
        }
        if self.collections.favorites == self.collections.recently_watched {
            return Err(anyhow::anyhow!(
                "favorites and recently_watched must use different collections (both are '{}')",
                self.collections.favorites
            ));
        }
        for name in [&self.collections.favorites, &self.collections.recently_watched] {
            if name.contains('/') {
                return Err(anyhow::anyhow!("collection name '{}' cannot contain '/'", name));
            }
        }

        if self.gateway.backend == GatewayBackend::Firestore {
            let firestore = self
                .gateway
                .firestore
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("gateway.backend = \"firestore\" requires a [gateway.firestore] section"))?;
            if firestore.project_id.trim().is_empty() {
                return Err(anyhow::anyhow!("gateway.firestore.project_id cannot be empty"));
            }
            if firestore.api_key.trim().is_empty() {
                return Err(anyhow::anyhow!("gateway.firestore.api_key cannot be empty"));
            }
            if firestore.timeout_secs == 0 {
                return Err(anyhow::anyhow!("gateway.firestore.timeout_secs must be positive"));
            }
        }

        Ok(())
    }
}
