use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TRAKT_API_KEY is required")]
    MissingCatalogKey,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Application configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawAppConfig")]
pub struct AppConfig {
    pub server: ServerConfig,
    pub trakt: TraktConfig,
    pub tmdb: TmdbConfig,
    pub search: FlowConfig,
    pub related: FlowConfig,
    pub enhancement: EnhancementConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Catalog/ratings provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraktConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub detail_timeout_secs: u64,
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.trakt.tv".to_string(),
            timeout_secs: 5,
            detail_timeout_secs: 10,
        }
    }
}

impl TraktConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }
}

/// Image/metadata provider. Optional: without a key, posters are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base: String,
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base: "https://image.tmdb.org/t/p/w500".to_string(),
            timeout_secs: 5,
        }
    }
}

impl TmdbConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Limits and timing for one batch flow (search or related).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    pub full_limit: usize,
    pub fast_limit: usize,
    pub workers: usize,
    pub call_timeout_ms: u64,
    pub entry_timeout_ms: u64,
}

impl FlowConfig {
    pub fn search() -> Self {
        Self {
            full_limit: 10,
            fast_limit: 15,
            workers: 5,
            call_timeout_ms: 3000,
            entry_timeout_ms: 5000,
        }
    }

    pub fn related() -> Self {
        Self {
            full_limit: 8,
            fast_limit: 12,
            workers: 4,
            call_timeout_ms: 2000,
            entry_timeout_ms: 3000,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn entry_timeout(&self) -> Duration {
        Duration::from_millis(self.entry_timeout_ms)
    }

    fn merged(mut self, overrides: FlowOverrides) -> Self {
        if let Some(v) = overrides.full_limit {
            self.full_limit = v;
        }
        if let Some(v) = overrides.fast_limit {
            self.fast_limit = v;
        }
        if let Some(v) = overrides.workers {
            self.workers = v;
        }
        if let Some(v) = overrides.call_timeout_ms {
            self.call_timeout_ms = v;
        }
        if let Some(v) = overrides.entry_timeout_ms {
            self.entry_timeout_ms = v;
        }
        self
    }

    fn validate(&self, section: &'static str) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                key: section,
                reason: "workers must be at least 1".to_string(),
            });
        }
        if self.full_limit == 0 || self.fast_limit == 0 {
            return Err(ConfigError::Invalid {
                key: section,
                reason: "limits must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// `[search]` and `[related]` share a shape but not defaults, so the file
/// only carries overrides that are merged onto the flow's own defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlowOverrides {
    full_limit: Option<usize>,
    fast_limit: Option<usize>,
    workers: Option<usize>,
    call_timeout_ms: Option<u64>,
    entry_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Upper bound on entries being enhanced at once across all requests.
    pub max_in_flight: usize,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self { max_in_flight: 64 }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAppConfig {
    server: ServerConfig,
    trakt: TraktConfig,
    tmdb: TmdbConfig,
    search: FlowOverrides,
    related: FlowOverrides,
    enhancement: EnhancementConfig,
}

impl From<RawAppConfig> for AppConfig {
    fn from(raw: RawAppConfig) -> Self {
        Self {
            server: raw.server,
            trakt: raw.trakt,
            tmdb: raw.tmdb,
            search: FlowConfig::search().merged(raw.search),
            related: FlowConfig::related().merged(raw.related),
            enhancement: raw.enhancement,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawAppConfig::default().into()
    }
}

impl AppConfig {
    /// Load from the file named by `MOVIE_API_CONFIG` (default `config.toml`),
    /// then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MOVIE_API_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(key) = get("TRAKT_API_KEY") {
            self.trakt.api_key = Some(key);
        }
        if let Some(key) = get("TMDB_API_KEY") {
            self.tmdb.api_key = Some(key);
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if !self.tmdb.is_configured() {
            self.tmdb.api_key = None;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trakt_key().is_none() {
            return Err(ConfigError::MissingCatalogKey);
        }
        self.search.validate("search")?;
        self.related.validate("related")?;
        if self.enhancement.max_in_flight == 0 {
            return Err(ConfigError::Invalid {
                key: "enhancement.max_in_flight",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn trakt_key(&self) -> Option<&str> {
        self.trakt.api_key.as_deref().filter(|k| !k.is_empty())
    }
}
