//! Configuration types for carousel-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Registry bookkeeping policy (staleness sweep)
///
/// Both values are policy constants: `stale_after` must stay comfortably above
/// the worst-case duration of a large batch, and above `sweep_interval`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Age after which an in-flight entry is evicted by the sweep (default: 300 seconds)
    #[serde(default = "default_stale_after", with = "duration_serde")]
    pub stale_after: Duration,

    /// How often the sweep runs (default: 60 seconds)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            stale_after: default_stale_after(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// HTTP fetch settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Accept header sent with every image request (default: "image/*")
    #[serde(default = "default_accept")]
    pub accept: String,

    /// Optional User-Agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Per-request timeout (None = no timeout; stalled fetches are reclaimed by the sweep)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            accept: default_accept(),
            user_agent: None,
            request_timeout: None,
        }
    }
}

/// Compression used for archive entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveCompression {
    /// No compression (images are already compressed)
    Stored,
    /// Deflate (default)
    #[default]
    Deflated,
}

/// Archive assembly settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Entry compression method
    #[serde(default)]
    pub compression: ArchiveCompression,
}

/// Naming rules applied when turning a scraped post into download intents
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Label used when the post has no usable title (default: "xhs-post")
    #[serde(default = "default_fallback_post_title")]
    pub fallback_post_title: String,

    /// Maximum number of characters kept from the post title (default: 20)
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,

    /// Base URL of the watermark-free image CDN
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            fallback_post_title: default_fallback_post_title(),
            max_title_chars: default_max_title_chars(),
            cdn_base: default_cdn_base(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Skip the file, keep existing
    Skip,
}

/// Output settings used by [`DirectorySink`](crate::sink::DirectorySink)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory saved files land in (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// What to do when the target filename already exists
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS so an extension background page can call the API (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration for [`ImageDownloader`](crate::ImageDownloader)
///
/// Every section has defaults, so `Config::default()` works out of the box and
/// a JSON file only needs the keys it overrides.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry staleness policy
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Post title and filename derivation
    #[serde(default)]
    pub naming: NamingConfig,

    /// Filesystem output
    #[serde(default)]
    pub output: OutputConfig,

    /// REST API
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.registry.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep interval must be greater than zero".into(),
                key: Some("registry.sweep_interval".into()),
            });
        }
        if self.registry.stale_after <= self.registry.sweep_interval {
            return Err(Error::Config {
                message: format!(
                    "stale_after ({}s) must be larger than sweep_interval ({}s)",
                    self.registry.stale_after.as_secs(),
                    self.registry.sweep_interval.as_secs()
                ),
                key: Some("registry.stale_after".into()),
            });
        }
        if self.naming.max_title_chars == 0 {
            return Err(Error::Config {
                message: "max_title_chars must be at least 1".into(),
                key: Some("naming.max_title_chars".into()),
            });
        }
        if url::Url::parse(&self.naming.cdn_base).is_err() {
            return Err(Error::Config {
                message: format!("invalid CDN base URL '{}'", self.naming.cdn_base),
                key: Some("naming.cdn_base".into()),
            });
        }
        Ok(())
    }
}

fn default_stale_after() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_accept() -> String {
    "image/*".into()
}

fn default_fallback_post_title() -> String {
    "xhs-post".into()
}

fn default_max_title_chars() -> usize {
    20
}

fn default_cdn_base() -> String {
    "https://sns-img-bd.xhscdn.com".into()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
