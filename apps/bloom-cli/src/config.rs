// config.rs — CLI configuration.
//
// BloomConfig decides where goals are stored and where notifications go.
// `for_data_dir()` yields defaults under the data directory; an optional
// `bloom.toml` in that directory overrides individual settings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use bloom_goal::{
    EventDispatcher, FileBackend, KeyValueBackend, LogSink, MemoryBackend, TracingSink,
    DEFAULT_STORAGE_KEY,
};
use serde::{Deserialize, Serialize};

/// Name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "bloom.toml";

/// Resolved configuration for one CLI invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomConfig {
    /// Root of everything Bloom writes.
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type: "file" (default) or "memory" (nothing survives the process)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Key the goal collection is stored under
    #[serde(default = "default_key")]
    pub key: String,

    /// Optional size limit for a stored value, in bytes
    #[serde(default)]
    pub quota_bytes: Option<usize>,

    /// Directory for file storage, relative to the data directory unless absolute
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            key: default_key(),
            quota_bytes: None,
            dir: default_storage_dir(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Deliver goal events at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSONL event log, relative to the data directory unless absolute
    #[serde(default = "default_events_log")]
    pub events_log: PathBuf,

    /// Event types written to the event log (e.g. ["goal_completed"]); all when unset
    #[serde(default)]
    pub log_events: Option<Vec<String>>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            events_log: default_events_log(),
            log_events: None,
        }
    }
}

fn default_backend() -> String {
    "file".to_string()
}

fn default_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_events_log() -> PathBuf {
    PathBuf::from("events.jsonl")
}

fn default_true() -> bool {
    true
}

impl BloomConfig {
    /// Defaults rooted at `data_dir`, ignoring any config file.
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            storage: StorageConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }

    /// Defaults overlaid with `<data_dir>/bloom.toml` when it exists.
    pub fn load(data_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::for_data_dir(data_dir));
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: BloomConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.data_dir = data_dir.to_path_buf();
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join(&self.storage.dir)
    }

    pub fn events_log(&self) -> PathBuf {
        self.data_dir.join(&self.notifications.events_log)
    }

    /// Build the configured persistence backend.
    pub fn backend(&self) -> anyhow::Result<Box<dyn KeyValueBackend>> {
        match self.storage.backend.as_str() {
            "file" => Ok(Box::new(FileBackend::new(self.storage_dir())?)),
            "memory" => Ok(Box::new(match self.storage.quota_bytes {
                Some(limit) => MemoryBackend::with_quota(limit),
                None => MemoryBackend::new(),
            })),
            other => anyhow::bail!(
                "unknown storage backend '{}' (expected \"file\" or \"memory\")",
                other
            ),
        }
    }

    /// Build the event dispatcher for the configured sinks.
    pub fn dispatcher(&self) -> EventDispatcher {
        let mut dispatcher = EventDispatcher::new();
        if self.notifications.enabled {
            dispatcher.add_sink(Box::new(TracingSink));
            let log = Box::new(LogSink::new(self.events_log()));
            match &self.notifications.log_events {
                Some(types) => dispatcher.subscribe(log, types.iter().cloned()),
                None => dispatcher.add_sink(log),
            }
        }
        dispatcher
    }
}
