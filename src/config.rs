//! Configuration types for image-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Network fetch settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout (None = transport default, which never times out)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,

    /// Maximum accepted response body in bytes (None = unlimited)
    #[serde(default)]
    pub max_body_bytes: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_body_bytes: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Where and how saved copies are written
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Output directory (default: the platform Documents directory)
    ///
    /// The directory is never created by the library. A missing directory
    /// surfaces as a persist failure for every request.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Filename prefix; files are named `<prefix><unix-millis>.png`
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Worker queue and event channel sizing
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Jobs that may wait behind the running job on each worker (default: 64)
    ///
    /// Submissions beyond this wait for a free slot; nothing is dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Buffered events per subscriber before lagging receivers skip ahead (default: 256)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// How long `shutdown()` waits for in-flight requests (default: 30s)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            event_capacity: default_event_capacity(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Main configuration for [`ImageDownloader`](crate::ImageDownloader)
///
/// Every field has a default, so `Config::default()` works out of the box and
/// a partial JSON document deserializes into a complete config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output directory and file naming
    #[serde(default)]
    pub storage: StorageConfig,

    /// Worker and channel sizing
    #[serde(default)]
    pub workers: WorkerConfig,
}

impl Config {
    /// Output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.storage.output_dir
    }

    /// Check values that would make the pipeline unusable
    pub fn validate(&self) -> Result<()> {
        if self.storage.file_prefix.is_empty() {
            return Err(Error::config(
                "storage.file_prefix",
                "file prefix must not be empty",
            ));
        }
        if self
            .storage
            .file_prefix
            .contains(std::path::is_separator)
        {
            return Err(Error::config(
                "storage.file_prefix",
                "file prefix must not contain path separators",
            ));
        }
        if self.workers.queue_capacity == 0 {
            return Err(Error::config(
                "workers.queue_capacity",
                "queue capacity must be at least 1",
            ));
        }
        if self.workers.event_capacity == 0 {
            return Err(Error::config(
                "workers.event_capacity",
                "event capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_output_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from("Documents"))
}

fn default_file_prefix() -> String {
    "downloaded_image_".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_event_capacity() -> usize {
    256
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper (whole seconds)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.file_prefix, "downloaded_image_");
        assert!(config.fetch.timeout.is_none());
        assert!(config.fetch.max_body_bytes.is_none());
        assert_eq!(config.workers.queue_capacity, 64);
        assert_eq!(config.workers.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");
        assert_eq!(config.storage.file_prefix, "downloaded_image_");
        assert_eq!(config.workers.event_capacity, 256);
        assert_eq!(config.fetch.user_agent, default_user_agent());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config {
            fetch: FetchConfig {
                timeout: Some(Duration::from_secs(15)),
                max_body_bytes: Some(10 * 1024 * 1024),
                user_agent: "test-agent/1.0".to_string(),
            },
            storage: StorageConfig {
                output_dir: PathBuf::from("/tmp/pictures"),
                file_prefix: "img_".to_string(),
            },
            workers: WorkerConfig {
                queue_capacity: 4,
                event_capacity: 16,
                shutdown_timeout: Duration::from_secs(5),
            },
        };

        let json = serde_json::to_string(&config).expect("serialize failed");
        let deserialized: Config = serde_json::from_str(&json).expect("deserialize failed");

        assert_eq!(deserialized.fetch.timeout, Some(Duration::from_secs(15)));
        assert_eq!(deserialized.fetch.max_body_bytes, Some(10 * 1024 * 1024));
        assert_eq!(deserialized.fetch.user_agent, "test-agent/1.0");
        assert_eq!(deserialized.storage.output_dir, PathBuf::from("/tmp/pictures"));
        assert_eq!(deserialized.storage.file_prefix, "img_");
        assert_eq!(deserialized.workers.queue_capacity, 4);
        assert_eq!(deserialized.workers.event_capacity, 16);
        assert_eq!(deserialized.workers.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn timeout_serializes_as_seconds() {
        let fetch = FetchConfig {
            timeout: Some(Duration::from_secs(7)),
            ..Default::default()
        };
        let value = serde_json::to_value(&fetch).expect("serialize failed");
        assert_eq!(value["timeout"], serde_json::json!(7));

        let fetch = FetchConfig::default();
        let value = serde_json::to_value(&fetch).expect("serialize failed");
        assert!(value["timeout"].is_null());
    }

    #[test]
    fn rejects_empty_prefix() {
        let mut config = Config::default();
        config.storage.file_prefix.clear();
        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("storage.file_prefix"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_prefix_with_separator() {
        let mut config = Config::default();
        config.storage.file_prefix = "sub/dir_".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacities() {
        let mut config = Config::default();
        config.workers.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workers.event_capacity = 0;
        assert!(config.validate().is_err());
    }
}
