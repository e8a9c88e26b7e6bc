//! Configuration management for Reelvault services

use reelvault_types::RenditionFailurePolicy;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Transcoding pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Directory where completed uploads are placed by the intake provider.
    pub intake_dir: PathBuf,
    /// Root directory for per-job output buckets.
    pub media_dir: PathBuf,
    /// Seconds between intake scans.
    pub scan_interval_secs: u64,
    /// Override for the transcode worker binary. When unset the binary is
    /// resolved next to the running executable.
    pub worker_bin: Option<PathBuf>,
    /// Watchdog timeout for each supervision phase, in seconds.
    pub worker_timeout_secs: u64,
    /// Job-level outcome policy for per-rendition failures.
    pub rendition_policy: RenditionFailurePolicy,
}

/// State endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StateStoreConfig {
    pub endpoint: String,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub state_store: StateStoreConfig,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let data_dir = env::var("REELVAULT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let intake_dir = env::var("INTAKE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("intake"));

        let media_dir = env::var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("media"));

        let scan_interval_secs = env::var("SCAN_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let worker_timeout_secs = env::var("WORKER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        let worker_bin = env::var("WORKER_BIN").ok().map(PathBuf::from);

        let rendition_policy = env::var("RENDITION_POLICY")
            .ok()
            .map(|v| {
                v.parse::<RenditionFailurePolicy>()
                    .map_err(config::ConfigError::Message)
            })
            .transpose()?
            .unwrap_or_default();

        let endpoint = env::var("STATE_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:8300".to_string());

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            pipeline: PipelineConfig {
                intake_dir,
                media_dir,
                scan_interval_secs,
                worker_bin,
                worker_timeout_secs,
                rendition_policy,
            },
            state_store: StateStoreConfig { endpoint },
            log_level: Some(log_level),
        })
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

fn default_data_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib"))
        .join(".reelvault")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_struct() {
        let config = PipelineConfig {
            intake_dir: PathBuf::from("/data/intake"),
            media_dir: PathBuf::from("/data/media"),
            scan_interval_secs: 3,
            worker_bin: None,
            worker_timeout_secs: 600,
            rendition_policy: RenditionFailurePolicy::default(),
        };
        assert_eq!(config.scan_interval_secs, 3);
        assert_eq!(
            config.rendition_policy,
            RenditionFailurePolicy::AllMustSucceed
        );
    }

    #[test]
    fn test_default_data_dir_is_under_home() {
        let dir = default_data_dir();
        assert!(dir.ends_with(".reelvault"));
    }
}
