//! Configuration loading for the GFS archive and retrieval tuning.
//!
//! Loads `config/models/<id>.yaml`. Every section is optional; missing
//! values fall back to the NOMADS production layout and to pacing that
//! stays under the archive's throttling limit.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{DownloadError, Result};
use crate::request::ForecastRequest;

/// Root configuration loaded from a model YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub model: ModelInfo,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub fields: FieldDefaults,
}

/// Basic model identification.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            id: "gfs".to_string(),
            name: "GFS - Global Forecast System".to_string(),
            description: String::new(),
        }
    }
}

/// Archive layout.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_prefix_template")]
    pub prefix_template: String,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
}

fn default_base_url() -> String {
    "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod".to_string()
}

fn default_prefix_template() -> String {
    "gfs.{date}/{cycle:02}/atmos".to_string()
}

fn default_file_pattern() -> String {
    "gfs.t{cycle:02}z.pgrb2.0p25.f{forecast:03}".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            prefix_template: default_prefix_template(),
            file_pattern: default_file_pattern(),
        }
    }
}

impl SourceConfig {
    /// URL of the GRIB2 file for a request. The index is this URL plus `.idx`.
    pub fn file_url(&self, request: &ForecastRequest) -> String {
        let date = request.date_label();
        let cycle = format!("{:02}", request.cycle.hour());
        let forecast = format!("{:03}", request.forecast_hour.hours());

        let render = |template: &str| {
            template
                .replace("{date}", &date)
                .replace("{cycle:02}", &cycle)
                .replace("{forecast:03}", &forecast)
        };

        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            render(&self.prefix_template).trim_matches('/'),
            render(&self.file_pattern)
        )
    }
}

/// Pacing, retry and concurrency settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Forecast hours processed concurrently
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Forecast hours handed to a worker at a time
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Lower bound of the random delay before a task starts
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,
    /// Upper bound of the random delay before a task starts
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
    /// Pause between the index request and the ranged request
    #[serde(default = "default_range_pause_ms")]
    pub range_pause_ms: u64,
    /// Additional attempts after an empty response
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_workers() -> usize {
    4
}

fn default_chunk_size() -> usize {
    10
}

fn default_jitter_min_ms() -> u64 {
    100
}

fn default_jitter_max_ms() -> u64 {
    1100
}

fn default_range_pause_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            chunk_size: default_chunk_size(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            range_pause_ms: default_range_pause_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl RetrievalConfig {
    pub fn jitter(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.jitter_min_ms),
            Duration::from_millis(self.jitter_max_ms),
        )
    }

    pub fn range_pause(&self) -> Duration {
        Duration::from_millis(self.range_pause_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(DownloadError::Configuration(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(DownloadError::Configuration(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(DownloadError::Configuration(format!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                self.jitter_min_ms, self.jitter_max_ms
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(DownloadError::Configuration(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fields requested when none are given on the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefaults {
    pub variables: Vec<String>,
    pub levels: Vec<String>,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            variables: vec!["TMP".to_string()],
            levels: vec!["2 m above ground".to_string()],
        }
    }
}

impl ModelConfig {
    /// Load a model configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DownloadError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: ModelConfig =
            serde_yaml::from_str(&content).map_err(|e| DownloadError::ConfigFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        config.retrieval.validate()?;

        debug!(model = %config.model.id, path = %path.display(), "Loaded model config");
        Ok(config)
    }
}

/// Load `<config_dir>/models/<model_id>.yaml`, or the built-in defaults if
/// the file does not exist.
pub fn load_model_config(config_dir: &Path, model_id: &str) -> Result<ModelConfig> {
    let models_dir = config_dir.join("models");
    let path = ["yaml", "yml"]
        .iter()
        .map(|ext| models_dir.join(format!("{}.{}", model_id, ext)))
        .find(|p| p.exists());

    match path {
        Some(path) => {
            let config = ModelConfig::load(&path)?;
            info!(
                model = %config.model.id,
                name = %config.model.name,
                path = %path.display(),
                "Loaded model configuration"
            );
            Ok(config)
        }
        None => {
            warn!(
                path = %models_dir.display(),
                model = model_id,
                "Model config not found, using built-in defaults"
            );
            Ok(ModelConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{parse_date, Cycle, ForecastHour};

    fn request() -> ForecastRequest {
        ForecastRequest::new(
            parse_date("20220826").unwrap(),
            Cycle::new(6).unwrap(),
            ForecastHour::new(6).unwrap(),
            &["TMP"],
            &["2 m above ground"],
        )
        .unwrap()
    }

    #[test]
    fn test_default_file_url() {
        let source = SourceConfig::default();
        assert_eq!(
            source.file_url(&request()),
            "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod/\
             gfs.20220826/06/atmos/gfs.t06z.pgrb2.0p25.f006"
        );
    }

    #[test]
    fn test_file_url_trims_slashes() {
        let source = SourceConfig {
            base_url: "http://127.0.0.1:9000/".to_string(),
            prefix_template: "/gfs.{date}/{cycle:02}/atmos/".to_string(),
            ..SourceConfig::default()
        };
        assert_eq!(
            source.file_url(&request()),
            "http://127.0.0.1:9000/gfs.20220826/06/atmos/gfs.t06z.pgrb2.0p25.f006"
        );
    }

    #[test]
    fn test_parse_gfs_config() {
        let yaml = r#"
model:
  id: gfs
  name: "GFS - Global Forecast System"

source:
  base_url: "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod"
  prefix_template: "gfs.{date}/{cycle:02}/atmos"
  file_pattern: "gfs.t{cycle:02}z.pgrb2.0p25.f{forecast:03}"

retrieval:
  max_workers: 2
  max_retries: 3

fields:
  variables: [TMP, APCP]
  levels: ["2 m above ground", "surface"]
"#;

        let config: ModelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.model.id, "gfs");
        assert_eq!(config.retrieval.max_workers, 2);
        assert_eq!(config.retrieval.max_retries, 3);
        assert_eq!(config.retrieval.chunk_size, 10);
        assert_eq!(config.retrieval.jitter(), (Duration::from_millis(100), Duration::from_millis(1100)));
        assert_eq!(config.fields.variables, vec!["TMP", "APCP"]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ModelConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.model.id, "gfs");
        assert_eq!(config.retrieval.max_retries, 5);
        assert_eq!(config.retrieval.range_pause(), Duration::from_millis(500));
        assert_eq!(config.fields.levels, vec!["2 m above ground"]);
    }

    #[test]
    fn test_validate() {
        assert!(RetrievalConfig::default().validate().is_ok());

        let inverted = RetrievalConfig {
            jitter_min_ms: 2000,
            ..RetrievalConfig::default()
        };
        assert!(inverted.validate().is_err());

        let no_workers = RetrievalConfig {
            max_workers: 0,
            ..RetrievalConfig::default()
        };
        assert!(no_workers.validate().is_err());
    }

    #[test]
    fn test_load_missing_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_model_config(dir.path(), "gfs").unwrap();
        assert_eq!(config.source.base_url, default_base_url());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("models")).unwrap();
        std::fs::write(
            dir.path().join("models/gfs.yaml"),
            "source:\n  base_url: \"http://localhost:8080\"\n",
        )
        .unwrap();

        let config = load_model_config(dir.path(), "gfs").unwrap();
        assert_eq!(config.source.base_url, "http://localhost:8080");
        assert_eq!(config.source.file_pattern, default_file_pattern());
    }

    #[test]
    fn test_load_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("models")).unwrap();
        std::fs::write(
            dir.path().join("models/gfs.yaml"),
            "retrieval:\n  jitter_min_ms: 5000\n  jitter_max_ms: 10\n",
        )
        .unwrap();

        assert!(matches!(
            load_model_config(dir.path(), "gfs"),
            Err(DownloadError::Configuration(_))
        ));
    }
}
