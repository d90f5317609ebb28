use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::analysis::DetectorConfig;

/// Application-level constants
pub const APP_NAME: &str = "MediVision";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upload ceiling for the analysis routes and 2D report routes (50 MB).
pub const MAX_IMAGE_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Upload ceiling for retinal photographs (20 MB).
pub const MAX_RETINAL_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
/// Upload ceiling for volumetric (3D) scans (200 MB).
pub const MAX_VOLUME_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
/// Headroom on top of a file ceiling for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_MODEL_SERVICE_URL: &str = "http://localhost:8501";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TOP_K: usize = 3;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medivision_lib=info,medivision=info,tower_http=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Cannot read detector config {path}: {source}")]
    DetectorFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed detector config {path}: {source}")]
    DetectorParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` leaves the generator unconfigured; report routes then fail with 500.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub llm_timeout: Duration,
    /// Base URL of the model-serving process that hosts the per-modality classifiers.
    pub model_service_url: String,
    /// Stored results older than this read as absent. `None` keeps them for the process lifetime.
    pub result_ttl: Option<Duration>,
    pub top_k: usize,
    pub detectors: DetectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8000))),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            model_service_url: DEFAULT_MODEL_SERVICE_URL.into(),
            result_ttl: None,
            top_k: DEFAULT_TOP_K,
            detectors: DetectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup (env in production, maps in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = get("MEDIVISION_BIND") {
            config.bind_addr = bind.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MEDIVISION_BIND",
                value: bind.clone(),
            })?;
        }
        config.gemini_api_key = get("GEMINI_API_KEY");
        if let Some(url) = get("GEMINI_BASE_URL") {
            config.gemini_base_url = url;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(secs) = get("MEDIVISION_LLM_TIMEOUT_SECS") {
            config.llm_timeout = Duration::from_secs(parse_number("MEDIVISION_LLM_TIMEOUT_SECS", &secs)?);
        }
        if let Some(url) = get("MEDIVISION_MODEL_URL") {
            config.model_service_url = url;
        }
        if let Some(secs) = get("MEDIVISION_RESULT_TTL_SECS") {
            let secs = parse_number("MEDIVISION_RESULT_TTL_SECS", &secs)?;
            config.result_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(k) = get("MEDIVISION_TOP_K") {
            let k = parse_number("MEDIVISION_TOP_K", &k)?;
            if k == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "MEDIVISION_TOP_K",
                    value: k.to_string(),
                });
            }
            config.top_k = k as usize;
        }
        if let Some(path) = get("MEDIVISION_DETECTOR_CONFIG") {
            config.detectors = load_detector_config(PathBuf::from(path))?;
        }

        Ok(config)
    }
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Load detector parameters from a JSON file. Missing fields keep their defaults.
pub fn load_detector_config(path: PathBuf) -> Result<DetectorConfig, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::DetectorFile {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::DetectorParse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.top_k, 3);
        assert!(config.result_ttl.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MEDIVISION_BIND", "127.0.0.1:9100"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("MEDIVISION_LLM_TIMEOUT_SECS", "30"),
            ("MEDIVISION_RESULT_TTL_SECS", "600"),
            ("MEDIVISION_TOP_K", "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_model, "gemini-1.5-pro");
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert_eq!(config.result_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let config =
            AppConfig::from_lookup(lookup(&[("MEDIVISION_RESULT_TTL_SECS", "0")])).unwrap();
        assert!(config.result_ttl.is_none());
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("MEDIVISION_BIND", "not-an-addr")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "MEDIVISION_BIND",
                ..
            }
        ));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("MEDIVISION_TOP_K", "0")])).is_err());
    }

    #[test]
    fn detector_config_file_overrides_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fracture": {{"min_area": 10.0}}}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config =
            AppConfig::from_lookup(lookup(&[("MEDIVISION_DETECTOR_CONFIG", path.as_str())]))
                .unwrap();
        assert_eq!(config.detectors.fracture.min_area, 10.0);
        // Untouched fields keep defaults
        assert_eq!(config.detectors.fracture.max_area, 5000.0);
        assert_eq!(config.detectors.organ.canny_low, 100.0);
    }

    #[test]
    fn missing_detector_file_is_an_error() {
        let err = load_detector_config(PathBuf::from("/nonexistent/detectors.json")).unwrap_err();
        assert!(matches!(err, ConfigError::DetectorFile { .. }));
    }

    #[test]
    fn app_name_is_medivision() {
        assert_eq!(APP_NAME, "MediVision");
    }
}
