//! Process configuration
//!
//! One `Config` value is constructed at startup (TOML file, then environment
//! overrides) and handed into each adapter constructor. Nothing reads the
//! environment after that point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Default bound on how long the pipeline waits for provider collection.
pub const DEFAULT_COLLECT_DEADLINE_SECS: u64 = 10;

/// Google Places credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCredentials {
    pub api_key: String,
    /// Override for tests/proxies; the adapter supplies the real default.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Naver Local Search credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Kakao Local Search credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct KakaoCredentials {
    pub rest_api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Advisory annotator (OpenAI-compatible chat completions) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatorConfig {
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Root configuration. Every provider section is optional; adapters are only
/// constructed for the providers that have credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub google: Option<GoogleCredentials>,
    #[serde(default)]
    pub naver: Option<NaverCredentials>,
    #[serde(default)]
    pub kakao: Option<KakaoCredentials>,
    #[serde(default)]
    pub annotator: Option<AnnotatorConfig>,
    /// Where snapshots are written. Defaults to the platform data dir.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
    #[serde(default)]
    pub collect_deadline_secs: Option<u64>,
}

impl Config {
    /// Load configuration following the priority order
    /// environment > TOML config file > compiled default.
    ///
    /// `explicit_path` (normally from the CLI) must exist if given; the
    /// default path (`<config dir>/reachcheck/config.toml`) is optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Config::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Default configuration file path for the platform.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reachcheck").join("config.toml"))
    }

    /// Overlay environment variables onto file values. Environment wins.
    fn apply_env(&mut self) {
        if let Some(key) = env_nonempty("GOOGLE_MAPS_API_KEY") {
            let base_url = self.google.take().and_then(|g| g.base_url);
            self.google = Some(GoogleCredentials { api_key: key, base_url });
        }
        if let (Some(id), Some(secret)) =
            (env_nonempty("NAVER_CLIENT_ID"), env_nonempty("NAVER_CLIENT_SECRET"))
        {
            let base_url = self.naver.take().and_then(|n| n.base_url);
            self.naver = Some(NaverCredentials { client_id: id, client_secret: secret, base_url });
        }
        if let Some(key) = env_nonempty("KAKAO_REST_API_KEY") {
            let base_url = self.kakao.take().and_then(|k| k.base_url);
            self.kakao = Some(KakaoCredentials { rest_api_key: key, base_url });
        }
        if let Some(key) = env_nonempty("OPENAI_API_KEY") {
            let prior = self.annotator.take();
            self.annotator = Some(AnnotatorConfig {
                api_key: key,
                model: prior.as_ref().and_then(|a| a.model.clone()),
                base_url: prior.and_then(|a| a.base_url),
            });
        }
        if let Some(dir) = env_nonempty("REACHCHECK_SNAPSHOT_DIR") {
            self.snapshot_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = env_nonempty("REACHCHECK_DEADLINE_SECS") {
            match secs.parse::<u64>() {
                Ok(v) => self.collect_deadline_secs = Some(v),
                Err(_) => {
                    tracing::warn!(value = %secs, "Ignoring non-numeric REACHCHECK_DEADLINE_SECS")
                }
            }
        }
    }

    /// Effective snapshot directory.
    pub fn snapshot_dir(&self) -> PathBuf {
        if let Some(dir) = &self.snapshot_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join("reachcheck").join("snapshots"))
            .unwrap_or_else(|| PathBuf::from("snapshots"))
    }

    /// Effective collection deadline for the bounded wait-all.
    pub fn collect_deadline(&self) -> Duration {
        Duration::from_secs(self.collect_deadline_secs.unwrap_or(DEFAULT_COLLECT_DEADLINE_SECS))
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
