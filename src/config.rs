//! Runtime settings.
//!
//! Values are resolved in three layers, later layers winning:
//! built-in defaults, an optional TOML file (`CHARTSYNC_CONFIG` or
//! `<config_dir>/chartsync/config.toml`), then environment variables (a `.env`
//! file in the working directory is loaded first).

use std::{collections::BTreeMap, env, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    cache::MAX_CACHE_TTL_HOURS,
    error::{Error, Result},
};

pub const APP_DIR: &str = "chartsync";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const SPOTIFY_SCOPES: [&str; 3] = [
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

const DEFAULT_LIMIT: usize = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    pub url: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub settings: FileSettings,
    #[serde(default)]
    pub regions: BTreeMap<String, RegionConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    pub default_limit: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub cache_ttl_hours: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub default_limit: usize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub cache_ttl_hours: i64,
    pub log_level: String,
    pub regions: BTreeMap<String, RegionConfig>,
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Loads `.env`, the optional TOML file and the process environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let path = config_file_path();
        let file = match &path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                info!("Loaded configuration from {}", p.display());
                Some(toml::from_str::<FileConfig>(&content)?)
            }
            _ => None,
        };
        let loaded_from = path.filter(|p| p.exists());

        let mut settings = Self::from_sources(file, |key| env::var(key).ok())?;
        settings.config_file = loaded_from;
        Ok(settings)
    }

    /// Builds settings from an already parsed file and an environment lookup.
    pub fn from_sources<F>(file: Option<FileConfig>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();
        let fs = file.settings;

        let regions = if file.regions.is_empty() {
            default_regions()
        } else {
            file.regions
        };

        Ok(Self {
            client_id: env("SPOTIFY_CLIENT_ID").unwrap_or_default(),
            client_secret: env("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: env("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            default_limit: parse_env(&env, "PLAYLIST_LIMIT")?
                .or(fs.default_limit)
                .unwrap_or(DEFAULT_LIMIT),
            request_timeout: Duration::from_secs(
                parse_env(&env, "REQUEST_TIMEOUT")?
                    .or(fs.request_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_retries: parse_env(&env, "MAX_RETRIES")?
                .or(fs.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_secs(
                parse_env(&env, "RETRY_DELAY")?
                    .or(fs.retry_delay_secs)
                    .unwrap_or(DEFAULT_RETRY_DELAY_SECS),
            ),
            cache_ttl_hours: parse_env(&env, "CACHE_TTL_HOURS")?
                .or(fs.cache_ttl_hours)
                .unwrap_or(DEFAULT_CACHE_TTL_HOURS),
            log_level: env("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            regions,
            config_file: None,
        })
    }

    /// Returns every problem found; an empty list means the settings are usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.client_id.trim().is_empty() {
            problems.push("SPOTIFY_CLIENT_ID is not set".to_string());
        }
        if self.client_secret.trim().is_empty() {
            problems.push("SPOTIFY_CLIENT_SECRET is not set".to_string());
        }
        if self.redirect_uri.trim().is_empty() {
            problems.push("REDIRECT_URI is empty".to_string());
        }
        if self.default_limit == 0 {
            problems.push("PLAYLIST_LIMIT must be at least 1".to_string());
        }
        if self.max_retries == 0 {
            problems.push("MAX_RETRIES must be at least 1".to_string());
        }
        if self.cache_ttl_hours < 0 {
            problems.push("CACHE_TTL_HOURS cannot be negative".to_string());
        } else if self.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
            problems.push(format!(
                "CACHE_TTL_HOURS cannot exceed {MAX_CACHE_TTL_HOURS} (ten years)"
            ));
        }
        if self.regions.is_empty() {
            problems.push("No chart regions configured".to_string());
        }
        problems
    }

    /// Fails with a configuration error listing every problem.
    pub fn ensure_valid(&self) -> Result<()> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration(problems.join("; ")))
        }
    }
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{key} has an invalid value: {raw}"))),
        None => Ok(None),
    }
}

pub fn default_regions() -> BTreeMap<String, RegionConfig> {
    [
        ("brazil", "br", "Brazil"),
        ("global", "global", "Global"),
        ("us", "us", "United States"),
        ("uk", "gb", "United Kingdom"),
    ]
    .into_iter()
    .map(|(name, code, display)| {
        (
            name.to_string(),
            RegionConfig {
                url: format!("https://kworb.net/spotify/country/{code}_weekly_totals.html"),
                display_name: Some(display.to_string()),
            },
        )
    })
    .collect()
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("CHARTSYNC_CONFIG") {
        return Some(PathBuf::from(p));
    }
    dirs::config_dir().map(|mut p| {
        p.push(APP_DIR);
        p.push("config.toml");
        p
    })
}

/// Local data directory holding the token and playlist caches.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

pub fn playlist_cache_path() -> PathBuf {
    data_dir().join("cache").join("playlists.json")
}

pub fn token_cache_path() -> PathBuf {
    data_dir().join("spotify_token_cache.json")
}

/// Shows only the last four characters of a secret.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "Not set".to_string();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{tail}")
}
