//! Application-level configuration: listening port, data directory and tournament manager access.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::auto_dequeue::{DEFAULT_POLL_INTERVAL, DequeueConfig};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SKILLS_QUEUE_CONFIG_PATH";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_BASE_URL: &str = "http://10.0.0.3";

const QUEUE_FILE: &str = "queue_data.json";
const SETTINGS_FILE: &str = "queue_settings.json";
const REFEREE_FILE: &str = "referee_data.json";
const OFFLINE_TEAMS_FILE: &str = "teams_offline.json";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// HTTP listening port.
    pub port: u16,
    /// Directory holding the JSON data files.
    pub data_dir: PathBuf,
    /// Tournament manager access.
    pub tournament: TournamentSettings,
}

/// How the tournament manager is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSettings {
    /// Root URL of the tournament manager web server.
    pub base_url: String,
    /// No tournament manager on site: roster comes from disk and auto-dequeue is off.
    pub offline_mode: bool,
    /// Delay between skills scrapes while teams are on a field.
    pub poll_interval_ms: u64,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            offline_mode: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            tournament: TournamentSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration file, then apply environment overrides.
    ///
    /// A missing or unreadable file is not an error: built-in defaults are used instead.
    pub fn load() -> Self {
        let mut config = Self::from_file(&resolve_config_path());
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Apply `PORT`/`SERVER_PORT`, `DATA_DIR`, `VEX_TM_BASE_URL`, `OFFLINE_MODE` and
    /// `SKILLS_POLL_INTERVAL_MS` as read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let port = lookup("PORT").or_else(|| lookup("SERVER_PORT"));
        if let Some(value) = port {
            match value.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %value, "ignoring invalid port override"),
            }
        }

        if let Some(dir) = lookup("DATA_DIR").filter(|dir| !dir.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(url) = lookup("VEX_TM_BASE_URL") {
            self.tournament.base_url = url;
        }

        if let Some(value) = lookup("OFFLINE_MODE") {
            self.tournament.offline_mode = value.trim().eq_ignore_ascii_case("true");
        }

        if let Some(value) = lookup("SKILLS_POLL_INTERVAL_MS") {
            match value.parse::<u64>() {
                Ok(ms) if ms > 0 => self.tournament.poll_interval_ms = ms,
                _ => warn!(value = %value, "ignoring invalid poll interval override"),
            }
        }
    }

    /// Path of the persisted queue lists.
    pub fn queue_path(&self) -> PathBuf {
        self.data_dir.join(QUEUE_FILE)
    }

    /// Path of the persisted registration settings.
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Path of the referee violation log.
    pub fn referee_path(&self) -> PathBuf {
        self.data_dir.join(REFEREE_FILE)
    }

    /// Path of the roster used in offline mode.
    pub fn offline_teams_path(&self) -> PathBuf {
        self.data_dir.join(OFFLINE_TEAMS_FILE)
    }

    /// Auto-dequeue engine configuration derived from the tournament settings.
    pub fn dequeue_config(&self) -> DequeueConfig {
        let base_url = Some(self.tournament.base_url.clone()).filter(|url| !url.trim().is_empty());
        DequeueConfig {
            base_url,
            poll_interval_ms: self.tournament.poll_interval_ms,
            offline_mode: self.tournament.offline_mode,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    base_url: Option<String>,
    offline_mode: Option<bool>,
    poll_interval_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            port: raw.port.unwrap_or(defaults.port),
            data_dir: raw.data_dir.unwrap_or(defaults.data_dir),
            tournament: TournamentSettings {
                base_url: raw.base_url.unwrap_or(defaults.tournament.base_url),
                offline_mode: raw.offline_mode.unwrap_or(defaults.tournament.offline_mode),
                poll_interval_ms: raw
                    .poll_interval_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(defaults.tournament.poll_interval_ms),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
