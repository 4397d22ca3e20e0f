//! File-backed store for the registration window settings.

use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::info;

use crate::dao::{
    json_file,
    models::{QueueSettings, SettingsPatch},
    storage::StorageResult,
};

/// Queue settings persisted as `queue_settings.json`.
pub struct SettingsStore {
    path: PathBuf,
    settings: Mutex<QueueSettings>,
}

impl SettingsStore {
    /// Load settings from `path`, writing defaults when the file does not exist.
    pub async fn load(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let settings: QueueSettings = json_file::load_or_init(&path).await?;
        info!(path = %path.display(), settings = ?settings, "loaded queue settings");
        Ok(Self::with_settings(path, settings))
    }

    /// Build a store around known settings without touching the disk.
    pub fn with_settings(path: impl Into<PathBuf>, settings: QueueSettings) -> Self {
        Self {
            path: path.into(),
            settings: Mutex::new(settings),
        }
    }

    /// Current settings.
    pub async fn get(&self) -> QueueSettings {
        self.settings.lock().await.clone()
    }

    /// Shallow-merge `patch`, persist, and return the resulting settings.
    ///
    /// The in-memory value is updated even when the write fails, matching the
    /// whole-file overwrite model where the next successful write catches up.
    pub async fn update(&self, patch: SettingsPatch) -> StorageResult<QueueSettings> {
        let mut guard = self.settings.lock().await;
        guard.apply(patch);
        let updated = guard.clone();
        json_file::write(&self.path, &updated).await?;
        Ok(updated)
    }
}
