//! File-backed referee violation log.

use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::info;

use crate::dao::{
    json_file,
    models::{RefereeLog, Violation},
    storage::StorageResult,
};

/// Violations persisted as `referee_data.json`, sorted by team number on disk.
pub struct RefereeStore {
    path: PathBuf,
    violations: Mutex<Vec<Violation>>,
}

impl RefereeStore {
    /// Load the log from `path`, creating an empty file when missing.
    pub async fn load(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let log: RefereeLog = json_file::load_or_init(&path).await?;
        info!(path = %path.display(), violations = log.violations.len(), "loaded referee log");
        Ok(Self {
            path,
            violations: Mutex::new(log.violations),
        })
    }

    /// Current violations in insertion order.
    pub async fn violations(&self) -> Vec<Violation> {
        self.violations.lock().await.clone()
    }

    /// Append a violation and persist the log.
    pub async fn add(&self, violation: Violation) -> StorageResult<()> {
        let mut guard = self.violations.lock().await;
        guard.push(violation);
        self.persist(&guard).await
    }

    /// Remove the first violation equal to `violation`; returns whether one was found.
    pub async fn remove(&self, violation: &Violation) -> StorageResult<bool> {
        let mut guard = self.violations.lock().await;
        let Some(index) = guard.iter().position(|existing| existing == violation) else {
            return Ok(false);
        };
        guard.remove(index);
        self.persist(&guard).await?;
        Ok(true)
    }

    async fn persist(&self, violations: &[Violation]) -> StorageResult<()> {
        let mut sorted = violations.to_vec();
        sorted.sort_by_key(|violation| numeric_prefix(&violation.number));
        json_file::write(&self.path, &RefereeLog { violations: sorted }).await
    }
}

/// Leading digits of a team number (`"502A"` -> 502); teams without digits sort last.
fn numeric_prefix(team: &str) -> u64 {
    let digits: String = team
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(u64::MAX)
}
