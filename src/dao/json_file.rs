//! Whole-file JSON persistence shared by the queue, settings and referee stores.

use std::{io::ErrorKind, path::Path};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{info, warn};

use crate::dao::storage::{StorageError, StorageResult};

/// Load `path` into `T`, creating the file with `T::default()` when it does not exist yet.
///
/// Empty or corrupt files are logged and replaced in memory by the default value; the
/// file itself is left untouched until the next write.
pub async fn load_or_init<T>(path: &Path) -> StorageResult<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    match fs::read_to_string(path).await {
        Ok(contents) if contents.trim().is_empty() => {
            info!(path = %path.display(), "data file is empty; using defaults");
            Ok(T::default())
        }
        Ok(contents) => match serde_json::from_str::<T>(&contents) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse data file; starting from defaults"
                );
                Ok(T::default())
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "data file not found; creating it");
            let value = T::default();
            write(path, &value).await?;
            Ok(value)
        }
        Err(err) => Err(StorageError::io(path, err)),
    }
}

/// Overwrite `path` with the pretty-printed JSON encoding of `value`.
pub async fn write<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let payload = serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| StorageError::io(parent, err))?;
    }

    fs::write(path, payload)
        .await
        .map_err(|err| StorageError::io(path, err))
}

/// Read and decode a JSON file that must already exist.
pub async fn read<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|err| StorageError::io(path, err))?;
    serde_json::from_str(&contents).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(default)]
        values: Vec<u32>,
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sample.json");

        let loaded: Sample = load_or_init(&path).await.unwrap();

        assert_eq!(loaded, Sample::default());
        let reread: Sample = read(&path).await.unwrap();
        assert_eq!(reread, Sample::default());
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded: Sample = load_or_init(&path).await.unwrap();
        assert_eq!(loaded, Sample::default());
    }

    #[tokio::test]
    async fn written_values_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");

        write(&path, &Sample { values: vec![3, 1] }).await.unwrap();
        let loaded: Sample = load_or_init(&path).await.unwrap();
        assert_eq!(loaded.values, vec![3, 1]);
    }
}
