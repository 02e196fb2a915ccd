use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::storage::Storage;

/// JSON-file storage rooted at the host's data directory. Each key path
/// maps to `<root>/<k1>/.../<kn>.json`.
#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, keys: &[&str]) -> CoreResult<PathBuf> {
        let Some((last, parents)) = keys.split_last() else {
            return Err(CoreError::InvalidInput("storage keys empty".to_string()));
        };
        let mut path = self.root.clone();
        for key in parents {
            validate_key(key)?;
            path.push(key);
        }
        validate_key(last)?;
        path.push(format!("{}.json", last.trim_end_matches(".json")));
        Ok(path)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn write(&self, keys: &[&str], data: &Value) -> CoreResult<()> {
        let path = self.path_for(keys)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                CoreError::Internal(format!(
                    "failed to create storage directory {}: {error}",
                    parent.display()
                ))
            })?;
        }
        let serialized = serde_json::to_vec_pretty(data)
            .map_err(|error| CoreError::Internal(format!("storage serialize error: {error}")))?;

        // Write beside the target and rename so readers never see half a file.
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, serialized).await.map_err(|error| {
            CoreError::Internal(format!(
                "failed to write storage file {}: {error}",
                staging.display()
            ))
        })?;
        tokio::fs::rename(&staging, &path).await.map_err(|error| {
            CoreError::Internal(format!(
                "failed to replace storage file {}: {error}",
                path.display()
            ))
        })
    }

    async fn read(&self, keys: &[&str]) -> CoreResult<Option<Value>> {
        let path = self.path_for(keys)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(CoreError::Internal(format!(
                    "failed to read storage file {}: {error}",
                    path.display()
                )))
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|error| {
            CoreError::Internal(format!("storage parse error in {}: {error}", path.display()))
        })?;
        Ok(Some(value))
    }
}

fn validate_key(key: &str) -> CoreResult<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\');
    if invalid {
        return Err(CoreError::InvalidInput(format!("invalid storage key {key:?}")));
    }
    Ok(())
}
