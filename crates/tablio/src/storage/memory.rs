use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::storage::Storage;

/// Process-local storage, used by tests and by hosts that do not persist.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(keys: &[&str]) -> CoreResult<String> {
        if keys.is_empty() {
            return Err(CoreError::InvalidInput("storage keys empty".to_string()));
        }
        Ok(keys.join("/"))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn write(&self, keys: &[&str], data: &Value) -> CoreResult<()> {
        let key = Self::key(keys)?;
        self.entries.write().await.insert(key, data.clone());
        Ok(())
    }

    async fn read(&self, keys: &[&str]) -> CoreResult<Option<Value>> {
        let key = Self::key(keys)?;
        Ok(self.entries.read().await.get(&key).cloned())
    }
}
