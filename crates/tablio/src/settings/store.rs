use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::CoreResult;
use crate::settings::TidyConfig;
use crate::storage::SharedStorage;

const SETTINGS_KEY: &str = "settings";

/// Reads and writes the settings record owned by the options page.
#[derive(Clone)]
pub struct SettingsStore {
    storage: SharedStorage,
    writes: Arc<Mutex<()>>,
}

impl SettingsStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Loads the current configuration. Never fails: unreadable or missing
    /// settings fall back to defaults so a tidy pass can still run.
    pub async fn load(&self) -> TidyConfig {
        match self.read().await {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!("failed to load settings, using defaults: {error}");
                TidyConfig::default()
            }
        }
    }

    pub async fn save(&self, config: &TidyConfig) -> CoreResult<()> {
        let _writing = self.writes.lock().await;
        self.write(config).await
    }

    /// Loads, applies `edit`, and saves only if the edit succeeded.
    ///
    /// Unlike [`load`](Self::load) an unreadable record is an error here, so
    /// an edit never replaces settings it could not see.
    pub async fn update<T>(
        &self,
        edit: impl FnOnce(&mut TidyConfig) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let _writing = self.writes.lock().await;
        let mut config = self.read().await?;
        let result = edit(&mut config)?;
        self.write(&config).await?;
        Ok(result)
    }

    async fn read(&self) -> CoreResult<TidyConfig> {
        Ok(self
            .storage
            .read(&[SETTINGS_KEY])
            .await?
            .map(|value| TidyConfig::from_value(&value))
            .unwrap_or_default())
    }

    async fn write(&self, config: &TidyConfig) -> CoreResult<()> {
        self.storage.write(&[SETTINGS_KEY], &config.to_value()).await
    }
}
