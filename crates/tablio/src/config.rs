use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::scheduler::DEFAULT_QUIET_PERIOD;

pub const DEFAULT_ADDR: &str = "127.0.0.1:4840";
pub const DEFAULT_DATA_DIR: &str = "./tablio-data";
pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Host process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub data_dir: PathBuf,
    pub addr: SocketAddr,
    pub debounce: Duration,
    pub bridge_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            addr: SocketAddr::from(([127, 0, 0, 1], 4840)),
            debounce: DEFAULT_QUIET_PERIOD,
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
        }
    }
}

impl HostConfig {
    /// Reads `TABLIO_*` variables, loading `.env` first when present.
    pub fn from_env() -> CoreResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = var("TABLIO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let addr = match var("TABLIO_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|error| {
                CoreError::InvalidInput(format!("TABLIO_ADDR '{raw}': {error}"))
            })?,
            None => defaults.addr,
        };
        let debounce = millis(var("TABLIO_DEBOUNCE_MS"), "TABLIO_DEBOUNCE_MS")?
            .unwrap_or(defaults.debounce);
        let bridge_timeout = millis(var("TABLIO_BRIDGE_TIMEOUT_MS"), "TABLIO_BRIDGE_TIMEOUT_MS")?
            .unwrap_or(defaults.bridge_timeout);

        Ok(Self {
            data_dir,
            addr,
            debounce,
            bridge_timeout,
        })
    }
}

fn millis(raw: Option<String>, key: &str) -> CoreResult<Option<Duration>> {
    raw.map(|raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|error| CoreError::InvalidInput(format!("{key} '{raw}': {error}")))
    })
    .transpose()
}
