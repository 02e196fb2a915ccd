pub mod server;

pub mod config;
pub mod error;

pub mod browser;
pub mod storage;
pub mod tab;

pub mod compose;
pub mod engine;
pub mod ephemeral;
pub mod matching;
pub mod scheduler;
pub mod settings;
pub mod tidy;
pub mod title_tracker;

pub use crate::config::HostConfig;
pub use crate::engine::{AppliedPass, TidyEngine, TidyReport};
pub use crate::error::{CoreError, CoreResult};
pub use crate::scheduler::AutoTidy;
pub use crate::settings::{Group, Pairing, SettingsStore, TidyConfig};
pub use crate::tab::{TabId, TabSnapshot, WindowId, WindowSnapshot};
