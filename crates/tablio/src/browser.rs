pub mod bridge;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CoreResult;
use crate::tab::{TabChange, TabId, TabSnapshot, WindowId, WindowSnapshot};

pub use bridge::BrowserBridge;
pub use remote::RemoteTabs;

/// Tab and window primitives the tidy engine needs from the browser.
///
/// Every call may suspend; tab state can change between any two calls.
#[async_trait]
pub trait TabApi: Send + Sync {
    /// Last focused window with its tabs populated, if any.
    async fn last_focused_window(&self) -> CoreResult<Option<WindowSnapshot>>;
    async fn query_tabs(&self, window_id: WindowId) -> CoreResult<Vec<TabSnapshot>>;
    async fn get_tab(&self, tab_id: TabId) -> CoreResult<TabSnapshot>;
    /// Moves the tabs, in the given order, to start at `index`.
    async fn move_tabs(&self, tab_ids: &[TabId], index: usize) -> CoreResult<()>;
    async fn set_title(&self, tab_id: TabId, title: &str) -> CoreResult<()>;
}

pub type SharedTabApi = Arc<dyn TabApi>;

/// Unsolicited notifications pushed by the extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BrowserEvent {
    TabCreated {
        tab: TabSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        change_info: TabChange,
        tab: TabSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    TabRemoved { tab_id: TabId },
    #[serde(rename_all = "camelCase")]
    TabAttached { tab_id: TabId },
}
