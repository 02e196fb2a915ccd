use serde::{Deserialize, Serialize};

pub type TabId = u64;
pub type WindowId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    Unloaded,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Point-in-time view of a browser tab as reported by the extension.
///
/// Snapshots go stale after any mutation; the engine re-queries before
/// every pass instead of holding on to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabSnapshot {
    pub id: TabId,
    pub window_id: WindowId,
    pub index: usize,
    pub url: String,
    pub title: String,
    pub pinned: bool,
    pub hidden: bool,
    pub status: TabStatus,
    pub skip_tab_groups: bool,
    pub is_in_zen_sidebar: bool,
    pub cookie_store_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    #[default]
    Normal,
    Popup,
    Panel,
    Devtools,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowSnapshot {
    pub id: WindowId,
    #[serde(rename = "type")]
    pub kind: WindowKind,
    pub tabs: Vec<TabSnapshot>,
}

/// Fields the browser reports as changed in a tab update notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabChange {
    pub url: Option<String>,
    pub title: Option<String>,
    pub status: Option<TabStatus>,
}

impl TabChange {
    pub fn touches_url_or_title(&self) -> bool {
        self.url.is_some() || self.title.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_extension_payload() {
        let tab: TabSnapshot = serde_json::from_value(serde_json::json!({
            "id": 7,
            "index": 2,
            "url": "https://example.com",
            "title": "Example",
            "status": "complete",
            "cookieStoreId": "firefox-default"
        }))
        .expect("tab");
        assert_eq!(tab.id, 7);
        assert_eq!(tab.status, TabStatus::Complete);
        assert!(!tab.pinned);
        assert!(!tab.skip_tab_groups);
        assert_eq!(tab.cookie_store_id.as_deref(), Some("firefox-default"));
    }

    #[test]
    fn unknown_status_and_window_type_fall_back() {
        let window: WindowSnapshot = serde_json::from_value(serde_json::json!({
            "id": 1,
            "type": "app",
            "tabs": [{ "id": 3, "status": "frozen" }]
        }))
        .expect("window");
        assert_eq!(window.kind, WindowKind::Unknown);
        assert_eq!(window.tabs[0].status, TabStatus::Unknown);
    }

    #[test]
    fn change_without_url_or_title_does_not_qualify() {
        let change = TabChange {
            status: Some(TabStatus::Loading),
            ..TabChange::default()
        };
        assert!(!change.touches_url_or_title());
        let change = TabChange {
            title: Some("New".to_string()),
            ..TabChange::default()
        };
        assert!(change.touches_url_or_title());
    }
}
