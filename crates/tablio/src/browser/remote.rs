use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::browser::{BrowserBridge, TabApi};
use crate::error::{CoreError, CoreResult};
use crate::tab::{TabId, TabSnapshot, WindowId, WindowSnapshot};

/// [`TabApi`] backed by commands sent over the extension bridge.
#[derive(Clone)]
pub struct RemoteTabs {
    bridge: Arc<BrowserBridge>,
}

impl RemoteTabs {
    pub fn new(bridge: Arc<BrowserBridge>) -> Self {
        Self { bridge }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> CoreResult<T> {
        let value = self.bridge.send_command(method, params).await?;
        serde_json::from_value(value).map_err(|error| {
            CoreError::Browser(format!("unexpected '{method}' response: {error}"))
        })
    }
}

#[async_trait]
impl TabApi for RemoteTabs {
    async fn last_focused_window(&self) -> CoreResult<Option<WindowSnapshot>> {
        self.call("getLastFocusedWindow", json!({ "populate": true }))
            .await
    }

    async fn query_tabs(&self, window_id: WindowId) -> CoreResult<Vec<TabSnapshot>> {
        self.call("queryTabs", json!({ "windowId": window_id })).await
    }

    async fn get_tab(&self, tab_id: TabId) -> CoreResult<TabSnapshot> {
        let tab: Option<TabSnapshot> = self.call("getTab", json!({ "tabId": tab_id })).await?;
        tab.ok_or_else(|| CoreError::NotFound(format!("tab {tab_id}")))
    }

    async fn move_tabs(&self, tab_ids: &[TabId], index: usize) -> CoreResult<()> {
        self.bridge
            .send_command("moveTabs", json!({ "tabIds": tab_ids, "index": index }))
            .await
            .map(|_| ())
    }

    async fn set_title(&self, tab_id: TabId, title: &str) -> CoreResult<()> {
        self.bridge
            .send_command("setTabTitle", json!({ "tabId": tab_id, "title": title }))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Connects a scripted extension that answers every command with
    /// `reply(method, params)` and records what it saw.
    async fn scripted(
        reply: impl Fn(&str, &Value) -> Value + Send + 'static,
    ) -> (RemoteTabs, mpsc::UnboundedReceiver<(String, Value)>) {
        let (bridge, _events) = BrowserBridge::new(Duration::from_secs(5));
        let bridge = Arc::new(bridge);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        bridge.on_connect(tx).await;

        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        let responder = bridge.clone();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let cmd: Value = serde_json::from_str(&msg).expect("json");
                let method = cmd["method"].as_str().unwrap_or_default().to_string();
                let result = reply(&method, &cmd["params"]);
                let _ = seen_tx.send((method, cmd["params"].clone()));
                let response = json!({ "id": cmd["id"], "result": result });
                responder.on_message(&response.to_string()).await;
            }
        });
        (RemoteTabs::new(bridge), seen_rx)
    }

    #[tokio::test]
    async fn decodes_window_and_tabs() {
        let (tabs, _seen) = scripted(|method, _| match method {
            "getLastFocusedWindow" => json!({
                "id": 3,
                "type": "normal",
                "tabs": [{ "id": 1, "index": 0, "title": "A" }, { "id": 2, "index": 1, "pinned": true }]
            }),
            "queryTabs" => json!([{ "id": 1, "windowId": 3, "url": "https://a.com" }]),
            _ => Value::Null,
        })
        .await;

        let window = tabs
            .last_focused_window()
            .await
            .expect("window")
            .expect("some window");
        assert_eq!(window.id, 3);
        assert_eq!(window.tabs.len(), 2);
        assert!(window.tabs[1].pinned);

        let listed = tabs.query_tabs(3).await.expect("tabs");
        assert_eq!(listed[0].url, "https://a.com");
    }

    #[tokio::test]
    async fn null_tab_is_not_found() {
        let (tabs, _seen) = scripted(|_, _| Value::Null).await;
        assert!(matches!(tabs.get_tab(8).await, Err(CoreError::NotFound(_))));
        assert_eq!(tabs.last_focused_window().await.expect("call"), None);
    }

    #[tokio::test]
    async fn malformed_result_is_a_browser_error() {
        let (tabs, _seen) = scripted(|_, _| json!("nope")).await;
        assert!(matches!(tabs.query_tabs(1).await, Err(CoreError::Browser(_))));
    }

    #[tokio::test]
    async fn mutations_send_expected_params() {
        let (tabs, mut seen) = scripted(|_, _| Value::Null).await;
        tabs.move_tabs(&[5, 4], 2).await.expect("move");
        tabs.set_title(5, "💼 GH").await.expect("title");

        let (method, params) = seen.recv().await.expect("move seen");
        assert_eq!(method, "moveTabs");
        assert_eq!(params, json!({ "tabIds": [5, 4], "index": 2 }));
        let (method, params) = seen.recv().await.expect("title seen");
        assert_eq!(method, "setTabTitle");
        assert_eq!(params, json!({ "tabId": 5, "title": "💼 GH" }));
    }
}
