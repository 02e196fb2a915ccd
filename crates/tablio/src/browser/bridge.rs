use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Notify, RwLock};

use crate::browser::BrowserEvent;
use crate::error::{CoreError, CoreResult};

const NOT_CONNECTED: &str = "browser extension not connected";

/// Manages the WebSocket connection to the browser extension: matches
/// command responses to requests and forwards pushed tab events.
pub struct BrowserBridge {
    connection: RwLock<ConnectionState>,
    pending: Mutex<HashMap<String, PendingRequest>>,
    events: mpsc::UnboundedSender<BrowserEvent>,
    timeout: Duration,
}

struct ConnectionState {
    sender: Option<mpsc::UnboundedSender<String>>,
    generation: u64,
}

struct PendingRequest {
    result: Option<CoreResult<Value>>,
    notify: Arc<Notify>,
}

impl BrowserBridge {
    /// Creates a bridge and the receiving end of its event stream.
    pub fn new(timeout: Duration) -> (Self, mpsc::UnboundedReceiver<BrowserEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let bridge = Self {
            connection: RwLock::new(ConnectionState {
                sender: None,
                generation: 0,
            }),
            pending: Mutex::new(HashMap::new()),
            events,
            timeout,
        };
        (bridge, receiver)
    }

    /// Sends a command to the extension and waits for its response.
    pub async fn send_command(&self, method: &str, params: Value) -> CoreResult<Value> {
        let id = uuid::Uuid::new_v4().to_string();
        let message = serde_json::json!({
            "id": id,
            "method": method,
            "params": params,
        });
        let text = serde_json::to_string(&message)
            .map_err(|e| CoreError::Internal(format!("failed to serialize command: {e}")))?;

        let notify = Arc::new(Notify::new());
        self.pending.lock().await.insert(
            id.clone(),
            PendingRequest {
                result: None,
                notify: notify.clone(),
            },
        );

        let sent = {
            let conn = self.connection.read().await;
            conn.sender
                .as_ref()
                .is_some_and(|sender| sender.send(text).is_ok())
        };
        if !sent {
            self.pending.lock().await.remove(&id);
            return Err(CoreError::Browser(NOT_CONNECTED.to_string()));
        }

        let waited = tokio::time::timeout(self.timeout, notify.notified()).await;

        let Some(request) = self.pending.lock().await.remove(&id) else {
            return Err(CoreError::Browser(format!("command '{method}' was cancelled")));
        };
        if waited.is_err() {
            return Err(CoreError::Browser(format!("command '{method}' timed out")));
        }
        request
            .result
            .unwrap_or_else(|| Err(CoreError::Browser(format!("command '{method}' got no response"))))
    }

    /// Called when the extension connects. Returns the generation for this
    /// connection; requests in flight on the previous one are failed.
    pub async fn on_connect(&self, sender: mpsc::UnboundedSender<String>) -> u64 {
        self.fail_pending().await;

        let mut conn = self.connection.write().await;
        conn.generation += 1;
        conn.sender = Some(sender);
        let generation = conn.generation;
        tracing::info!("browser extension connected (generation {generation})");
        generation
    }

    /// Called when the extension disconnects. A stale generation is ignored
    /// so a late disconnect cannot clobber a newer connection.
    pub async fn on_disconnect(&self, generation: u64) {
        {
            let mut conn = self.connection.write().await;
            if conn.generation != generation {
                return;
            }
            conn.sender = None;
        }
        tracing::info!("browser extension disconnected (generation {generation})");
        self.fail_pending().await;
    }

    /// Handles one text frame from the extension: either a response to a
    /// pending command or a pushed tab event.
    pub async fn on_message(&self, text: &str) {
        let msg: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("invalid message from browser extension: {e}");
                return;
            }
        };

        if msg.get("event").is_some() {
            match serde_json::from_value::<BrowserEvent>(msg) {
                Ok(event) => {
                    if self.events.send(event).is_err() {
                        tracing::debug!("dropping browser event: no listener");
                    }
                }
                Err(e) => tracing::warn!("unrecognized browser event: {e}"),
            }
            return;
        }

        let Some(id) = msg.get("id").and_then(Value::as_str) else {
            tracing::warn!("browser extension message missing 'id' field");
            return;
        };

        let result = match msg.get("error") {
            Some(error) => Err(CoreError::Browser(
                error.as_str().unwrap_or("unknown browser error").to_string(),
            )),
            None => Ok(msg.get("result").cloned().unwrap_or(Value::Null)),
        };

        let mut pending = self.pending.lock().await;
        match pending.get_mut(id) {
            Some(request) => {
                request.result = Some(result);
                request.notify.notify_one();
            }
            None => tracing::warn!("received response for unknown request id: {id}"),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.sender.is_some()
    }

    async fn fail_pending(&self) {
        let mut pending = self.pending.lock().await;
        for (_, request) in pending.drain() {
            request.notify.notify_one();
        }
    }
}
