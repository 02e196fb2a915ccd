use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::browser::BrowserEvent;
use crate::engine::TidyEngine;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Turns bursts of tab events into a single tidy pass once the window has
/// been quiet for a while.
pub struct AutoTidy {
    engine: Arc<TidyEngine>,
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AutoTidy {
    pub fn new(engine: Arc<TidyEngine>, quiet: Duration) -> Self {
        Self {
            engine,
            quiet,
            pending: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<TidyEngine> {
        &self.engine
    }

    /// Consumes browser events until the stream closes.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<BrowserEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        self.cancel();
        tracing::debug!("browser event stream closed");
    }

    pub async fn handle_event(&self, event: BrowserEvent) {
        match event {
            BrowserEvent::TabCreated { tab } => {
                if self.engine.is_movable(&tab) {
                    self.maybe_schedule().await;
                } else {
                    tracing::debug!(tab_id = tab.id, "auto-tidy skipped: protected tab created");
                }
            }
            BrowserEvent::TabUpdated {
                tab_id,
                change_info,
                tab,
            } => {
                if let Some(title) = change_info.title.as_deref() {
                    self.engine.on_title_changed(tab_id, title);
                }
                if !self.engine.is_movable(&tab) {
                    tracing::debug!(tab_id, "auto-tidy skipped: protected tab updated");
                    return;
                }
                if change_info.touches_url_or_title() {
                    self.maybe_schedule().await;
                }
            }
            BrowserEvent::TabRemoved { tab_id } => self.engine.on_tab_removed(tab_id),
            BrowserEvent::TabAttached { tab_id } => {
                let tab = match self.engine.tabs().get_tab(tab_id).await {
                    Ok(tab) => tab,
                    Err(error) => {
                        tracing::debug!(tab_id, "attached tab vanished: {error}");
                        return;
                    }
                };
                if self.engine.is_marked_ephemeral(tab_id) {
                    if !self.engine.promote(&tab) {
                        tracing::debug!(tab_id, "auto-tidy skipped: attached tab still a preview");
                        return;
                    }
                } else if !self.engine.is_movable(&tab) {
                    return;
                }
                self.maybe_schedule().await;
            }
        }
    }

    /// Schedules a pass if auto-tidy is on and the focused window is one a
    /// pass may touch. Returns whether a pass was scheduled.
    pub async fn maybe_schedule(&self) -> bool {
        if !self.engine.settings().load().await.auto_tidy_enabled {
            return false;
        }
        match self.engine.eligible_window().await {
            Ok(Ok(_)) => {
                self.schedule();
                true
            }
            Ok(Err(reason)) => {
                tracing::debug!(?reason, "auto-tidy skipped for window");
                false
            }
            Err(error) => {
                tracing::warn!("auto-tidy window check failed: {error}");
                false
            }
        }
    }

    /// (Re)starts the quiet-period timer, replacing any pending run.
    pub fn schedule(&self) {
        let engine = self.engine.clone();
        let quiet = self.quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // Detached so a later reschedule cannot abort a pass mid-apply.
            tokio::spawn(async move {
                if let Err(error) = engine.tidy().await {
                    tracing::warn!("auto-tidy failed: {error}");
                }
            });
        });
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
