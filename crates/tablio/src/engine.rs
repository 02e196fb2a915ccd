use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;

use crate::browser::SharedTabApi;
use crate::ephemeral::{is_protected_by_flag, EphemeralTabs};
use crate::error::CoreResult;
use crate::settings::SettingsStore;
use crate::tab::{TabId, TabSnapshot, WindowSnapshot};
use crate::tidy::{check_window, plan_tidy, Partition, SkipReason, TidyPhase, TidyPlan};
use crate::title_tracker::TitleTracker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TidyReport {
    Skipped { reason: SkipReason },
    Applied(AppliedPass),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPass {
    pub window_id: u64,
    pub start_index: usize,
    pub moved: usize,
    pub renamed: usize,
    pub rename_failures: usize,
    pub move_failed: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    titles: TitleTracker,
    ephemeral: EphemeralTabs,
}

/// Owns the per-tab memory (original titles, sticky preview tabs) and runs
/// tidy passes against the browser.
///
/// Passes are serialized: a pass that starts while another is applying
/// waits for it and then takes a fresh snapshot.
pub struct TidyEngine {
    tabs: SharedTabApi,
    settings: SettingsStore,
    state: Mutex<EngineState>,
    phase: Mutex<TidyPhase>,
    pass: tokio::sync::Mutex<()>,
}

impl TidyEngine {
    pub fn new(tabs: SharedTabApi, settings: SettingsStore, grace: Duration) -> Self {
        Self {
            tabs,
            settings,
            state: Mutex::new(EngineState {
                titles: TitleTracker::new(),
                ephemeral: EphemeralTabs::new(grace),
            }),
            phase: Mutex::new(TidyPhase::Idle),
            pass: tokio::sync::Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn tabs(&self) -> &SharedTabApi {
        &self.tabs
    }

    pub fn phase(&self) -> TidyPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, phase: TidyPhase) {
        tracing::trace!(?phase, "tidy phase");
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// The last focused window if a pass may run in it.
    pub async fn eligible_window(&self) -> CoreResult<Result<WindowSnapshot, SkipReason>> {
        let Some(window) = self.tabs.last_focused_window().await? else {
            return Ok(Err(SkipReason::NoWindow));
        };
        Ok(check_window(&window).map(|()| window))
    }

    /// Runs one full tidy pass over the last focused window.
    pub async fn tidy(&self) -> CoreResult<TidyReport> {
        let _serialized = self.pass.lock().await;
        let report = self.run_pass().await;
        self.enter(TidyPhase::Idle);
        let report = report?;
        match &report {
            TidyReport::Skipped { reason } => tracing::debug!(?reason, "tidy skipped"),
            TidyReport::Applied(pass) => tracing::info!(
                window_id = pass.window_id,
                moved = pass.moved,
                renamed = pass.renamed,
                rename_failures = pass.rename_failures,
                "tidy applied"
            ),
        }
        Ok(report)
    }

    async fn run_pass(&self) -> CoreResult<TidyReport> {
        self.enter(TidyPhase::Snapshotting);
        let window = match self.eligible_window().await? {
            Ok(window) => window,
            Err(reason) => return Ok(TidyReport::Skipped { reason }),
        };
        let config = self.settings.load().await;
        let snapshot = self.tabs.query_tabs(window.id).await?;

        self.enter(TidyPhase::Partitioning);
        let partition = Partition::new(snapshot, &mut self.state().ephemeral);
        tracing::debug!(
            pinned = partition.pinned.len(),
            protected = partition.protected.len(),
            ephemeral = partition.ephemeral.len(),
            regular = partition.regular.len(),
            "partitioned window"
        );

        self.enter(TidyPhase::Planning);
        let Some(plan) = plan_tidy(&partition, &config, &mut self.state().titles) else {
            return Ok(TidyReport::Skipped {
                reason: SkipReason::NoRegularTabs,
            });
        };

        self.enter(TidyPhase::Applying);
        Ok(TidyReport::Applied(self.apply(window.id, &plan).await))
    }

    async fn apply(&self, window_id: u64, plan: &TidyPlan) -> AppliedPass {
        let renames = plan.renames().map(|planned| async move {
            let result = self
                .tabs
                .set_title(planned.tab_id, &planned.target_title)
                .await;
            if let Err(error) = &result {
                tracing::debug!(tab_id = planned.tab_id, "could not rename tab: {error}");
            }
            result.is_ok()
        });
        let outcomes = join_all(renames).await;
        let renamed = outcomes.iter().filter(|ok| **ok).count();

        let order = plan.order();
        let move_failed = match self.tabs.move_tabs(&order, plan.start_index).await {
            Ok(()) => false,
            Err(error) => {
                tracing::warn!("failed to move tabs in window {window_id}: {error}");
                true
            }
        };

        AppliedPass {
            window_id,
            start_index: plan.start_index,
            moved: order.len(),
            renamed,
            rename_failures: outcomes.len() - renamed,
            move_failed,
        }
    }

    /// Whether a tab may trigger auto-tidy: previews and flag-protected tabs
    /// never do. Marks new previews as a side effect.
    pub fn is_movable(&self, tab: &TabSnapshot) -> bool {
        if is_protected_by_flag(tab) {
            return false;
        }
        !self.state().ephemeral.is_ephemeral(tab)
    }

    pub fn on_title_changed(&self, tab_id: TabId, title: &str) {
        self.state().titles.observe_title(tab_id, title);
    }

    pub fn on_tab_removed(&self, tab_id: TabId) {
        let mut state = self.state();
        state.titles.forget(tab_id);
        state.ephemeral.forget(tab_id);
    }

    /// Releases a preview tab that was attached to a normal window.
    pub fn promote(&self, tab: &TabSnapshot) -> bool {
        let promoted = self.state().ephemeral.promote(tab);
        if promoted {
            tracing::debug!(tab_id = tab.id, "tab promoted from preview");
        }
        promoted
    }

    pub fn clear_ephemeral(&self) -> usize {
        let cleared = self.state().ephemeral.clear();
        tracing::info!("cleared {cleared} ephemeral tab(s)");
        cleared
    }

    pub fn ephemeral_count(&self) -> usize {
        self.state().ephemeral.len()
    }

    pub fn is_marked_ephemeral(&self, tab_id: TabId) -> bool {
        self.state().ephemeral.contains(tab_id)
    }

    pub fn original_title(&self, tab_id: TabId) -> Option<String> {
        self.state().titles.get(tab_id).map(str::to_string)
    }

    pub fn grace_period(&self) -> Duration {
        self.state().ephemeral.grace()
    }

    pub fn set_grace_period(&self, grace: Duration) {
        self.state().ephemeral.set_grace(grace);
    }
}
