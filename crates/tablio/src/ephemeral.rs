//! Detection of transient preview tabs (Zen "Glance" and similar overlays).
//!
//! A preview tab must never be renamed or moved: it appears and disappears
//! quickly and any change would flash in front of the user. Detection is a
//! fixed list of independent heuristics evaluated in order; the first hit
//! marks the tab sticky so it stays classified while it loads.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::tab::{TabId, TabSnapshot, TabStatus};

const EPHEMERAL_CONTAINER_MARKERS: &[&str] = &["zen-glance", "zen-sidebar"];
const SIDEBAR_CONTAINER_MARKER: &str = "zen-sidebar";
const EPHEMERAL_URL_PREFIXES: &[&str] = &["about:blank", "zen://", "chrome://"];
const PLACEHOLDER_TITLES: &[&str] = &["New Tab"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EphemeralReason {
    Sticky,
    PlatformFlag,
    Hidden,
    Container,
    InternalUrl,
    LoadingUntitled,
}

type Heuristic = (EphemeralReason, fn(&TabSnapshot) -> bool);

const HEURISTICS: &[Heuristic] = &[
    (EphemeralReason::PlatformFlag, has_platform_flag),
    (EphemeralReason::Hidden, is_hidden),
    (EphemeralReason::Container, in_ephemeral_container),
    (EphemeralReason::InternalUrl, has_internal_url),
    (EphemeralReason::LoadingUntitled, is_loading_untitled),
];

pub fn has_platform_flag(tab: &TabSnapshot) -> bool {
    tab.skip_tab_groups || tab.is_in_zen_sidebar
}

pub fn is_hidden(tab: &TabSnapshot) -> bool {
    tab.hidden
}

pub fn in_ephemeral_container(tab: &TabSnapshot) -> bool {
    tab.cookie_store_id.as_deref().is_some_and(|store| {
        EPHEMERAL_CONTAINER_MARKERS
            .iter()
            .any(|marker| store.contains(marker))
    })
}

pub fn has_internal_url(tab: &TabSnapshot) -> bool {
    EPHEMERAL_URL_PREFIXES
        .iter()
        .any(|prefix| tab.url.starts_with(prefix))
}

pub fn is_loading_untitled(tab: &TabSnapshot) -> bool {
    tab.status == TabStatus::Loading
        && (tab.title.is_empty() || PLACEHOLDER_TITLES.contains(&tab.title.as_str()))
}

/// Sidebar / skip-grouping tabs are pinned in place whether or not they
/// are previews.
pub fn is_protected_by_flag(tab: &TabSnapshot) -> bool {
    has_platform_flag(tab)
        || tab
            .cookie_store_id
            .as_deref()
            .is_some_and(|store| store.contains(SIDEBAR_CONTAINER_MARKER))
}

/// True when a tab attached to a new window carries no preview markers.
pub fn looks_promoted(tab: &TabSnapshot) -> bool {
    !tab.pinned && !tab.skip_tab_groups && !tab.is_in_zen_sidebar && !tab.hidden
}

#[derive(Debug, Default)]
pub struct EphemeralTabs {
    marked: HashMap<TabId, Instant>,
    grace: Duration,
}

impl EphemeralTabs {
    pub fn new(grace: Duration) -> Self {
        Self {
            marked: HashMap::new(),
            grace,
        }
    }

    pub fn classify(&mut self, tab: &TabSnapshot) -> Option<EphemeralReason> {
        if self.marked.contains_key(&tab.id) {
            return Some(EphemeralReason::Sticky);
        }
        let (reason, _) = HEURISTICS.iter().find(|(_, matches)| matches(tab))?;
        self.marked.insert(tab.id, Instant::now());
        Some(*reason)
    }

    pub fn is_ephemeral(&mut self, tab: &TabSnapshot) -> bool {
        self.classify(tab).is_some()
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.marked.contains_key(&id)
    }

    /// Releases a sticky tab that was attached to a window without preview
    /// markers, once it has been marked for at least the grace period.
    /// Returns true when the tab was released.
    pub fn promote(&mut self, tab: &TabSnapshot) -> bool {
        if !looks_promoted(tab) {
            return false;
        }
        match self.marked.get(&tab.id) {
            Some(marked_at) if marked_at.elapsed() >= self.grace => {
                self.marked.remove(&tab.id);
                true
            }
            _ => false,
        }
    }

    pub fn forget(&mut self, id: TabId) {
        self.marked.remove(&id);
    }

    pub fn clear(&mut self) -> usize {
        let count = self.marked.len();
        self.marked.clear();
        count
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn set_grace(&mut self, grace: Duration) {
        self.grace = grace;
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}
