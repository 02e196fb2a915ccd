//! Partitioning and planning for a single tidy pass.
//!
//! Everything here is synchronous and works on one snapshot; the engine
//! owns the browser round-trips around it.

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::compose::compose_title;
use crate::ephemeral::{is_protected_by_flag, EphemeralReason, EphemeralTabs};
use crate::matching::resolve;
use crate::settings::TidyConfig;
use crate::tab::{TabId, TabSnapshot, WindowKind, WindowSnapshot};
use crate::title_tracker::TitleTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TidyPhase {
    Idle,
    Snapshotting,
    Partitioning,
    Planning,
    Applying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoWindow,
    NotNormalWindow,
    OverlayWindow,
    NoRegularTabs,
}

/// Rejects windows a pass must never touch: non-normal windows and the
/// single unpinned tab windows preview overlays open.
pub fn check_window(window: &WindowSnapshot) -> Result<(), SkipReason> {
    if window.kind != WindowKind::Normal {
        return Err(SkipReason::NotNormalWindow);
    }
    if window.tabs.len() <= 1 && !window.tabs.iter().any(|tab| tab.pinned) {
        return Err(SkipReason::OverlayWindow);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabClass {
    Pinned,
    Protected,
    Ephemeral(EphemeralReason),
    Regular,
}

/// Classifies in precedence order; a tab lands in the first class it fits.
pub fn classify_tab(tab: &TabSnapshot, ephemeral: &mut EphemeralTabs) -> TabClass {
    if tab.pinned {
        TabClass::Pinned
    } else if is_protected_by_flag(tab) {
        TabClass::Protected
    } else if let Some(reason) = ephemeral.classify(tab) {
        TabClass::Ephemeral(reason)
    } else {
        TabClass::Regular
    }
}

#[derive(Debug, Default)]
pub struct Partition {
    pub pinned: Vec<TabSnapshot>,
    pub protected: Vec<TabSnapshot>,
    pub ephemeral: Vec<TabSnapshot>,
    pub regular: Vec<TabSnapshot>,
}

impl Partition {
    pub fn new(tabs: Vec<TabSnapshot>, ephemeral: &mut EphemeralTabs) -> Self {
        let mut partition = Self::default();
        for tab in tabs {
            match classify_tab(&tab, ephemeral) {
                TabClass::Pinned => partition.pinned.push(tab),
                TabClass::Protected => partition.protected.push(tab),
                TabClass::Ephemeral(reason) => {
                    tracing::debug!(tab_id = tab.id, ?reason, "leaving ephemeral tab in place");
                    partition.ephemeral.push(tab);
                }
                TabClass::Regular => partition.regular.push(tab),
            }
        }
        partition
    }

    /// First index regular tabs may occupy: just past the last immovable tab.
    pub fn safe_start_index(&self) -> usize {
        self.pinned
            .iter()
            .chain(&self.protected)
            .chain(&self.ephemeral)
            .map(|tab| tab.index + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTab {
    pub tab_id: TabId,
    pub target_title: String,
    pub should_rename: bool,
    pub group_rank: usize,
    pub sort_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TidyPlan {
    /// Regular tabs in their target order.
    pub tabs: Vec<PlannedTab>,
    pub start_index: usize,
}

impl TidyPlan {
    pub fn order(&self) -> Vec<TabId> {
        self.tabs.iter().map(|planned| planned.tab_id).collect()
    }

    pub fn renames(&self) -> impl Iterator<Item = &PlannedTab> {
        self.tabs.iter().filter(|planned| planned.should_rename)
    }
}

pub fn plan_tab(tab: &TabSnapshot, config: &TidyConfig, titles: &mut TitleTracker) -> PlannedTab {
    let resolution = resolve(tab, &config.pairings, &config.groups);
    let original_title = titles.original_title(tab);
    let composed = compose_title(resolution.pairing, resolution.group, &original_title);
    PlannedTab {
        tab_id: tab.id,
        sort_key: sort_key(&composed.title),
        target_title: composed.title,
        should_rename: composed.should_rename,
        group_rank: config.group_rank(resolution.group_name),
    }
}

/// Case- and accent-insensitive ordering key: "Éclair" sorts among the e's.
/// Symbols and emoji still order by code point, after letters.
pub fn sort_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Plans the regular tabs of a partition, or `None` when there are none.
pub fn plan_tidy(
    partition: &Partition,
    config: &TidyConfig,
    titles: &mut TitleTracker,
) -> Option<TidyPlan> {
    if partition.regular.is_empty() {
        return None;
    }
    let mut tabs: Vec<PlannedTab> = partition
        .regular
        .iter()
        .map(|tab| plan_tab(tab, config, titles))
        .collect();
    // Stable: equal keys keep snapshot order.
    tabs.sort_by(|a, b| {
        a.group_rank
            .cmp(&b.group_rank)
            .then_with(|| a.sort_key.cmp(&b.sort_key))
    });
    Some(TidyPlan {
        tabs,
        start_index: partition.safe_start_index(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Group, Pairing};
    use crate::tab::TabStatus;

    fn tab(id: TabId, index: usize, url: &str, title: &str) -> TabSnapshot {
        TabSnapshot {
            id,
            index,
            url: url.to_string(),
            title: title.to_string(),
            status: TabStatus::Complete,
            ..TabSnapshot::default()
        }
    }

    fn window(kind: WindowKind, tabs: Vec<TabSnapshot>) -> WindowSnapshot {
        WindowSnapshot { id: 1, kind, tabs }
    }

    #[test]
    fn window_checks() {
        let two = vec![tab(1, 0, "https://a", "A"), tab(2, 1, "https://b", "B")];
        assert_eq!(check_window(&window(WindowKind::Normal, two.clone())), Ok(()));
        assert_eq!(
            check_window(&window(WindowKind::Popup, two)),
            Err(SkipReason::NotNormalWindow)
        );
        assert_eq!(
            check_window(&window(WindowKind::Normal, vec![tab(1, 0, "https://a", "A")])),
            Err(SkipReason::OverlayWindow)
        );
        let pinned = TabSnapshot {
            pinned: true,
            ..tab(1, 0, "https://a", "A")
        };
        assert_eq!(check_window(&window(WindowKind::Normal, vec![pinned])), Ok(()));
        assert_eq!(
            check_window(&window(WindowKind::Normal, Vec::new())),
            Err(SkipReason::OverlayWindow)
        );
    }

    #[test]
    fn partition_follows_precedence() {
        let mut ephemeral = EphemeralTabs::default();
        let pinned_and_hidden = TabSnapshot {
            pinned: true,
            hidden: true,
            ..tab(1, 0, "https://a", "A")
        };
        let sidebar = TabSnapshot {
            is_in_zen_sidebar: true,
            ..tab(2, 1, "https://b", "B")
        };
        let glance = TabSnapshot {
            hidden: true,
            ..tab(3, 2, "https://c", "C")
        };
        let plain = tab(4, 3, "https://d", "D");

        let partition = Partition::new(
            vec![pinned_and_hidden, sidebar, glance, plain],
            &mut ephemeral,
        );
        let ids = |tabs: &[TabSnapshot]| tabs.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(&partition.pinned), vec![1]);
        assert_eq!(ids(&partition.protected), vec![2]);
        assert_eq!(ids(&partition.ephemeral), vec![3]);
        assert_eq!(ids(&partition.regular), vec![4]);
        // Pinned and flag-protected tabs are never evaluated as previews.
        assert!(!ephemeral.contains(1));
        assert!(!ephemeral.contains(2));
        assert!(ephemeral.contains(3));
    }

    #[test]
    fn safe_start_index_skips_past_last_immovable_tab() {
        let mut ephemeral = EphemeralTabs::default();
        let partition = Partition::new(
            vec![
                tab(1, 0, "https://a", "A"),
                TabSnapshot {
                    pinned: true,
                    ..tab(2, 1, "https://b", "B")
                },
                tab(3, 2, "https://c", "C"),
                TabSnapshot {
                    hidden: true,
                    ..tab(4, 3, "https://d", "D")
                },
                tab(5, 4, "https://e", "E"),
            ],
            &mut ephemeral,
        );
        assert_eq!(partition.safe_start_index(), 4);

        let partition = Partition::new(vec![tab(6, 0, "https://f", "F")], &mut ephemeral);
        assert_eq!(partition.safe_start_index(), 0);
    }

    #[test]
    fn plan_orders_by_rank_then_title() {
        let config = TidyConfig {
            pairings: vec![
                Pairing {
                    url: "b.example".to_string(),
                    group: "B".to_string(),
                    ..Pairing::default()
                },
                Pairing {
                    url: "a.example".to_string(),
                    group: "A".to_string(),
                    ..Pairing::default()
                },
            ],
            groups: vec![Group::named("A"), Group::named("B")],
            auto_tidy_enabled: false,
        };
        let mut ephemeral = EphemeralTabs::default();
        let partition = Partition::new(
            vec![
                tab(1, 0, "https://loose.example", "zeta"),
                tab(2, 1, "https://b.example", "Same"),
                tab(3, 2, "https://a.example", "Same"),
                tab(4, 3, "https://loose.example", "Alpha"),
                tab(5, 4, "https://a.example", "apple"),
            ],
            &mut ephemeral,
        );
        let mut titles = TitleTracker::new();
        let plan = plan_tidy(&partition, &config, &mut titles).expect("plan");
        assert_eq!(plan.order(), vec![5, 3, 2, 4, 1]);
        assert_eq!(plan.tabs[0].group_rank, 0);
        assert_eq!(plan.tabs[4].group_rank, 2);
        assert_eq!(plan.renames().count(), 0);
    }

    #[test]
    fn equal_keys_keep_snapshot_order() {
        let mut ephemeral = EphemeralTabs::default();
        let partition = Partition::new(
            vec![
                tab(7, 0, "https://x", "Dup"),
                tab(3, 1, "https://y", "dup"),
                tab(5, 2, "https://z", "DUP"),
            ],
            &mut ephemeral,
        );
        let plan = plan_tidy(&partition, &TidyConfig::default(), &mut TitleTracker::new())
            .expect("plan");
        assert_eq!(plan.order(), vec![7, 3, 5]);
    }

    #[test]
    fn accented_titles_sort_with_their_base_letter() {
        assert_eq!(sort_key("Éclair"), "eclair");
        assert_eq!(sort_key("Ünïcode"), "unicode");

        let mut ephemeral = EphemeralTabs::default();
        let partition = Partition::new(
            vec![
                tab(1, 0, "https://z", "Zebra"),
                tab(2, 1, "https://e", "Éclair"),
                tab(3, 2, "https://a", "apple"),
                tab(4, 3, "https://f", "fig"),
            ],
            &mut ephemeral,
        );
        let plan = plan_tidy(&partition, &TidyConfig::default(), &mut TitleTracker::new())
            .expect("plan");
        assert_eq!(plan.order(), vec![3, 2, 4, 1]);
    }

    #[test]
    fn scenario_composes_marked_title() {
        let config = TidyConfig {
            pairings: vec![Pairing {
                url: "github.com".to_string(),
                name: "GH".to_string(),
                emoji: "🔵".to_string(),
                group: "Work".to_string(),
            }],
            groups: vec![Group {
                name: "Work".to_string(),
                category: Some("💼".to_string()),
                keywords: Vec::new(),
            }],
            auto_tidy_enabled: false,
        };
        let mut titles = TitleTracker::new();
        let planned = plan_tab(
            &tab(1, 0, "https://github.com/foo", "Foo · GitHub"),
            &config,
            &mut titles,
        );
        assert_eq!(planned.target_title, "💼 🔵 GH");
        assert!(planned.should_rename);
        assert_eq!(titles.get(1), Some("Foo · GitHub"));
    }

    #[test]
    fn replanning_a_renamed_tab_is_stable() {
        let config = TidyConfig {
            pairings: vec![Pairing {
                url: "mail".to_string(),
                emoji: "🔴".to_string(),
                ..Pairing::default()
            }],
            ..TidyConfig::default()
        };
        let mut titles = TitleTracker::new();
        let first = plan_tab(&tab(1, 0, "https://mail", "Inbox"), &config, &mut titles);
        assert_eq!(first.target_title, "🔴 Inbox");
        let second = plan_tab(&tab(1, 0, "https://mail", &first.target_title), &config, &mut titles);
        assert_eq!(second, first);
    }

    #[test]
    fn no_regular_tabs_yields_no_plan() {
        let mut ephemeral = EphemeralTabs::default();
        let partition = Partition::new(
            vec![TabSnapshot {
                pinned: true,
                ..tab(1, 0, "https://a", "A")
            }],
            &mut ephemeral,
        );
        assert!(plan_tidy(&partition, &TidyConfig::default(), &mut TitleTracker::new()).is_none());
    }
}
