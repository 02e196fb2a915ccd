use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use crate::tab::{TabId, TabSnapshot};

/// Remembers the undecorated title of every tab the engine has seen, so a
/// second pass composes from "GitHub" rather than from "🔴 GitHub".
#[derive(Debug, Default)]
pub struct TitleTracker {
    originals: HashMap<TabId, String>,
}

impl TitleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the title a tidy pass should decorate.
    ///
    /// The first observation is stored verbatim. Afterwards an undecorated
    /// current title means the page retitled itself and replaces the record.
    pub fn original_title(&mut self, tab: &TabSnapshot) -> String {
        match self.originals.get(&tab.id) {
            Some(stored) if looks_decorated(&tab.title) => stored.clone(),
            _ => {
                self.originals.insert(tab.id, tab.title.clone());
                tab.title.clone()
            }
        }
    }

    /// Title-change notification from the browser.
    pub fn observe_title(&mut self, id: TabId, title: &str) {
        if !looks_decorated(title) {
            self.originals.insert(id, title.to_string());
        }
    }

    pub fn forget(&mut self, id: TabId) {
        self.originals.remove(&id);
    }

    pub fn get(&self, id: TabId) -> Option<&str> {
        self.originals.get(&id).map(String::as_str)
    }
}

/// True when the title opens with a run of emoji followed by whitespace,
/// the shape the composer produces.
pub fn looks_decorated(title: &str) -> bool {
    let Some(end) = title.find(char::is_whitespace) else {
        return false;
    };
    let marker = &title[..end];
    !marker.is_empty() && marker.graphemes(true).all(|g| emojis::get(g).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: TabId, title: &str) -> TabSnapshot {
        TabSnapshot {
            id,
            title: title.to_string(),
            ..TabSnapshot::default()
        }
    }

    #[test]
    fn detects_decorated_titles() {
        assert!(looks_decorated("🔴 GitHub"));
        assert!(looks_decorated("💼 🔵 GH"));
        assert!(looks_decorated("⚙️ Settings"));
        assert!(looks_decorated("🔴🟢 Two markers"));
        assert!(!looks_decorated("GitHub"));
        assert!(!looks_decorated("🔴GitHub"));
        assert!(!looks_decorated("🔴"));
        assert!(!looks_decorated(" leading space"));
        assert!(!looks_decorated("2024 report"));
        assert!(!looks_decorated(""));
    }

    #[test]
    fn first_sight_stores_verbatim() {
        let mut tracker = TitleTracker::new();
        assert_eq!(tracker.original_title(&tab(1, "🔴 Already")), "🔴 Already");
        assert_eq!(tracker.get(1), Some("🔴 Already"));
    }

    #[test]
    fn decorated_title_returns_stored_original() {
        let mut tracker = TitleTracker::new();
        tracker.original_title(&tab(1, "GitHub"));
        assert_eq!(tracker.original_title(&tab(1, "🔴 GitHub")), "GitHub");
        assert_eq!(tracker.original_title(&tab(1, "🔴 🔴 GitHub")), "GitHub");
    }

    #[test]
    fn plain_title_change_refreshes_original() {
        let mut tracker = TitleTracker::new();
        tracker.original_title(&tab(1, "Inbox"));
        assert_eq!(tracker.original_title(&tab(1, "Inbox (3)")), "Inbox (3)");
        assert_eq!(tracker.get(1), Some("Inbox (3)"));
    }

    #[test]
    fn observe_title_ignores_decorated_updates() {
        let mut tracker = TitleTracker::new();
        tracker.observe_title(4, "Docs");
        tracker.observe_title(4, "📖 Docs");
        assert_eq!(tracker.get(4), Some("Docs"));
        tracker.observe_title(4, "Docs v2");
        assert_eq!(tracker.get(4), Some("Docs v2"));
    }

    #[test]
    fn forget_drops_the_entry() {
        let mut tracker = TitleTracker::new();
        tracker.original_title(&tab(9, "Closing"));
        tracker.forget(9);
        assert_eq!(tracker.get(9), None);
        assert_eq!(tracker.original_title(&tab(9, "🔵 Reused id")), "🔵 Reused id");
    }
}
