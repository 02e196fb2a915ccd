use crate::settings::{Group, Pairing};
use crate::tab::TabSnapshot;

const URL_WEIGHT: usize = 2;
const TITLE_WEIGHT: usize = 1;

/// Outcome of matching one tab against the configured rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub pairing: Option<&'a Pairing>,
    /// Group the tab belongs to. May name a group missing from the list
    /// when a pairing references it; such tabs rank as ungrouped.
    pub group_name: Option<&'a str>,
    pub group: Option<&'a Group>,
}

/// First pairing whose url pattern occurs in `url`. List order decides
/// between overlapping patterns.
pub fn find_pairing<'a>(pairings: &'a [Pairing], url: &str) -> Option<&'a Pairing> {
    pairings
        .iter()
        .find(|pairing| !pairing.url.is_empty() && url.contains(pairing.url.as_str()))
}

/// Keyword relevance of a tab: URL hits count double, title hits once.
pub fn keyword_score(url: &str, title: &str, keywords: &[String]) -> usize {
    let url = url.to_lowercase();
    let title = title.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .map(|keyword| {
            URL_WEIGHT * url.matches(keyword.as_str()).count()
                + TITLE_WEIGHT * title.matches(keyword.as_str()).count()
        })
        .sum()
}

/// Group with the strictly highest keyword score; the earliest group wins ties.
pub fn best_keyword_group<'a>(groups: &'a [Group], tab: &TabSnapshot) -> Option<&'a Group> {
    let mut best: Option<(&Group, usize)> = None;
    for group in groups.iter().filter(|group| !group.keywords.is_empty()) {
        let score = keyword_score(&tab.url, &tab.title, &group.keywords);
        if score > best.map_or(0, |(_, top)| top) {
            best = Some((group, score));
        }
    }
    best.map(|(group, _)| group)
}

pub fn resolve<'a>(tab: &TabSnapshot, pairings: &'a [Pairing], groups: &'a [Group]) -> Resolution<'a> {
    let pairing = find_pairing(pairings, &tab.url);
    if let Some(name) = pairing.and_then(Pairing::group_name) {
        return Resolution {
            pairing,
            group_name: Some(name),
            group: groups.iter().find(|group| group.name == name),
        };
    }

    let group = best_keyword_group(groups, tab);
    Resolution {
        pairing,
        group_name: group.map(|group| group.name.as_str()),
        group,
    }
}
