pub mod store;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

pub use store::SettingsStore;

/// URL-substring rule that renames and groups matching tabs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pairing {
    pub url: String,
    pub name: String,
    pub emoji: String,
    pub group: String,
}

impl Pairing {
    pub fn custom_name(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    pub fn color(&self) -> Option<&str> {
        non_blank(&self.emoji)
    }

    pub fn group_name(&self) -> Option<&str> {
        non_blank(&self.group)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub name: String,
    pub category: Option<String>,
    pub keywords: Vec<String>,
}

impl Group {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().and_then(non_blank)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TidyConfig {
    pub pairings: Vec<Pairing>,
    pub groups: Vec<Group>,
    pub auto_tidy_enabled: bool,
}

impl TidyConfig {
    /// Builds a config from whatever shape the settings page stored.
    ///
    /// Groups may be bare strings (legacy) or objects; entries that are
    /// neither, pairings without a url, and duplicate group names are dropped.
    pub fn from_value(value: &Value) -> Self {
        let pairings = value
            .get("pairings")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(pairing_from_value).collect())
            .unwrap_or_default();

        let mut groups: Vec<Group> = Vec::new();
        if let Some(items) = value.get("groups").and_then(Value::as_array) {
            for item in items {
                let Some(group) = group_from_value(item) else {
                    tracing::warn!("ignoring malformed group entry: {item}");
                    continue;
                };
                if groups.iter().any(|existing| existing.name == group.name) {
                    tracing::warn!("ignoring duplicate group {:?}", group.name);
                    continue;
                }
                groups.push(group);
            }
        }

        let auto_tidy_enabled = value
            .get("autoTidyEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self {
            pairings,
            groups,
            auto_tidy_enabled,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Position of a group in the list, or `groups.len()` for unknown names.
    pub fn group_rank(&self, name: Option<&str>) -> usize {
        name.and_then(|name| self.groups.iter().position(|group| group.name == name))
            .unwrap_or(self.groups.len())
    }

    /// Adds a group, or replaces the group called `current_name`.
    ///
    /// Renames cascade to every pairing that referenced the old name.
    pub fn upsert_group(&mut self, current_name: Option<&str>, group: Group) -> CoreResult<()> {
        let group = normalize_group(group)
            .ok_or_else(|| CoreError::InvalidInput("group name cannot be empty".to_string()))?;

        let clashes = self
            .groups
            .iter()
            .any(|existing| existing.name == group.name && Some(existing.name.as_str()) != current_name);
        if clashes {
            return Err(CoreError::InvalidInput(format!(
                "a group named {:?} already exists",
                group.name
            )));
        }

        match current_name {
            None => self.groups.push(group),
            Some(current) => {
                let slot = self
                    .groups
                    .iter_mut()
                    .find(|existing| existing.name == current)
                    .ok_or_else(|| CoreError::NotFound(format!("group {current:?}")))?;
                if current != group.name {
                    for pairing in &mut self.pairings {
                        if pairing.group == current {
                            pairing.group = group.name.clone();
                        }
                    }
                }
                *slot = group;
            }
        }
        Ok(())
    }

    pub fn remove_group(&mut self, name: &str) -> CoreResult<Group> {
        let index = self
            .groups
            .iter()
            .position(|group| group.name == name)
            .ok_or_else(|| CoreError::NotFound(format!("group {name:?}")))?;
        Ok(self.groups.remove(index))
    }

    /// Moves `groups[from]` to `to`, clamping the destination. Returns false
    /// when `from` is out of range.
    pub fn move_group(&mut self, from: usize, to: usize) -> bool {
        if from >= self.groups.len() {
            return false;
        }
        let group = self.groups.remove(from);
        let to = to.min(self.groups.len());
        self.groups.insert(to, group);
        true
    }

    /// Assigns the pairings at `indices` to `group`; an empty name clears them.
    pub fn assign_group(&mut self, indices: &[usize], group: &str) -> usize {
        let group = group.trim();
        let mut updated = 0;
        for &index in indices {
            if let Some(pairing) = self.pairings.get_mut(index) {
                pairing.group = group.to_string();
                updated += 1;
            }
        }
        updated
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn pairing_from_value(value: &Value) -> Option<Pairing> {
    if !value.is_object() {
        return None;
    }
    let url = string_field(value, "url");
    if url.is_empty() {
        return None;
    }
    Some(Pairing {
        url,
        name: string_field(value, "name"),
        emoji: string_field(value, "emoji"),
        group: string_field(value, "group"),
    })
}

fn group_from_value(value: &Value) -> Option<Group> {
    match value {
        Value::String(name) => normalize_group(Group::named(name.as_str())),
        Value::Object(_) => {
            let keywords = value
                .get("keywords")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            normalize_group(Group {
                name: string_field(value, "name"),
                category: Some(string_field(value, "category")),
                keywords,
            })
        }
        _ => None,
    }
}

fn normalize_group(group: Group) -> Option<Group> {
    let name = group.name.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let category = group
        .category
        .as_deref()
        .and_then(non_blank)
        .map(str::to_string);
    let keywords = group
        .keywords
        .iter()
        .filter_map(|keyword| non_blank(keyword))
        .map(str::to_string)
        .collect();
    Some(Group {
        name,
        category,
        keywords,
    })
}
