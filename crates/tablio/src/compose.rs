use crate::settings::{Group, Pairing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedTitle {
    pub title: String,
    pub should_rename: bool,
}

/// Builds the display title: category marker, then color marker, then the
/// pairing's custom name or the original title. A tab with none of those
/// keeps its original title and is not renamed.
///
/// The part order is fixed; repeated passes depend on it to produce the
/// same title every time.
pub fn compose_title(
    pairing: Option<&Pairing>,
    group: Option<&Group>,
    original_title: &str,
) -> ComposedTitle {
    let category = group.and_then(Group::category);
    let color = pairing.and_then(Pairing::color);
    let custom_name = pairing.and_then(Pairing::custom_name);

    if category.is_none() && color.is_none() && custom_name.is_none() {
        return ComposedTitle {
            title: original_title.to_string(),
            should_rename: false,
        };
    }

    let parts: Vec<&str> = [category, color, Some(custom_name.unwrap_or(original_title))]
        .into_iter()
        .flatten()
        .collect();
    ComposedTitle {
        title: parts.join(" "),
        should_rename: true,
    }
}
