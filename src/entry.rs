use std::collections::HashSet;

/// One selectable row of the picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Text shown in the list, e.g. `root@alpha` or `themes/dracula`.
    pub display_label: String,
    /// Unique key handed to the launcher (host alias or absolute theme path).
    pub target_key: String,
    /// Color scheme forwarded to `kitten ssh`, if the host block names one.
    pub metadata: Option<String>,
}

impl Entry {
    pub fn new(
        display_label: impl Into<String>,
        target_key: impl Into<String>,
        metadata: Option<String>,
    ) -> Self {
        Self {
            display_label: display_label.into(),
            target_key: target_key.into(),
            metadata,
        }
    }
}

/// Drops later duplicates of a `target_key` and sorts the survivors by
/// lowercase label, then by key.
pub(crate) fn dedup_and_sort(candidates: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut entries: Vec<Entry> = candidates
        .into_iter()
        .filter(|e| seen.insert(e.target_key.clone()))
        .collect();

    entries.sort_by(|a, b| {
        a.display_label
            .to_lowercase()
            .cmp(&b.display_label.to_lowercase())
            .then_with(|| a.target_key.cmp(&b.target_key))
    });
    entries
}
