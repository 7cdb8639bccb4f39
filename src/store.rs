use crate::entry::Entry;

/// Which fields of an [`Entry`] a filter query is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchFields {
    /// Label or host alias (ssh hosts).
    LabelAndTarget,
    /// Label only (themes, whose key is a filesystem path).
    Label,
}

/// The filtered view for one version of the filter text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterView {
    pub version: u64,
    pub indices: Vec<usize>,
}

/// Immutable list of parsed entries plus the filtering rules over it.
pub struct EntryStore {
    full: Vec<Entry>,
    fields: MatchFields,
}

impl EntryStore {
    pub fn new(full: Vec<Entry>, fields: MatchFields) -> Self {
        Self { full, fields }
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.full.get(index)
    }

    /// Entries matching `query`, in the order of the full list.
    pub fn filter(&self, query: &str) -> Vec<&Entry> {
        self.filter_indices(query)
            .into_iter()
            .map(|i| &self.full[i])
            .collect()
    }

    /// Positions in the full list of the entries matching `query`.
    ///
    /// Matching is a case-insensitive substring test on the trimmed query;
    /// an empty query matches everything.
    pub fn filter_indices(&self, query: &str) -> Vec<usize> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return (0..self.full.len()).collect();
        }

        self.full
            .iter()
            .enumerate()
            .filter(|(_, e)| self.matches(e, &query))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn view(&self, query: &str, version: u64) -> FilterView {
        FilterView {
            version,
            indices: self.filter_indices(query),
        }
    }

    fn matches(&self, entry: &Entry, query: &str) -> bool {
        if entry.display_label.to_lowercase().contains(query) {
            return true;
        }
        self.fields == MatchFields::LabelAndTarget
            && entry.target_key.to_lowercase().contains(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(labels: &[&str], fields: MatchFields) -> EntryStore {
        let full = labels
            .iter()
            .map(|l| Entry::new(*l, format!("/themes/{l}.conf"), None))
            .collect();
        EntryStore::new(full, fields)
    }

    fn labels<'a>(entries: &[&'a Entry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.display_label.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_full_list() {
        let s = store(&["alpha", "beta"], MatchFields::Label);
        assert_eq!(labels(&s.filter("")), ["alpha", "beta"]);
        assert_eq!(labels(&s.filter("   ")), ["alpha", "beta"]);
    }

    #[test]
    fn substring_match_preserves_order() {
        let s = store(&["alpha", "beta", "gamma"], MatchFields::Label);
        assert_eq!(labels(&s.filter("a")), ["alpha", "beta", "gamma"]);
        assert_eq!(labels(&s.filter("al")), ["alpha"]);
        assert_eq!(labels(&s.filter("AL")), ["alpha"]);
        assert!(s.filter("zzz").is_empty());
    }

    #[test]
    fn target_key_only_searched_for_hosts() {
        let s = store(&["nord"], MatchFields::Label);
        assert!(s.filter("/themes").is_empty());
        let s = store(&["nord"], MatchFields::LabelAndTarget);
        assert_eq!(labels(&s.filter("/themes")), ["nord"]);
    }

    #[test]
    fn get_resolves_view_indices() {
        let s = store(&["alpha", "beta"], MatchFields::Label);
        let view = s.view("bet", 1);
        assert_eq!(view.indices, [1]);
        assert_eq!(s.get(view.indices[0]).map(|e| e.display_label.as_str()), Some("beta"));
        assert!(s.get(2).is_none());
    }

    #[test]
    fn filtering_is_idempotent() {
        let s = store(&["Alpha", "alphabet", "beta"], MatchFields::LabelAndTarget);
        assert_eq!(s.filter("alp"), s.filter("alp"));
        assert_eq!(s.view("alp", 3), s.view("alp", 3));
    }
}
