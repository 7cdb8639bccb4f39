use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::entry::{dedup_and_sort, Entry};

const THEME_EXTENSION: &str = "conf";

/// Collects every `*.conf` file below `root`, one entry per file stem.
///
/// Traversal is sorted by file name at each level, so when two files share a
/// stem the one with the lexicographically smaller path wins. A missing root
/// yields no themes.
pub fn collect_themes(root: &Path) -> Vec<Entry> {
    if !root.is_dir() {
        log::debug!("theme directory {} not found", root.display());
        return Vec::new();
    }

    let mut seen_stems = HashSet::new();
    let mut candidates = Vec::new();

    let walker = WalkDir::new(root).sort_by_file_name().into_iter();
    for dir_entry in walker.filter_map(|e| e.ok()) {
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(THEME_EXTENSION) || !path.is_file()
        {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if !seen_stems.insert(stem.clone()) {
            continue;
        }

        let display = match path.strip_prefix(root) {
            Ok(rel) => rel.with_extension("").to_string_lossy().into_owned(),
            Err(_) => stem,
        };
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        candidates.push(Entry::new(
            display,
            absolute.to_string_lossy().into_owned(),
            None,
        ));
    }

    dedup_and_sort(candidates)
}
