use std::fs;
use std::path::Path;

use crate::entry::{dedup_and_sort, Entry};

/// Comment directive carrying the kitty color scheme of a Host block:
/// `# kitty theme: dracula` or `# kitty theme=dracula`.
const THEME_DIRECTIVE: &str = "kitty theme";
const WILDCARD: &str = "*";

#[derive(Default)]
struct Block {
    aliases: Vec<String>,
    user: Option<String>,
    theme: Option<String>,
}

impl Block {
    fn flush(self, out: &mut Vec<Entry>) {
        let Block {
            aliases,
            user,
            theme,
        } = self;
        for alias in aliases.into_iter().filter(|a| a != WILDCARD) {
            let label = match &user {
                Some(user) => format!("{user}@{alias}"),
                None => alias.clone(),
            };
            out.push(Entry::new(label, alias, theme.clone()));
        }
    }
}

/// Reads the ssh config at `path`. A missing or unreadable file yields no
/// hosts.
pub fn load_ssh_config(path: &Path) -> Vec<Entry> {
    if !path.is_file() {
        log::debug!("ssh config {} not found", path.display());
        return Vec::new();
    }
    match fs::read(path) {
        Ok(bytes) => parse_ssh_config(&String::from_utf8_lossy(&bytes)),
        Err(err) => {
            log::warn!("cannot read ssh config {}: {err}", path.display());
            Vec::new()
        }
    }
}

/// Extracts one entry per Host alias. Lines that don't look like a known
/// directive are skipped.
pub fn parse_ssh_config(text: &str) -> Vec<Entry> {
    let mut candidates = Vec::new();
    let mut block = Block::default();

    for line in text.lines() {
        let line = line.trim();

        if let Some((keyword, rest)) = split_header(line) {
            if keyword.eq_ignore_ascii_case("host") {
                std::mem::take(&mut block).flush(&mut candidates);
                block.aliases = rest.split_whitespace().map(String::from).collect();
                continue;
            }
            // Match criteria are not resolved; the block just ends the Host before it.
            if keyword.eq_ignore_ascii_case("match") {
                std::mem::take(&mut block).flush(&mut candidates);
                continue;
            }
        }

        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if let Some(theme) = theme_directive(comment) {
                block.theme = Some(theme);
            }
            continue;
        }

        if let Some((key, value)) = split_directive(line) {
            if key.eq_ignore_ascii_case("user") {
                block.user = Some(value.to_string());
            }
        }
    }
    block.flush(&mut candidates);

    dedup_and_sort(candidates)
}

/// Splits `Keyword rest` at the first whitespace run.
fn split_header(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(char::is_whitespace)?;
    let (keyword, rest) = line.split_at(idx);
    Some((keyword, rest.trim()))
}

/// `Key value` or `Key=value`, with an empty value treated as absent.
fn split_directive(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(|c: char| c.is_whitespace() || c == '=')?;
    let key = &line[..idx];
    let value = line[idx..].trim_start();
    let value = value.strip_prefix('=').unwrap_or(value).trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// The value splits on the first `:` when the comment holds one anywhere,
/// otherwise on the first `=`. So `kitty theme=a:b` yields `b`.
fn theme_directive(comment: &str) -> Option<String> {
    let rest = comment.trim();
    let keyword = rest.get(..THEME_DIRECTIVE.len())?;
    if !keyword.eq_ignore_ascii_case(THEME_DIRECTIVE) {
        return None;
    }
    if !matches!(rest[THEME_DIRECTIVE.len()..].chars().next(), Some(':' | '=')) {
        return None;
    }
    let sep = if rest.contains(':') { ':' } else { '=' };
    let (_, value) = rest.split_once(sep)?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.display_label.as_str()).collect()
    }

    #[test]
    fn multi_alias_block_with_user_and_theme() {
        let text = "Host alpha beta\n  User root\n# kitty theme: dracula\nHost *\n  ServerAliveInterval 30\n";
        let entries = parse_ssh_config(text);
        assert_eq!(
            entries,
            vec![
                Entry::new("root@alpha", "alpha", Some("dracula".into())),
                Entry::new("root@beta", "beta", Some("dracula".into())),
            ]
        );
    }

    #[test]
    fn wildcard_alias_is_skipped_in_any_position() {
        let entries = parse_ssh_config("Host * web\nHost db *\n");
        assert_eq!(labels(&entries), ["db", "web"]);
    }

    #[test]
    fn duplicate_alias_keeps_first_block() {
        let text = "Host web\n  User first\nHost web\n  User second\n";
        assert_eq!(labels(&parse_ssh_config(text)), ["first@web"]);
    }

    #[test]
    fn header_keyword_is_case_insensitive() {
        let text = "HOST one\nhost two\n\tHost\tthree\n";
        assert_eq!(labels(&parse_ssh_config(text)), ["one", "three", "two"]);
    }

    #[test]
    fn hostname_prefix_is_not_a_header() {
        let text = "Host web\n  HostName 10.0.0.1\n  User deploy\n";
        let entries = parse_ssh_config(text);
        assert_eq!(labels(&entries), ["deploy@web"]);
    }

    #[test]
    fn user_accepts_equals_separator() {
        let entries = parse_ssh_config("Host web\n  User=ops\n");
        assert_eq!(labels(&entries), ["ops@web"]);
    }

    #[test]
    fn attributes_without_aliases_yield_nothing() {
        let text = "User root\n# kitty theme: nord\n";
        assert!(parse_ssh_config(text).is_empty());
    }

    #[test]
    fn attributes_reset_between_blocks() {
        let text = "Host a\n  User root\n# kitty theme=nord\nHost b\n";
        let entries = parse_ssh_config(text);
        let b = entries.iter().find(|e| e.target_key == "b").unwrap();
        assert_eq!(*b, Entry::new("b", "b", None));
    }

    #[test]
    fn match_block_closes_previous_host() {
        let text = "Host a\nMatch host a exec true\n  User leaked\n";
        assert_eq!(labels(&parse_ssh_config(text)), ["a"]);
    }

    #[test]
    fn theme_directive_forms() {
        assert_eq!(theme_directive(" kitty theme: dracula "), Some("dracula".into()));
        assert_eq!(theme_directive(" Kitty Theme=Nord.conf"), Some("Nord.conf".into()));
        assert_eq!(theme_directive(" kitty theme=a:b"), Some("b".into()));
        assert_eq!(theme_directive(" kitty theme: a=b"), Some("a=b".into()));
        assert_eq!(theme_directive(" kitty theme:   "), None);
        assert_eq!(theme_directive(" kitty themes: x"), None);
        assert_eq!(theme_directive(" just a comment"), None);
    }

    #[test]
    fn colon_anywhere_wins_as_theme_separator() {
        let entries = parse_ssh_config("Host web\n# kitty theme=a:b\n");
        assert_eq!(entries[0].metadata.as_deref(), Some("b"));

        let entries = parse_ssh_config("Host web\n# kitty theme=solarized=dark\n");
        assert_eq!(entries[0].metadata.as_deref(), Some("solarized=dark"));
    }

    #[test]
    fn empty_theme_value_does_not_clear_previous() {
        let text = "Host a\n# kitty theme: nord\n# kitty theme:\n";
        assert_eq!(parse_ssh_config(text)[0].metadata.as_deref(), Some("nord"));
    }

    #[test]
    fn empty_user_value_is_absent() {
        let entries = parse_ssh_config("Host a\n  User   \n");
        assert_eq!(labels(&entries), ["a"]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "Host zeta Alpha\n  User x\nHost beta\n";
        assert_eq!(parse_ssh_config(text), parse_ssh_config(text));
    }

    #[test]
    fn empty_text_has_no_hosts() {
        assert!(parse_ssh_config("").is_empty());
    }

    #[test]
    fn missing_file_has_no_hosts() {
        assert!(load_ssh_config(Path::new("/nonexistent/kitty-pick/config")).is_empty());
    }
}
