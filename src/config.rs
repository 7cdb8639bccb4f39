use std::env;
use std::path::{Path, PathBuf};

/// Overrides the ssh config file.
pub const SSH_CONFIG_ENV: &str = "SSH_CONFIG_ENV";
/// Overrides the kitty config directory searched for themes.
pub const KITTY_CONFIG_ENV: &str = "KITTY_CONFIG_DIRECTORY";

pub fn ssh_config_path() -> PathBuf {
    resolve(
        env::var(SSH_CONFIG_ENV).ok().as_deref(),
        home_dir().join(".ssh").join("config"),
    )
}

pub fn kitty_config_dir() -> PathBuf {
    resolve(
        env::var(KITTY_CONFIG_ENV).ok().as_deref(),
        home_dir().join(".config").join("kitty"),
    )
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Picks the override if it is set and not blank, expanding a leading `~`
/// and resolving it to an absolute path where possible.
fn resolve(value: Option<&str>, default: PathBuf) -> PathBuf {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return default;
    };
    let path = expand_tilde(value);
    path.canonicalize().unwrap_or_else(|_| absolute(&path))
}

fn expand_tilde(value: &str) -> PathBuf {
    if value == "~" {
        return home_dir();
    }
    match value.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(value),
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
