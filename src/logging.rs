use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use crate::app::CRATE_NAME;

const LOG_FILE: &str = "kpick.log";

/// Sends `log` output to a file in the cache directory when `RUST_LOG` is
/// set. The terminal belongs to the picker, so nothing is written to stderr.
pub fn init() -> Option<PathBuf> {
    std::env::var_os("RUST_LOG")?;

    let dir = dirs::cache_dir()?.join(CRATE_NAME);
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .ok()?;
    Some(path)
}
