mod app;
pub mod config;
mod entry;
mod input;
pub mod launcher;
pub mod logging;
mod select_box;
pub mod sshconfig;
pub mod store;
pub mod system;
mod terminal;
pub mod themes;

pub use app::App;
pub use entry::Entry;
pub use launcher::{Launch, LaunchError, Launched, SshClient};
pub use select_box::{Flow, Mode, Notice, PickerText, SelectBox, Severity};
pub use store::{EntryStore, MatchFields};
pub use terminal::Terminal;
