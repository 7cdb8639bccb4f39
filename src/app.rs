use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::Backend;

use crate::launcher::{Launch, SshClient, SshLauncher, ThemeLauncher};
use crate::select_box::{Flow, PickerText, SelectBox, Severity};
use crate::store::{EntryStore, MatchFields};
use crate::system::HostSystem;
use crate::{config, sshconfig, terminal::Terminal, themes};

pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const TICK: Duration = Duration::from_millis(100);

pub struct App<L> {
    select_box: SelectBox<L>,
}

impl App<SshLauncher<HostSystem>> {
    /// Hosts from the ssh config, connected through `client`.
    pub fn hosts(client: SshClient) -> anyhow::Result<Self> {
        let path = config::ssh_config_path();
        let entries = sshconfig::load_ssh_config(&path);
        log::info!("{} host(s) from {}", entries.len(), path.display());

        let text = PickerText {
            title: "SSH host selector",
            noun: "host",
            verb: "connect",
            source: Some(path.display().to_string()),
        };
        let launcher = SshLauncher::new(HostSystem::new()?, client);
        let store = EntryStore::new(entries, MatchFields::LabelAndTarget);
        Ok(Self::new(SelectBox::new(store, launcher, text)))
    }
}

impl App<ThemeLauncher<HostSystem>> {
    /// Theme files under the kitty config directory.
    pub fn themes(keep_open: bool) -> anyhow::Result<Self> {
        let dir = config::kitty_config_dir();
        let entries = themes::collect_themes(&dir);
        log::info!("{} theme(s) under {}", entries.len(), dir.display());

        let text = PickerText {
            title: "Kitty theme selector",
            noun: "theme",
            verb: "apply",
            source: None,
        };
        let launcher = ThemeLauncher::new(HostSystem::new()?);
        let store = EntryStore::new(entries, MatchFields::Label);
        Ok(Self::new(
            SelectBox::new(store, launcher, text).keep_open(keep_open),
        ))
    }
}

impl<L: Launch> App<L> {
    pub fn new(select_box: SelectBox<L>) -> Self {
        App { select_box }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = Terminal::new()?;
        let result = self.event_loop(&mut *terminal);

        // drop is needed to cleanup the terminal before printing
        drop(terminal);

        if let Some(notice) = self.select_box.notice() {
            if notice.severity == Severity::Info {
                println!("{}", notice.message);
            }
        }
        result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut ratatui::Terminal<B>) -> anyhow::Result<()> {
        terminal.draw(|f| self.select_box.ui(f))?;
        loop {
            if !event::poll(TICK)? {
                if self.select_box.tick(Instant::now()) {
                    terminal.draw(|f| self.select_box.ui(f))?;
                }
                continue;
            }

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match self.select_box.handle_key(key) {
                        Flow::Exit => {
                            terminal.draw(|f| self.select_box.ui(f))?;
                            break;
                        }
                        Flow::Repaint => terminal.clear()?,
                        Flow::Continue => {}
                    }
                }
                Event::Resize(_, _) => {}
                _ => continue,
            }
            terminal.draw(|f| self.select_box.ui(f))?;
        }

        Ok(())
    }
}
