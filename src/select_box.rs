use std::ops::Range;
use std::time::{Duration, Instant};

use crate::entry::Entry;
use crate::input::InputBuffer;
use crate::launcher::Launch;
use crate::store::{EntryStore, FilterView};

use ratatui::prelude::*;
use ratatui::widgets::*;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

const SEARCH_SYMBOL: &str = "🔍 ";
const PAGE: usize = 10;
const INFO_NOTICE: Duration = Duration::from_secs(2);
const ERROR_NOTICE: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Filtering,
    Exiting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Transient message, dropped by [`SelectBox::tick`] once it expires.
#[derive(Clone, Debug)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    expires_at: Instant,
}

/// What the event loop should do after a key was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A launch attempt may have handed the tty away and back; repaint fully.
    Repaint,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Motion {
    Up,
    Down,
    First,
    Last,
    PageUp,
    PageDown,
}

#[derive(Clone, Copy, Debug)]
enum Action {
    Quit,
    ToggleFilter,
    Move(Motion),
    Select,
    Edit(KeyEvent),
    Ignore,
}

/// Fixed texts of one picker flavour.
#[derive(Clone, Debug)]
pub struct PickerText {
    pub title: &'static str,
    /// Singular noun used in the status count, e.g. `host`.
    pub noun: &'static str,
    /// Verb for the Enter key hint, e.g. `connect`.
    pub verb: &'static str,
    /// Where the entries came from, shown after the count.
    pub source: Option<String>,
}

/// The interactive list: filter text, highlighted row, filtered view and
/// the launcher invoked on Enter.
pub struct SelectBox<L> {
    store: EntryStore,
    launcher: L,
    text: PickerText,
    state: ListState,
    input_buffer: InputBuffer,
    mode: Mode,
    view: FilterView,
    filter_version: u64,
    notice: Option<Notice>,
    current: Option<String>,
    exit_on_success: bool,
}

impl<L: Launch> SelectBox<L> {
    pub fn new(store: EntryStore, launcher: L, text: PickerText) -> Self {
        let view = store.view("", 0);
        let selected = (!view.indices.is_empty()).then_some(0);
        Self {
            state: ListState::default().with_selected(selected),
            input_buffer: InputBuffer::new(SEARCH_SYMBOL),
            mode: Mode::Browsing,
            filter_version: 0,
            notice: None,
            current: None,
            exit_on_success: true,
            store,
            launcher,
            text,
            view,
        }
    }

    /// Stay open after a successful launch and show it as the current entry.
    pub fn keep_open(mut self, keep_open: bool) -> Self {
        self.exit_on_success = !keep_open;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn query(&self) -> &str {
        self.input_buffer.value()
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn filtered(&self) -> Vec<&Entry> {
        self.view
            .indices
            .iter()
            .filter_map(|&i| self.store.get(i))
            .collect()
    }

    pub fn highlighted(&self) -> Option<&Entry> {
        let row = self.state.selected()?;
        let index = *self.view.indices.get(row)?;
        self.store.get(index)
    }

    pub fn status_line(&self) -> String {
        if let Some(current) = &self.current {
            return format!("Current: {current}");
        }
        let count = self.view.indices.len();
        match &self.text.source {
            Some(source) => format!("{count} {}(s) from {source}", self.text.noun),
            None => format!("{count} {}(s)", self.text.noun),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        match Self::action_for(self.mode, key) {
            Action::Quit => {
                self.mode = Mode::Exiting;
                Flow::Exit
            }
            Action::ToggleFilter => {
                self.mode = match self.mode {
                    Mode::Browsing => Mode::Filtering,
                    _ => Mode::Browsing,
                };
                Flow::Continue
            }
            Action::Move(motion) => {
                self.move_highlight(motion);
                Flow::Continue
            }
            Action::Select => self.select(),
            Action::Edit(key) => {
                if self.input_buffer.handle_event(Event::Key(key)) {
                    self.filter_version += 1;
                    let view = self.store.view(self.input_buffer.value(), self.filter_version);
                    self.apply_view(view);
                }
                Flow::Continue
            }
            Action::Ignore => Flow::Continue,
        }
    }

    /// Key dispatch table: (mode, key) -> action.
    fn action_for(mode: Mode, key: KeyEvent) -> Action {
        use KeyCode::*;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == Char('c') {
            return Action::Quit;
        }
        match (mode, key.code) {
            (Mode::Exiting, _) => Action::Ignore,
            (_, Char('/')) => Action::ToggleFilter,
            (_, Enter) => Action::Select,
            (_, Up) => Action::Move(Motion::Up),
            (_, Down) => Action::Move(Motion::Down),
            (_, PageUp) => Action::Move(Motion::PageUp),
            (_, PageDown) => Action::Move(Motion::PageDown),
            (Mode::Browsing, Char('q') | Esc) => Action::Quit,
            (Mode::Browsing, Char('k')) => Action::Move(Motion::Up),
            (Mode::Browsing, Char('j')) => Action::Move(Motion::Down),
            (Mode::Browsing, Home | Char('g')) => Action::Move(Motion::First),
            (Mode::Browsing, End | Char('G')) => Action::Move(Motion::Last),
            (Mode::Browsing, _) => Action::Ignore,
            (Mode::Filtering, Esc) => Action::ToggleFilter,
            (Mode::Filtering, _) => Action::Edit(key),
        }
    }

    /// Installs a filter result unless a newer one is already shown.
    pub fn apply_view(&mut self, view: FilterView) -> bool {
        if view.version < self.view.version {
            log::debug!(
                "dropping stale filter result {} (showing {})",
                view.version,
                self.view.version
            );
            return false;
        }
        self.view = view;
        let selected = (!self.view.indices.is_empty()).then_some(0);
        self.state.select(selected);
        true
    }

    fn move_highlight(&mut self, motion: Motion) {
        let len = self.view.indices.len();
        if len == 0 {
            return;
        }
        let last = len - 1;
        let current = self.state.selected().unwrap_or(0).min(last);
        let next = match motion {
            Motion::Up => current.saturating_sub(1),
            Motion::Down => (current + 1).min(last),
            Motion::First => 0,
            Motion::Last => last,
            Motion::PageUp => current.saturating_sub(PAGE),
            Motion::PageDown => (current + PAGE).min(last),
        };
        self.state.select(Some(next));
    }

    fn select(&mut self) -> Flow {
        let Some(entry) = self.highlighted().cloned() else {
            return Flow::Continue;
        };

        match self.launcher.launch(&entry) {
            Ok(launched) => {
                log::info!("launched {} ({launched:?})", entry.target_key);
                let message = self.launcher.confirmation(&entry);
                self.notify(message, Severity::Info, INFO_NOTICE);
                if self.exit_on_success {
                    self.mode = Mode::Exiting;
                    return Flow::Exit;
                }
                self.current = Some(entry.display_label);
            }
            Err(err) => {
                log::warn!("launching {} failed: {err}", entry.target_key);
                self.notify(err.to_string(), Severity::Error, ERROR_NOTICE);
            }
        }
        Flow::Repaint
    }

    fn notify(&mut self, message: String, severity: Severity, ttl: Duration) {
        self.notice = Some(Notice {
            message,
            severity,
            expires_at: Instant::now() + ttl,
        });
    }

    /// Drops an expired notice. Returns true if the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some(notice) if now >= notice.expires_at => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    pub fn ui(&mut self, f: &mut Frame) {
        let filtering = self.mode == Mode::Filtering;
        let recs = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(if filtering { 3 } else { 0 }),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.size());

        let header = Paragraph::new(Line::from(self.text.title))
            .style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .alignment(Alignment::Center);
        f.render_widget(header, recs[0]);

        if filtering {
            let input = Paragraph::new(self.input_buffer.line())
                .style(Style::default().fg(Color::Cyan))
                .block(Block::default().borders(Borders::ALL).title("Filter"));
            f.render_widget(input, recs[1]);
            f.set_cursor(
                recs[1].x + 1 + self.input_buffer.visual_cursor() as u16,
                recs[1].y + 1,
            );
        }

        let query = self.input_buffer.value();
        let items: Vec<ListItem> = self
            .view
            .indices
            .iter()
            .filter_map(|&i| self.store.get(i))
            .map(|entry| {
                let range = match_range(&entry.display_label, query);
                ListItem::new(Line::from(highlight_spans(&entry.display_label, range)))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);
        f.render_stateful_widget(list, recs[2], &mut self.state);

        let status = Paragraph::new(Line::from(self.status_line()))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(status, recs[3]);

        let hint = if filtering {
            // `/` is bound to closing the field, so it can't be typed as filter text.
            format!(
                "(/ or Esc) close filter, / is not typed | (↑/↓) move | (Enter) {}",
                self.text.verb
            )
        } else {
            format!(
                "(q) quit | (↑/k) move up | (↓/j) move down | (Enter) {} | (/) filter",
                self.text.verb
            )
        };
        f.render_widget(
            Paragraph::new(Line::from(hint)).alignment(Alignment::Center),
            recs[4],
        );

        if let Some(notice) = &self.notice {
            render_notice(f, notice, recs[2]);
        }
    }
}

fn render_notice(f: &mut Frame, notice: &Notice, over: Rect) {
    let color = match notice.severity {
        Severity::Info => Color::Green,
        Severity::Error => Color::Red,
    };
    let width = (UnicodeWidthStr::width(notice.message.as_str()) as u16 + 4).min(over.width);
    let height = 3.min(over.height);
    let area = Rect::new(
        over.x + over.width - width,
        over.y + over.height - height,
        width,
        height,
    );
    let body = Paragraph::new(notice.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

/// Char range of the first case-insensitive occurrence of `query` in `label`.
fn match_range(label: &str, query: &str) -> Option<Range<usize>> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    let lower = label.to_lowercase();
    // Lowercasing changed the char count; positions would not line up.
    if lower.chars().count() != label.chars().count() {
        return None;
    }
    let byte = lower.find(&query)?;
    let start = lower[..byte].chars().count();
    Some(start..start + query.chars().count())
}

fn highlight_spans(input: &str, range: Option<Range<usize>>) -> Vec<Span<'static>> {
    let Some(range) = range else {
        return vec![Span::raw(input.to_string())];
    };
    let highlight_style = Style::default()
        .fg(Color::Rgb(250, 0, 0))
        .bg(Color::Rgb(0xFF, 0xFC, 0x67))
        .add_modifier(Modifier::BOLD);

    let before: String = input.chars().take(range.start).collect();
    let matched: String = input.chars().skip(range.start).take(range.len()).collect();
    let after: String = input.chars().skip(range.end).collect();

    [
        Span::raw(before),
        Span::styled(matched, highlight_style),
        Span::raw(after),
    ]
    .into_iter()
    .filter(|s| !s.content.is_empty())
    .collect()
}
