//! Dashboard application state and TUI event loop.
//!
//! [`App`] owns the theme, the pipeline result and the navigation state
//! (selected tab and scroll offset). Tables are flattened once at startup;
//! every frame renders from them.

use std::io;
use std::time::Duration;

use chrono_tz::Tz;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame, Terminal,
};

use trelliq_core::formatting::{format_count, format_percentage};
use trelliq_core::groups::GroupRegistry;
use trelliq_core::models::StatusCategory;
use trelliq_data::analysis::PipelineResult;
use trelliq_data::tables::{self, Table};

use crate::chart_view::{self, BarDatum};
use crate::components::header::Header;
use crate::components::progress_bar::{CompletionBar, StatusMixBar};
use crate::table_view;
use crate::themes::Theme;

// ── Tab ───────────────────────────────────────────────────────────────────────

/// Dashboard tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Groups,
    Status,
    Collaborators,
    Timeline,
    Tasks,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Overview,
        Tab::Groups,
        Tab::Status,
        Tab::Collaborators,
        Tab::Timeline,
        Tab::Tasks,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Groups => "Groups",
            Tab::Status => "Status",
            Tab::Collaborators => "Collaborators",
            Tab::Timeline => "Timeline",
            Tab::Tasks => "Tasks",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// `'1'` → Overview … `'6'` → Tasks.
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard.
pub struct App {
    pub theme: Theme,
    pub tab: Tab,
    /// First visible row of the current tab's scrollable table.
    pub scroll: usize,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    result: PipelineResult,
    groups: GroupRegistry,
    groups_table: Table,
    status_table: Table,
    collaborators_table: Table,
    days_table: Table,
    tasks_table: Table,
}

impl App {
    pub fn new(result: PipelineResult, groups: GroupRegistry, timezone: Tz, theme_name: &str) -> Self {
        let summary = &result.tables;
        Self {
            theme: Theme::from_name(theme_name),
            tab: Tab::Overview,
            scroll: 0,
            should_quit: false,
            groups_table: tables::groups_table(summary),
            status_table: tables::status_table(summary),
            collaborators_table: tables::collaborators_table(summary),
            days_table: tables::days_table(summary),
            tasks_table: tables::records_table(&result.records, timezone),
            result,
            groups,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the dashboard until `q`, `Q`, `Esc` or `Ctrl+C`.
    ///
    /// Keyboard polling is synchronous with a 250 ms timeout; the loop yields
    /// to the runtime between polls so a caller can race it against a signal.
    pub async fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => tokio::task::yield_now().await,
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Apply one key press to the navigation state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => self.select(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.select(self.tab.previous()),
            KeyCode::Char(c) => {
                if let Some(tab) = Tab::from_digit(c) {
                    self.select(tab);
                }
            }
            KeyCode::Down => self.scroll_by(1),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
    }

    fn select(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.scroll = 0;
        }
    }

    fn scroll_by(&mut self, rows: usize) {
        let max = self
            .scrollable_table()
            .map_or(0, |t| t.rows.len().saturating_sub(1));
        self.scroll = (self.scroll + rows).min(max);
    }

    /// The table the arrow keys scroll on the current tab.
    fn scrollable_table(&self) -> Option<&Table> {
        match self.tab {
            Tab::Overview => None,
            Tab::Groups => Some(&self.groups_table),
            Tab::Status => Some(&self.status_table),
            Tab::Collaborators => Some(&self.collaborators_table),
            Tab::Timeline => Some(&self.days_table),
            Tab::Tasks => Some(&self.tasks_table),
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let meta = &self.result.metadata;
        let header = Header::new(
            meta.board_name.as_deref().unwrap_or(""),
            &meta.timezone,
            meta.as_of,
            self.result.records.len(),
            &self.theme,
        )
        .with_width(chunks[0].width as usize);
        frame.render_widget(Paragraph::new(Text::from(header.to_lines())), chunks[0]);

        let tabs = Tabs::new(
            Tab::ALL
                .iter()
                .enumerate()
                .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.title()))),
        )
        .select(self.tab.index())
        .style(self.theme.tab_inactive)
        .highlight_style(self.theme.tab_active)
        .divider(Span::styled("|", self.theme.separator));
        frame.render_widget(tabs, chunks[1]);

        let body = chunks[2];
        match self.tab {
            Tab::Overview => self.render_overview(frame, body),
            Tab::Groups => self.render_with_chart(
                frame,
                body,
                &self.groups_table,
                "Tasks per group",
                &chart_view::group_bars(&self.result.tables, &self.groups, &self.theme),
            ),
            Tab::Status => self.render_with_chart(
                frame,
                body,
                &self.status_table,
                "Tasks per status",
                &chart_view::status_bars(&self.result.tables, &self.theme),
            ),
            Tab::Collaborators => {
                table_view::render_table(frame, body, &self.collaborators_table, self.scroll, &self.theme)
            }
            Tab::Timeline => self.render_timeline(frame, body),
            Tab::Tasks => {
                table_view::render_table(frame, body, &self.tasks_table, self.scroll, &self.theme)
            }
        }

        let help = Line::from(vec![
            Span::styled("Tab/←→", self.theme.info),
            Span::styled(" switch  ", self.theme.dim),
            Span::styled("1-6", self.theme.info),
            Span::styled(" jump  ", self.theme.dim),
            Span::styled("↑↓", self.theme.info),
            Span::styled(" scroll  ", self.theme.dim),
            Span::styled("q", self.theme.info),
            Span::styled(" quit", self.theme.dim),
        ]);
        frame.render_widget(Paragraph::new(help), chunks[3]);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect) {
        let o = &self.result.tables.overview;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(0)])
            .split(area);

        let metric = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label:<26}"), self.theme.label),
                Span::styled(value, self.theme.value),
            ])
        };
        let bar_width = rows[0].width.saturating_sub(40).clamp(10, 40);
        let mut completion = CompletionBar::new(o.statuses.done, o.total_tasks, &self.theme);
        completion.config.width = bar_width;
        let mut mix = StatusMixBar::new(
            StatusCategory::ALL
                .iter()
                .map(|&s| (s, o.statuses.get(s)))
                .collect(),
            &self.theme,
        );
        mix.width = bar_width;

        let overdue_style = if o.overdue > 0 {
            self.theme.error
        } else {
            self.theme.success
        };
        let lines = vec![
            metric("Tasks", format_count(o.total_tasks)),
            metric("Completion rate", format_percentage(o.completion_rate)),
            Line::from(vec![
                Span::styled(format!("{:<26}", "Overdue"), self.theme.label),
                Span::styled(format_count(o.overdue), overdue_style),
            ]),
            metric("Unassigned", format_count(o.unassigned)),
            metric(
                "Collaborators",
                format!(
                    "{} (most active: {})",
                    format_count(o.unique_collaborators),
                    o.most_active_collaborator.as_deref().unwrap_or("-")
                ),
            ),
            Line::from(""),
            prefix_line("Done", completion.to_line(), &self.theme),
            prefix_line("Status mix", mix.to_line(), &self.theme),
        ];

        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.table_border)
                    .title(" Overview "),
            ),
            rows[0],
        );

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        chart_view::render_bar_chart(
            frame,
            charts[0],
            "Status",
            &chart_view::status_bars(&self.result.tables, &self.theme),
            &self.theme,
        );
        chart_view::render_bar_chart(
            frame,
            charts[1],
            "Groups",
            &chart_view::group_bars(&self.result.tables, &self.groups, &self.theme),
            &self.theme,
        );
    }

    fn render_with_chart(
        &self,
        frame: &mut Frame,
        area: Rect,
        table: &Table,
        chart_title: &str,
        data: &[BarDatum],
    ) {
        let table_height = (table.rows.len() as u16).saturating_add(3).min(area.height / 2);
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(table_height), Constraint::Min(0)])
            .split(area);
        table_view::render_table(frame, parts[0], table, self.scroll, &self.theme);
        chart_view::render_bar_chart(frame, parts[1], chart_title, data, &self.theme);
    }

    fn render_timeline(&self, frame: &mut Frame, area: Rect) {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let all_weeks = chart_view::bucket_bars(&self.result.tables.weeks, usize::MAX, &self.theme);
        let fit = chart_view::bars_that_fit(parts[0], chart_view::bar_width(&all_weeks), 1);
        let weeks = chart_view::bucket_bars(&self.result.tables.weeks, fit, &self.theme);
        chart_view::render_bar_chart(frame, parts[0], "Tasks per week", &weeks, &self.theme);

        table_view::render_table(frame, parts[1], &self.days_table, self.scroll, &self.theme);
    }
}

/// `label` padded to the metric column, followed by `line`'s spans.
fn prefix_line<'a>(label: &str, line: Line<'a>, theme: &Theme) -> Line<'a> {
    let mut spans = vec![Span::styled(format!("{label:<26}"), theme.label)];
    spans.extend(line.spans);
    Line::from(spans)
}

/// Leave raw mode and the alternate screen.
///
/// For callers that abandon [`App::run`] (for example on a signal) before it
/// could restore the terminal itself.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
