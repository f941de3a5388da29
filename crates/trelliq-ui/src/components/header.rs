use crate::themes::Theme;
use chrono::NaiveDate;
use ratatui::text::{Line, Span};

/// Dashboard header rendering three lines:
///
/// 1. Board name in bold with the application label.
/// 2. A separator of `width` `─` characters.
/// 3. Reporting context in `[ as of YYYY-MM-DD | timezone | N tasks ]` format.
pub struct Header<'a> {
    pub board_name: &'a str,
    pub timezone: &'a str,
    pub as_of: NaiveDate,
    pub total_tasks: usize,
    pub theme: &'a Theme,
    /// Separator width in columns.
    pub width: usize,
}

impl<'a> Header<'a> {
    pub fn new(
        board_name: &'a str,
        timezone: &'a str,
        as_of: NaiveDate,
        total_tasks: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            board_name,
            timezone,
            as_of,
            total_tasks,
            theme,
            width: 60,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let title = if self.board_name.trim().is_empty() {
            "Untitled board"
        } else {
            self.board_name
        };

        vec![
            Line::from(vec![
                Span::styled("trelliq ", self.theme.dim),
                Span::styled(title, self.theme.header),
            ]),
            Line::from(Span::styled("─".repeat(self.width), self.theme.separator)),
            Line::from(vec![
                Span::styled("[ as of ", self.theme.label),
                Span::styled(self.as_of.format("%Y-%m-%d").to_string(), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.timezone, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!(
                        "{} task{}",
                        trelliq_core::formatting::format_count(self.total_tasks),
                        if self.total_tasks == 1 { "" } else { "s" }
                    ),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
