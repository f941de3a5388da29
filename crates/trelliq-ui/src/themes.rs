use ratatui::style::{Color, Modifier, Style};
use trelliq_core::models::StatusCategory;

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Fallback bar colours for groups without a configured colour.
const GROUP_PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
];

/// Complete theme definition carrying all UI styles used by trelliq-ui
/// components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Signals ──────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Progress bars ────────────────────────────────────────────────────────
    /// Filled portion when completion is at or above 80 %.
    pub progress_good: Style,
    /// Filled portion when completion is between 50 % and 80 %.
    pub progress_fair: Style,
    /// Filled portion when completion is below 50 %.
    pub progress_poor: Style,
    /// Unfilled (empty) portion of a progress bar.
    pub progress_empty: Style,
    pub progress_label: Style,

    // ── Status categories ────────────────────────────────────────────────────
    pub status_backlog: Style,
    pub status_in_progress: Style,
    pub status_review: Style,
    pub status_done: Style,
    pub status_unknown: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_selected: Style,

    // ── Tabs and charts ──────────────────────────────────────────────────────
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub chart_bar: Style,
    pub chart_value: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            progress_good: Style::default().fg(Color::Green),
            progress_fair: Style::default().fg(Color::Yellow),
            progress_poor: Style::default().fg(Color::Red),
            progress_empty: Style::default().fg(Color::DarkGray),
            progress_label: Style::default().fg(Color::Gray),

            status_backlog: Style::default().fg(Color::Gray),
            status_in_progress: Style::default().fg(Color::Cyan),
            status_review: Style::default().fg(Color::Magenta),
            status_done: Style::default().fg(Color::Green),
            status_unknown: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),

            tab_active: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            chart_bar: Style::default().fg(Color::Cyan),
            chart_value: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Uses dark colours for text and bright accent colours so that content
    /// remains legible against a white/light-grey terminal canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            progress_good: Style::default().fg(Color::Green),
            progress_fair: Style::default().fg(Color::Yellow),
            progress_poor: Style::default().fg(Color::Red),
            progress_empty: Style::default().fg(Color::Gray),
            progress_label: Style::default().fg(Color::DarkGray),

            status_backlog: Style::default().fg(Color::DarkGray),
            status_in_progress: Style::default().fg(Color::Blue),
            status_review: Style::default().fg(Color::Magenta),
            status_done: Style::default().fg(Color::Green),
            status_unknown: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_selected: Style::default()
                .fg(Color::White)
                .bg(Color::Blue),

            tab_active: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            chart_bar: Style::default().fg(Color::Blue),
            chart_value: Style::default()
                .fg(Color::White)
                .bg(Color::Blue),
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette.
    ///
    /// Avoids bold modifiers to maximise compatibility with minimal terminal
    /// emulators.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            progress_good: Style::default().fg(Color::Green),
            progress_fair: Style::default().fg(Color::Yellow),
            progress_poor: Style::default().fg(Color::Red),
            progress_empty: Style::default().fg(Color::DarkGray),
            progress_label: Style::default().fg(Color::White),

            status_backlog: Style::default().fg(Color::White),
            status_in_progress: Style::default().fg(Color::Cyan),
            status_review: Style::default().fg(Color::Magenta),
            status_done: Style::default().fg(Color::Green),
            status_unknown: Style::default().fg(Color::DarkGray),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_selected: Style::default().fg(Color::Yellow),

            tab_active: Style::default().fg(Color::Yellow),
            tab_inactive: Style::default().fg(Color::Gray),
            chart_bar: Style::default().fg(Color::Cyan),
            chart_value: Style::default().fg(Color::White),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Fill style for a completion percentage.
    ///
    /// * `≥ 80 %`  → `progress_good`
    /// * `50–80 %` → `progress_fair`
    /// * `< 50 %`  → `progress_poor`
    pub fn completion_style(&self, percentage: f64) -> Style {
        if percentage >= 80.0 {
            self.progress_good
        } else if percentage >= 50.0 {
            self.progress_fair
        } else {
            self.progress_poor
        }
    }

    pub fn status_style(&self, status: StatusCategory) -> Style {
        match status {
            StatusCategory::Backlog => self.status_backlog,
            StatusCategory::InProgress => self.status_in_progress,
            StatusCategory::Review => self.status_review,
            StatusCategory::Done => self.status_done,
            StatusCategory::Unknown => self.status_unknown,
        }
    }

    /// Bar colour for the `index`-th group: its configured `#RRGGBB` colour
    /// when valid, otherwise a palette colour.
    pub fn group_color(&self, configured: Option<&str>, index: usize) -> Color {
        configured
            .and_then(parse_hex_color)
            .unwrap_or(GROUP_PALETTE[index % GROUP_PALETTE.len()])
    }
}

/// Parse `"#RRGGBB"` into an RGB colour.
fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
