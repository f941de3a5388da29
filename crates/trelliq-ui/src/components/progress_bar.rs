use crate::themes::Theme;
use ratatui::text::{Line, Span};
use trelliq_core::formatting::{format_count, percentage};
use trelliq_core::models::StatusCategory;

/// Configuration controlling visual appearance of a progress bar.
pub struct ProgressBarConfig {
    /// Total width in terminal columns of the bar portion (excluding label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    /// Whether to append the `done/total` counts after the percentage.
    pub show_counts: bool,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            show_counts: true,
        }
    }
}

// ── CompletionBar ────────────────────────────────────────────────────────────

/// Horizontal bar showing the share of finished tasks.
///
/// Renders as a coloured fill and an empty portion followed by a label with
/// the percentage and the `done/total` counts.
pub struct CompletionBar<'a> {
    /// Completion percentage in `[0.0, 100.0]`.
    pub percentage: f64,
    pub done: usize,
    pub total: usize,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> CompletionBar<'a> {
    pub fn new(done: usize, total: usize, theme: &'a Theme) -> Self {
        Self {
            percentage: percentage(done as f64, total as f64, 1).min(100.0),
            done,
            total,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled = ((self.percentage / 100.0) * self.config.width as f64) as u16;
        let empty = self.config.width.saturating_sub(filled);

        let filled_str = self.config.filled_char.to_string().repeat(filled as usize);
        let empty_str = self.config.empty_char.to_string().repeat(empty as usize);

        let label = if self.config.show_counts {
            format!(
                " {:.1}% ({}/{})",
                self.percentage,
                format_count(self.done),
                format_count(self.total)
            )
        } else {
            format!(" {:.1}%", self.percentage)
        };

        Line::from(vec![
            Span::styled(filled_str, self.theme.completion_style(self.percentage)),
            Span::styled(empty_str, self.theme.progress_empty),
            Span::styled(label, self.theme.progress_label),
        ])
    }
}

// ── StatusMixBar ─────────────────────────────────────────────────────────────

/// Proportional multi-coloured bar with one segment per status category.
///
/// Segment widths follow each category's share of the total; categories with
/// no tasks are left out of both the bar and the legend.
pub struct StatusMixBar<'a> {
    /// `(category, task count)` pairs in display order.
    pub counts: Vec<(StatusCategory, usize)>,
    pub theme: &'a Theme,
    pub width: u16,
}

impl<'a> StatusMixBar<'a> {
    pub fn new(counts: Vec<(StatusCategory, usize)>, theme: &'a Theme) -> Self {
        Self {
            counts,
            theme,
            width: 40,
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let total: usize = self.counts.iter().map(|(_, n)| n).sum();
        let mut spans: Vec<Span<'a>> = Vec::new();
        if total == 0 {
            spans.push(Span::styled(
                "░".repeat(self.width as usize),
                self.theme.progress_empty,
            ));
            return Line::from(spans);
        }

        for (status, count) in &self.counts {
            let chars = ((*count as f64 / total as f64) * self.width as f64).round() as usize;
            if chars > 0 {
                spans.push(Span::styled(
                    "█".repeat(chars),
                    self.theme.status_style(*status),
                ));
            }
        }

        spans.push(Span::raw(" "));

        for (status, count) in &self.counts {
            if *count > 0 {
                spans.push(Span::styled(
                    format!("{}: {} ", status.label(), format_count(*count)),
                    self.theme.status_style(*status),
                ));
            }
        }

        Line::from(spans)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    // ── CompletionBar ────────────────────────────────────────────────────────

    #[test]
    fn test_completion_bar_quarter() {
        let theme = Theme::dark();
        let line = CompletionBar::new(1, 4, &theme).to_line();

        assert_eq!(line.spans.len(), 3, "expected filled, empty, label");
        assert_eq!(line.spans[0].content.chars().count(), 10);
        assert!(line.spans[0].content.chars().all(|c| c == '█'));
        assert_eq!(line.spans[1].content.chars().count(), 30);

        let label = &line.spans[2].content;
        assert!(label.contains("25.0%"), "label was: {label}");
        assert!(label.contains("(1/4)"), "label was: {label}");
    }

    #[test]
    fn test_completion_bar_uses_completion_colour() {
        let theme = Theme::dark();
        let low = CompletionBar::new(1, 4, &theme).to_line();
        let high = CompletionBar::new(9, 10, &theme).to_line();
        assert_eq!(low.spans[0].style, theme.progress_poor);
        assert_eq!(high.spans[0].style, theme.progress_good);
    }

    #[test]
    fn test_completion_bar_empty_board() {
        let theme = Theme::dark();
        let bar = CompletionBar::new(0, 0, &theme);
        assert_eq!(bar.percentage, 0.0);
        let line = bar.to_line();
        assert_eq!(line.spans[0].content.len(), 0);
        assert_eq!(line.spans[1].content.chars().count(), 40);
    }

    #[test]
    fn test_completion_bar_full_without_counts() {
        let theme = Theme::dark();
        let mut bar = CompletionBar::new(2_000, 2_000, &theme).with_width(20);
        bar.config.show_counts = false;
        let line = bar.to_line();
        assert_eq!(line.spans[0].content.chars().count(), 20);
        assert_eq!(line.spans[2].content, " 100.0%");
    }

    // ── StatusMixBar ─────────────────────────────────────────────────────────

    #[test]
    fn test_status_mix_bar_segments_and_legend() {
        let theme = Theme::dark();
        let bar = StatusMixBar::new(
            vec![
                (StatusCategory::Backlog, 2),
                (StatusCategory::InProgress, 1),
                (StatusCategory::Review, 0),
                (StatusCategory::Done, 1),
            ],
            &theme,
        );
        let line = bar.to_line();
        let full = text(&line);
        assert!(full.contains("Backlog: 2"), "text: {full}");
        assert!(full.contains("Done: 1"), "text: {full}");
        assert!(!full.contains("Review"), "zero counts are skipped: {full}");
        assert_eq!(line.spans[0].content.chars().count(), 20);
        assert_eq!(line.spans[0].style, theme.status_backlog);
    }

    #[test]
    fn test_status_mix_bar_no_tasks() {
        let theme = Theme::dark();
        let line = StatusMixBar::new(vec![(StatusCategory::Done, 0)], &theme).to_line();
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content.chars().count(), 40);
    }
}
