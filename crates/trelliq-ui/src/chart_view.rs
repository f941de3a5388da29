//! Bar charts for the status, group and timeline tabs.

use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use trelliq_core::formatting::format_count;
use trelliq_core::groups::GroupRegistry;
use trelliq_data::aggregator::{BucketRow, SummaryTables};

use crate::themes::Theme;

/// One bar before it is handed to ratatui.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub label: String,
    pub value: u64,
    pub style: Style,
}

/// One bar per status category, coloured by status.
pub fn status_bars(summary: &SummaryTables, theme: &Theme) -> Vec<BarDatum> {
    summary
        .statuses
        .iter()
        .map(|row| BarDatum {
            label: row.status.label().to_string(),
            value: row.tasks as u64,
            style: theme.status_style(row.status),
        })
        .collect()
}

/// One bar per group, using the configured group colour when there is one.
pub fn group_bars(summary: &SummaryTables, registry: &GroupRegistry, theme: &Theme) -> Vec<BarDatum> {
    summary
        .groups
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let configured = registry.get(&row.group_id).and_then(|g| g.color.as_deref());
            BarDatum {
                label: row.group_name.clone(),
                value: row.tasks as u64,
                style: Style::default().fg(theme.group_color(configured, i)),
            }
        })
        .collect()
}

/// The most recent `limit` buckets, oldest first.
pub fn bucket_bars(rows: &[BucketRow], limit: usize, theme: &Theme) -> Vec<BarDatum> {
    let skip = rows.len().saturating_sub(limit);
    rows.iter()
        .skip(skip)
        .map(|row| BarDatum {
            label: row.bucket.clone(),
            value: row.tasks as u64,
            style: theme.chart_bar,
        })
        .collect()
}

/// Bar width wide enough for the longest label, within `3..=14` columns.
pub fn bar_width(data: &[BarDatum]) -> u16 {
    data.iter()
        .map(|d| d.label.width())
        .max()
        .unwrap_or(3)
        .clamp(3, 14) as u16
}

/// How many bars of `width` fit in `area` (borders and gaps included).
pub fn bars_that_fit(area: Rect, width: u16, gap: u16) -> usize {
    let inner = area.width.saturating_sub(2);
    ((inner + gap) / (width + gap).max(1)) as usize
}

pub fn render_bar_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    data: &[BarDatum],
    theme: &Theme,
) {
    let width = bar_width(data);
    let bars: Vec<Bar> = data
        .iter()
        .map(|d| {
            Bar::default()
                .value(d.value)
                .text_value(format_count(d.value as usize))
                .label(Line::from(d.label.clone()))
                .style(d.style)
                .value_style(theme.chart_value)
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {title} ")),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(1)
        .label_style(theme.label);

    frame.render_widget(chart, area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone as _, Utc};
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;
    use ratatui::Terminal;
    use std::collections::BTreeSet;
    use trelliq_core::models::{StatusCategory, TaskRecord};
    use trelliq_data::aggregator::TaskAggregator;

    fn record(id: &str, group: &str, status: StatusCategory, day: u32) -> TaskRecord {
        TaskRecord {
            id: id.to_string(),
            title: id.to_string(),
            group_id: group.to_string(),
            group_name: group.to_string(),
            status,
            list_name: String::new(),
            collaborators: BTreeSet::new(),
            created_at: None,
            last_activity: Some(Utc.with_ymd_and_hms(2024, 12, day, 12, 0, 0).unwrap()),
            due: None,
            archived: false,
            url: None,
        }
    }

    fn summary(registry: &GroupRegistry) -> SummaryTables {
        let records = vec![
            record("a", "grupo-1", StatusCategory::Done, 2),
            record("b", "grupo-1", StatusCategory::Backlog, 9),
            record("c", "grupo-3", StatusCategory::Review, 16),
        ];
        TaskAggregator::new(
            registry,
            chrono_tz::Tz::UTC,
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        )
        .summarize(&records)
    }

    #[test]
    fn test_status_bars_follow_status_rows() {
        let registry = GroupRegistry::builtin();
        let theme = Theme::dark();
        let bars = status_bars(&summary(&registry), &theme);
        assert_eq!(bars.len(), 5);
        let done = bars.iter().find(|b| b.label == "Done").unwrap();
        assert_eq!(done.value, 1);
        assert_eq!(done.style, theme.status_done);
    }

    #[test]
    fn test_group_bars_use_configured_colours() {
        let registry = GroupRegistry::builtin();
        let theme = Theme::dark();
        let bars = group_bars(&summary(&registry), &registry, &theme);
        assert_eq!(bars[0].label, "Grupo 1");
        assert_eq!(bars[0].value, 2);
        assert_eq!(bars[0].style.fg, Some(Color::Rgb(0x4F, 0x8E, 0xF7)));
        assert_eq!(bars.last().unwrap().label, "Unassigned");
    }

    #[test]
    fn test_bucket_bars_keep_most_recent() {
        let registry = GroupRegistry::builtin();
        let theme = Theme::dark();
        let s = summary(&registry);
        let bars = bucket_bars(&s.days, 2, &theme);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-12-09", "2024-12-16"]);
        assert_eq!(bucket_bars(&s.days, 10, &theme).len(), 3);
    }

    #[test]
    fn test_bar_width_bounds() {
        let datum = |label: &str| BarDatum {
            label: label.to_string(),
            value: 1,
            style: Style::default(),
        };
        assert_eq!(bar_width(&[]), 3);
        assert_eq!(bar_width(&[datum("a")]), 3);
        assert_eq!(bar_width(&[datum("In Progress")]), 11);
        assert_eq!(bar_width(&[datum("a very long group name")]), 14);
    }

    #[test]
    fn test_bars_that_fit() {
        assert_eq!(bars_that_fit(Rect::new(0, 0, 42, 10), 9, 1), 4);
        assert_eq!(bars_that_fit(Rect::new(0, 0, 2, 10), 9, 1), 0);
    }

    #[test]
    fn test_render_bar_chart_does_not_panic() {
        let registry = GroupRegistry::builtin();
        let theme = Theme::classic();
        let data = status_bars(&summary(&registry), &theme);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| render_bar_chart(frame, frame.area(), "Status", &data, &theme))
            .unwrap();
    }

    #[test]
    fn test_render_empty_bar_chart_does_not_panic() {
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal
            .draw(|frame| render_bar_chart(frame, frame.area(), "Weeks", &[], &theme))
            .unwrap();
    }
}
