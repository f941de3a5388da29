//! Bordered table view for any summary [`Table`].
//!
//! Column widths follow the widest cell (by display width, so accented group
//! and list names line up), numeric columns are right-aligned, and rows
//! alternate between the two row styles of the active theme.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table as TableWidget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use trelliq_data::tables::{Cell as TableCell, Table};

use crate::themes::Theme;

/// Widest column allowed before content is clipped.
pub const MAX_COLUMN_WIDTH: u16 = 40;

/// Display width of each column: the widest of header and cells, capped at
/// [`MAX_COLUMN_WIDTH`].
pub fn column_widths(table: &Table) -> Vec<u16> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest_cell = table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.to_string().width())
                .max()
                .unwrap_or(0);
            (header.width().max(widest_cell) as u16).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Whether column `index` holds numbers in every row.
fn is_numeric_column(table: &Table, index: usize) -> bool {
    !table.rows.is_empty()
        && table
            .rows
            .iter()
            .all(|row| row.get(index).is_some_and(TableCell::is_numeric))
}

/// Number of data rows that fit in `area` once borders and header are drawn.
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(3) as usize
}

/// Render `table` into `area`, skipping the first `scroll` data rows.
pub fn render_table(frame: &mut Frame, area: Rect, table: &Table, scroll: usize, theme: &Theme) {
    if table.is_empty() {
        render_no_data(frame, area, &table.name, theme);
        return;
    }

    let numeric: Vec<bool> = (0..table.headers.len())
        .map(|i| is_numeric_column(table, i))
        .collect();
    let align = |i: usize| {
        if numeric[i] {
            Alignment::Right
        } else {
            Alignment::Left
        }
    };

    let header = Row::new(table.headers.iter().enumerate().map(|(i, h)| {
        Cell::from(Line::from(h.clone()).alignment(align(i))).style(theme.table_header)
    }))
    .height(1);

    let scroll = scroll.min(table.rows.len().saturating_sub(1));
    let rows: Vec<Row> = table
        .rows
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(n, row)| {
            let style = if n % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| Cell::from(Line::from(cell.to_string()).alignment(align(i)))),
            )
            .style(style)
        })
        .collect();

    let widths: Vec<Constraint> = column_widths(table)
        .into_iter()
        .map(Constraint::Length)
        .collect();

    let title = if scroll > 0 {
        format!(" {} ({}/{}) ", table.name, scroll + 1, table.rows.len())
    } else {
        format!(" {} ", table.name)
    };

    let widget = TableWidget::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(title),
        )
        .style(theme.text);

    frame.render_widget(widget, area);
}

/// Render a placeholder for a table without rows.
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No tasks to show", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check the activity window or the board export.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {title} ")),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
