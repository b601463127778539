use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Cell, Paragraph, Row as TableRow, Table};
use ratatui::{Frame, Terminal};
use std::fmt::Display;

use crate::error::{DashboardError, Result};
use crate::model::{HEADER, Row};

const COLUMN_SPACING: u16 = 2;

/// Draws each snapshot as a borderless, left-aligned table that replaces the screen.
pub struct TableRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TableRenderer<B> {
    pub fn new(backend: B) -> Result<Self> {
        let terminal = Terminal::new(backend).map_err(terminal_error)?;
        Ok(Self { terminal })
    }

    pub fn render(&mut self, rows: &[Row], notice: Option<&str>) -> Result<()> {
        check_shape(rows)?;

        self.terminal.clear().map_err(terminal_error)?;
        self.terminal
            .draw(|frame| draw_snapshot(frame, rows, notice))
            .map_err(terminal_error)?;
        Ok(())
    }

    pub fn show_cursor(&mut self) -> Result<()> {
        self.terminal.show_cursor().map_err(terminal_error)
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

fn terminal_error(error: impl Display) -> DashboardError {
    DashboardError::Terminal(error.to_string())
}

/// Every row must line up with the header before anything is drawn.
fn check_shape(rows: &[Row]) -> Result<()> {
    match rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != HEADER.len())
    {
        Some((index, row)) => Err(DashboardError::RowShape {
            index,
            expected: HEADER.len(),
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

fn draw_snapshot(frame: &mut Frame, rows: &[Row], notice: Option<&str>) {
    let area = frame.area();
    let table_area = match notice {
        Some(notice) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(0)])
                .split(area);
            frame.render_widget(
                Paragraph::new(notice.to_string())
                    .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                chunks[0],
            );
            chunks[1]
        }
        None => area,
    };

    draw_table(frame, table_area, rows);
}

/// Rows past the bottom of the screen are replaced by a `+N more` line.
fn draw_table(frame: &mut Frame, area: Rect, rows: &[Row]) {
    let widths = column_widths(rows);
    let capacity = usize::from(area.height.saturating_sub(1));
    let (area, rows) = if rows.len() > capacity && capacity > 0 {
        let shown = capacity - 1;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        frame.render_widget(
            Paragraph::new(format!("+{} more", rows.len() - shown))
                .style(Style::default().add_modifier(Modifier::DIM)),
            chunks[1],
        );
        (chunks[0], &rows[..shown])
    } else {
        (area, rows)
    };

    let header = TableRow::new(HEADER.iter().map(|title| {
        Cell::from(title.to_ascii_uppercase()).style(Style::default().add_modifier(Modifier::BOLD))
    }));

    let body = rows.iter().map(|row| {
        TableRow::new(row.fields().iter().map(|field| {
            Cell::from(Span::styled(
                field.text().to_string(),
                Style::default().fg(field.tint().color()),
            ))
        }))
    });

    let table = Table::new(body, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .flex(Flex::Start);
    frame.render_widget(table, area);
}

fn column_widths(rows: &[Row]) -> Vec<Constraint> {
    HEADER
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.field(index))
                .map(|field| field.text().chars().count())
                .max()
                .unwrap_or(0)
                .max(title.len());
            Constraint::Length(u16::try_from(widest).unwrap_or(u16::MAX))
        })
        .collect()
}
