use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table};
use ratatui::style::{Color, Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use crate::models::Ticket;
use crate::tui::App;
use crate::tui::app::{CellEdit, GridColumn};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color, priority_color, status_color};

const DELETE_MARKER: &str = "✗ ";
const INVALID_MARKER: &str = "! ";

fn column_width(column: GridColumn) -> Constraint {
    match column {
        GridColumn::Id => Constraint::Length(11),
        GridColumn::Description => Constraint::Min(20),
        GridColumn::Status => Constraint::Length(11),
        GridColumn::Priority => Constraint::Length(8),
        GridColumn::Submitted => Constraint::Length(10),
        GridColumn::Due => Constraint::Length(12),
    }
}

/// Description cells show the first line only, with a marker when more follow
fn description_cell(description: &str) -> String {
    let mut lines = description.lines();
    let first = lines.next().unwrap_or_default();
    if lines.next().is_some() {
        format!("{} ⏎", first)
    } else {
        first.to_string()
    }
}

fn ticket_row(ticket: &Ticket, flagged: bool) -> Row<'static> {
    let id_text = if flagged {
        format!("{}{}", DELETE_MARKER, ticket.id)
    } else {
        format!("  {}", ticket.id)
    };
    let id_style = if flagged {
        Style::default().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    let due_cell = if ticket.due_date.is_valid() {
        Cell::from(ticket.due_date.to_storage_string())
    } else {
        Cell::from(format!("{}{}", INVALID_MARKER, ticket.due_date))
            .style(Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD))
    };

    Row::new(vec![
        Cell::from(id_text).style(id_style),
        Cell::from(description_cell(&ticket.description)),
        Cell::from(ticket.status.as_str()).style(Style::default().fg(status_color(ticket.status))),
        Cell::from(ticket.priority.as_str()).style(Style::default().fg(priority_color(ticket.priority))),
        Cell::from(ticket.date_submitted.to_storage_string()),
        due_cell,
    ])
}

/// Editable ticket grid. Selection lives in `app.grid.table_state`.
pub fn render_ticket_table(f: &mut Frame, area: Rect, app: &mut App) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };

    let visible = app.visible_tickets();
    let visible_count = visible.len();
    let rows: Vec<Row<'static>> = visible
        .iter()
        .map(|ticket| ticket_row(ticket, app.delete_flags.contains(&ticket.id)))
        .collect();

    // Read-only columns are dimmed
    let header = Row::new(GridColumn::ALL.iter().map(|c| {
        let style = if c.is_editable() { Style::default() } else { Style::default().add_modifier(Modifier::DIM) };
        Cell::from(c.title()).style(style)
    }))
    .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let mut title = format!("Task tickets ({} of {})", visible_count, app.tickets.len());
    if !app.delete_flags.is_empty() {
        title.push_str(&format!(" | {} flagged", app.delete_flags.len()));
    }
    if !app.date_issues.is_empty() {
        title.push_str(&format!(" | {} invalid date(s)", app.date_issues.len()));
    }

    let table = Table::new(rows, GridColumn::ALL.map(column_width))
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg_color))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .cell_highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg))
        .column_spacing(1);

    f.render_stateful_widget(table, area, &mut app.grid.table_state);

    // Header row and borders take 3 lines
    let visible_rows = area.height.saturating_sub(3) as usize;
    if visible_count > visible_rows && area.height > 3 {
        let scrollbar_area = Rect::new(area.x + area.width.saturating_sub(1), area.y + 2, 1, visible_rows as u16);
        let mut scrollbar_state = ScrollbarState::new(visible_count)
            .viewport_content_length(visible_rows)
            .position(app.grid.selected_row);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }

    if let Some(edit) = app.grid.cell_edit.as_mut() {
        render_cell_editor(f, area, edit, fg_color, highlight_bg);
    }
}

/// Inline editor docked to the bottom of the grid
fn render_cell_editor(f: &mut Frame, area: Rect, edit: &mut CellEdit, fg_color: Color, border_color: Color) {
    let wanted = match edit.column {
        GridColumn::Description => (edit.editor.lines.len() as u16).clamp(1, 6) + 2,
        _ => 3,
    };
    let height = wanted.min(area.height);
    let editor_area = Rect::new(area.x, area.y + area.height - height, area.width, height);
    let inner_height = height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;

    edit.editor.update_scroll(inner_height, inner_width);
    let hint = match edit.column {
        GridColumn::Due => " (YYYY-MM-DD)",
        _ => "",
    };
    let title = format!("Edit {} of {}{} | Enter: accept | Esc: cancel", edit.column.title(), edit.ticket_id, hint);

    f.render_widget(Clear, editor_area);
    let paragraph = Paragraph::new(edit.editor.visible_lines(inner_height, inner_width).join("\n"))
        .style(Style::default().fg(fg_color))
        .block(Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title));
    f.render_widget(paragraph, editor_area);

    if let Some(position) = edit.editor.cursor_screen_pos(editor_area) {
        f.set_cursor_position(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_cell_marks_extra_lines() {
        assert_eq!(description_cell("Printer jammed"), "Printer jammed");
        assert_eq!(description_cell("Printer jammed\nsecond floor"), "Printer jammed ⏎");
        assert_eq!(description_cell(""), "");
    }
}
