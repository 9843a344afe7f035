use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use crate::models::{Status, Ticket};
use crate::tui::App;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color, priority_color, status_color};

fn truncate(text: &str, max_width: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max_width {
        flat.chars().take(max_width.saturating_sub(3)).collect::<String>() + "..."
    } else {
        flat
    }
}

fn card(ticket: &Ticket, max_width: usize, pending: bool) -> ListItem<'static> {
    let marker = if pending { "* " } else { "" };
    let header = Line::from(vec![
        Span::styled(format!("{}{}", marker, ticket.id), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(ticket.priority.as_str(), Style::default().fg(priority_color(ticket.priority))),
    ]);
    ListItem::new(vec![
        header,
        Line::from(truncate(&ticket.description, max_width)),
        Line::from(Span::styled(
            format!("due {}", ticket.due_date),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
}

/// One column per status. Cards marked `*` have moved since the last save.
pub fn render_board(f: &mut Frame, area: Rect, app: &App) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);

    if app.visible_tickets().is_empty() {
        let paragraph = Paragraph::new("No tickets match the current filters")
            .block(Block::default().borders(Borders::ALL).title("Board"))
            .style(Style::default().fg(fg_color));
        f.render_widget(paragraph, area);
        return;
    }

    let column_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(area);

    let columns = app.board_columns();
    for (index, status) in Status::ALL.iter().enumerate() {
        let column_area = column_areas[index];
        let is_selected_column = index == app.board.selected_column;
        let max_width = column_area.width.saturating_sub(2) as usize;

        let items: Vec<ListItem> = columns[index]
            .iter()
            .map(|t| card(t, max_width, app.board.pending_moves.contains_key(&t.id)))
            .collect();

        let border_style = if is_selected_column {
            Style::default().fg(status_color(*status)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(fg_color)
        };
        let title = Span::styled(
            format!(" {} ({}) ", status, columns[index].len()),
            Style::default().fg(status_color(*status)).add_modifier(Modifier::BOLD),
        );

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(border_style).title(title))
            .style(Style::default().fg(fg_color))
            .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

        let mut list_state = ListState::default();
        if is_selected_column && !columns[index].is_empty() {
            list_state.select(Some(app.board.selected_card));
        }
        f.render_stateful_widget(list, column_area, &mut list_state);
    }
}
