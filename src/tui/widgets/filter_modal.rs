use ratatui::widgets::{Block, Borders, Paragraph, List, ListItem, ListState, Clear};
use ratatui::style::{Color, Style, Modifier};
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment, Constraint, Layout, Direction};
use ratatui::text::{Line, Span};
use crate::models::{Priority, Status};
use crate::tui::App;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};
use crate::tui::widgets::popup_area;
use crate::tui::app::{FilterFormField, FilterFormState};

struct Palette {
    fg: Color,
    bg: Color,
    highlight_fg: Color,
    highlight_bg: Color,
}

impl Palette {
    fn field_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.highlight_fg).bg(self.highlight_bg)
        } else {
            Style::default().fg(self.fg).bg(self.bg)
        }
    }
}

/// Filter popup: one selector per field plus Apply / Clear / Cancel
pub fn render_filter_modal(f: &mut Frame, area: Rect, app: &App) {
    let active_theme = app.config.get_active_theme();
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let palette = Palette {
        fg: parse_color(&active_theme.fg),
        bg: parse_color(&active_theme.bg),
        highlight_fg: get_contrast_text_color(highlight_bg),
        highlight_bg,
    };

    let popup_area = popup_area(area, 50, 70);
    f.render_widget(Clear, popup_area);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Filters")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(palette.fg).bg(palette.bg));
    let inner_area = outer_block.inner(popup_area);
    f.render_widget(outer_block, popup_area);

    let Some(ref state) = app.filter.form_state else {
        return;
    };

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Status: All + 3 options + borders
            Constraint::Length(6), // Priority
            Constraint::Min(0),
            Constraint::Length(5), // Buttons
        ])
        .split(inner_area);

    let status_options: Vec<&str> = std::iter::once("All").chain(Status::ALL.iter().map(|s| s.as_str())).collect();
    let priority_options: Vec<&str> = std::iter::once("All").chain(Priority::ALL.iter().map(|p| p.as_str())).collect();

    render_selector(f, vertical[0], "Status", &status_options, state.status_index,
        state.current_field == FilterFormField::Status, &palette);
    render_selector(f, vertical[1], "Priority", &priority_options, state.priority_index,
        state.current_field == FilterFormField::Priority, &palette);
    render_filter_buttons(f, vertical[3], state, &palette);
}

fn render_selector(
    f: &mut Frame,
    area: Rect,
    label: &str,
    options: &[&str],
    selected: usize,
    focused: bool,
    palette: &Palette,
) {
    let items: Vec<ListItem> = options.iter().enumerate().map(|(idx, opt)| {
        let radio = if idx == selected { "●" } else { "○" };
        ListItem::new(format!("{} {}", radio, opt))
    }).collect();

    let title = if focused { format!("> {}:", label) } else { format!("  {}:", label) };
    let list = List::new(items)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(palette.field_style(focused)))
        .highlight_style(Style::default().fg(palette.highlight_fg).bg(palette.highlight_bg).add_modifier(Modifier::BOLD));

    let mut list_state = ListState::default();
    list_state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_filter_buttons(f: &mut Frame, area: Rect, state: &FilterFormState, palette: &Palette) {
    let selected_index = match state.current_field {
        FilterFormField::Apply => Some(0),
        FilterFormField::Clear => Some(1),
        FilterFormField::Cancel => Some(2),
        _ => None,
    };

    let lines: Vec<Line> = ["Apply", "Clear", "Cancel"].iter().enumerate().map(|(index, button_text)| {
        let is_selected = selected_index == Some(index);
        let prefix = if is_selected { "> " } else { "  " };
        Line::from(Span::styled(format!("{}{}", prefix, button_text), palette.field_style(is_selected)))
    }).collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(if selected_index.is_some() { "> Actions" } else { "  Actions" })
            .style(palette.field_style(selected_index.is_some())))
        .style(Style::default().fg(palette.fg).bg(palette.bg))
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}
