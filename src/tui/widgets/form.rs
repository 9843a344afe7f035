use ratatui::widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::style::{Style, Modifier};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect, Constraint, Layout, Direction};
use ratatui::text::{Line, Span};
use crate::Config;
use crate::models::Priority;
use crate::tui::app::{CreateForm, CreateField};
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color, priority_color};
use crate::tui::widgets::popup_area;

/// Add-ticket popup. Scroll offsets of the editors are updated for the
/// field sizes of this frame, so the form is taken mutably.
pub fn render_create_form(f: &mut Frame, area: Rect, form: &mut CreateForm, config: &Config) {
    let popup_area = popup_area(area, 60, 60);
    if popup_area.width < 10 || popup_area.height < 11 {
        return;
    }
    f.render_widget(Clear, popup_area);

    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };
    let highlight_style = Style::default().bg(highlight_bg).fg(highlight_fg);
    let inactive_field_style = Style::default().fg(fg_color).add_modifier(Modifier::DIM);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Add a ticket")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    let inner_area = outer_block.inner(popup_area);
    f.render_widget(outer_block, popup_area);

    // Single-line fields take 3 lines (borders + content); the description gets the rest
    let field_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Description
            Constraint::Length(3), // Priority
            Constraint::Length(3), // Due date
        ])
        .split(inner_area);

    let style_for = |field: CreateField| {
        if form.current_field == field { highlight_style } else { inactive_field_style }
    };
    let desc_style = style_for(CreateField::Description);
    let priority_style = style_for(CreateField::Priority);
    let date_style = style_for(CreateField::DueDate);

    render_description(f, field_areas[0], &mut form.description, desc_style);
    render_priority_selector(f, field_areas[1], form.priority, priority_style);

    let date_area = field_areas[2];
    let date_width = date_area.width.saturating_sub(2) as usize;
    form.due_date.update_scroll(1, date_width);
    let date_paragraph = Paragraph::new(form.due_date.visible_lines(1, date_width).join(""))
        .style(date_style)
        .block(Block::default().borders(Borders::ALL).title("Due date (YYYY-MM-DD)"));
    f.render_widget(date_paragraph, date_area);

    let cursor = match form.current_field {
        CreateField::Description => form.description.cursor_screen_pos(field_areas[0]),
        CreateField::DueDate => form.due_date.cursor_screen_pos(date_area),
        CreateField::Priority => None,
    };
    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}

fn render_description(f: &mut Frame, area: Rect, editor: &mut Editor, style: Style) {
    let content_height = area.height.saturating_sub(2) as usize;
    let content_width = area.width.saturating_sub(2) as usize;
    editor.update_scroll(content_height, content_width);

    let lines: Vec<Line> = editor
        .visible_lines(content_height, content_width)
        .into_iter()
        .map(Line::from)
        .collect();
    let paragraph = Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Description of issue"));
    f.render_widget(paragraph, area);

    if editor.lines.len() > content_height && content_height > 0 {
        let scrollbar_area = Rect::new(area.x + area.width.saturating_sub(1), area.y + 1, 1, content_height as u16);
        let mut scrollbar_state = ScrollbarState::new(editor.lines.len())
            .viewport_content_length(content_height)
            .position(editor.scroll_offset);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn render_priority_selector(f: &mut Frame, area: Rect, selected: Priority, style: Style) {
    let mut spans = vec![Span::raw("< ")];
    for (i, priority) in Priority::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let span_style = if *priority == selected {
            Style::default().fg(priority_color(*priority)).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(priority.as_str(), span_style));
    }
    spans.push(Span::raw(" >"));

    let paragraph = Paragraph::new(Line::from(spans))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Priority"));
    f.render_widget(paragraph, area);
}
