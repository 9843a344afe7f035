use ratatui::widgets::{Block, Borders, Paragraph, Clear};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {}: Next tab\n", key(&kb.next_tab)));
    text.push_str(&format!("  {} / {} / {}: Tickets, Board, Statistics\n", key(&kb.tab_1), key(&kb.tab_2), key(&kb.tab_3)));
    text.push_str(&format!("  {} / {} or ↑/↓: Row or card up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {} / {} or ←/→: Column left/right\n", key(&kb.column_left), key(&kb.column_right)));
    text.push('\n');

    text.push_str("Tickets:\n");
    text.push_str(&format!("  {}: Edit cell (Status/Priority cycle)\n", key(&kb.edit)));
    text.push_str(&format!("  {} / {}: Previous/next Status or Priority\n", key(&kb.move_left), key(&kb.move_right)));
    text.push_str(&format!("  {}: Flag/unflag row for deletion\n", key(&kb.toggle_delete)));
    text.push_str(&format!("  {}: Delete flagged rows\n", key(&kb.apply_deletes)));
    text.push_str(&format!("  {}: New ticket\n", key(&kb.new)));
    text.push_str(&format!("  {}: Copy ticket ID\n", key(&kb.copy_id)));
    text.push('\n');

    text.push_str("Board:\n");
    text.push_str(&format!("  {} / {}: Move card to previous/next status\n", key(&kb.move_left), key(&kb.move_right)));
    text.push_str(&format!("  {}: Save moves (also saved when leaving the board)\n", key(&kb.save)));
    text.push('\n');

    text.push_str("Editing:\n");
    text.push_str("  Enter: Accept cell edit\n");
    text.push_str(&format!("  {}: Submit form\n", key(&kb.save)));
    text.push_str("  Tab / Shift+Tab: Next/previous field\n");
    text.push_str(&format!("  {} / {}: Undo, word navigation\n", key("Ctrl+z"), key("Ctrl+←/→")));
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Filters\n", key(&kb.filter)));
    text.push_str(&format!("  {}: Reload from store\n", key(&kb.refresh)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_text_uses_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.toggle_delete = "d".to_string();
        let text = build_help_text(&config);
        assert!(text.contains("  d: Flag/unflag row for deletion"));
        assert!(text.contains("Board:"));
    }
}
