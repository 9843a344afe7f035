use ratatui::Frame;
use ratatui::widgets::{Block, Borders};
use ratatui::style::Style;
use ratatui::layout::Alignment;
use crate::tui::{App, Layout};
use crate::tui::app::{CreateField, Mode, Tab};
use crate::tui::widgets::{
    board::render_board,
    charts::render_statistics,
    color::parse_color,
    confirm_delete::render_confirm_delete,
    filter_modal::render_filter_modal,
    filters_box::render_filters_box,
    form::render_create_form,
    help::render_help,
    status_bar::render_status_bar,
    tabs::render_tabs,
    ticket_table::render_ticket_table,
};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Task Tickets")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    // Tabs take one line without a block; the content below carries the border
    render_tabs(f, layout.tabs_area, app.ui.current_tab, app.board.pending_moves.len(), &app.config);

    match app.ui.current_tab {
        Tab::Tickets => render_ticket_table(f, layout.main_area, app),
        Tab::Board => render_board(f, layout.main_area, app),
        Tab::Statistics => render_statistics(f, layout.main_area, &app.tickets, &app.config),
    }

    render_filters_box(f, layout.filters_area, &app.get_filter_summary(), &app.config);

    // Popups go over the normal content
    match app.ui.mode {
        Mode::Create => {
            if let Some(form) = app.form.create_form.as_mut() {
                render_create_form(f, layout.inner_area, form, &app.config);
            }
        }
        Mode::Filter => render_filter_modal(f, layout.inner_area, app),
        Mode::ConfirmDelete => render_confirm_delete(
            f,
            layout.inner_area,
            &app.delete_flags,
            app.modals.delete_modal_selection,
            &app.config,
        ),
        Mode::Help => render_help(f, layout.inner_area, &app.config),
        Mode::View | Mode::EditCell => {}
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&kb.help))],
        Mode::EditCell => vec![
            "Enter: Accept".to_string(),
            "Esc: Cancel".to_string(),
            format!("{}: Undo", key("Ctrl+z")),
        ],
        Mode::Create => {
            let on_description = app
                .form
                .create_form
                .as_ref()
                .is_some_and(|form| form.current_field == CreateField::Description);
            let mut hints = vec![
                "Tab: Next field".to_string(),
                "Shift+Tab: Previous field".to_string(),
                format!("{}: Submit", key(&kb.save)),
            ];
            if on_description {
                hints.push("Enter: New line".to_string());
            }
            hints.push("Esc: Cancel".to_string());
            hints
        }
        Mode::Filter => vec![
            "Tab/Shift+Tab: Navigate fields".to_string(),
            "←/→: Change option".to_string(),
            "Enter: Select".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::ConfirmDelete => vec![
            "↑/↓: Choose".to_string(),
            "Enter: Confirm".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => {
            let mut hints = vec![format!("{}: Quit", key(&kb.quit)), format!("{}: New", key(&kb.new))];
            match app.ui.current_tab {
                Tab::Tickets => {
                    hints.push(format!("{}: Edit", key(&kb.edit)));
                    hints.push(format!("{}: Flag delete", key(&kb.toggle_delete)));
                    hints.push(format!("{}: Delete flagged", key(&kb.apply_deletes)));
                }
                Tab::Board => {
                    hints.push(format!("{}/{}: Move card", key(&kb.move_left), key(&kb.move_right)));
                    hints.push(format!("{}: Save moves", key(&kb.save)));
                }
                Tab::Statistics => {}
            }
            hints.push(format!("{}: Filters", key(&kb.filter)));
            hints.push(format!("{}: Reload", key(&kb.refresh)));
            hints.push(format!("{}: Help", key(&kb.help)));
            hints
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteTicketStore;
    use crate::Config;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::Terminal;

    fn create_test_app() -> App {
        let store = SqliteTicketStore::in_memory().unwrap();
        App::new(Config::default(), Box::new(store)).unwrap()
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|f| {
                let layout = Layout::calculate(Rect::new(0, 0, 120, 40));
                render(f, app, &layout);
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_render_every_tab() {
        let mut app = create_test_app();
        let screen = draw(&mut app);
        assert!(screen.contains("Task Tickets"));
        assert!(screen.contains("Task-1100"));

        app.switch_tab(Tab::Board).unwrap();
        let screen = draw(&mut app);
        assert!(screen.contains("In Progress"));

        app.switch_tab(Tab::Statistics).unwrap();
        let screen = draw(&mut app);
        assert!(screen.contains("Number of open task tickets"));
        assert!(screen.contains("Task ticket status per month"));
    }

    #[test]
    fn test_render_popups() {
        let mut app = create_test_app();
        app.enter_create_mode();
        assert!(draw(&mut app).contains("Add a ticket"));
        app.exit_create_mode();

        app.toggle_delete_flag();
        app.request_apply_deletes();
        assert!(draw(&mut app).contains("Confirm Delete"));
    }

    #[test]
    fn test_key_hints_follow_tab() {
        let mut app = create_test_app();
        assert!(get_key_hints(&app).iter().any(|h| h == "x: Flag delete"));
        app.ui.current_tab = Tab::Board;
        assert!(get_key_hints(&app).iter().any(|h| h == "H/L: Move card"));
    }
}
