use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use tracing::{debug, warn};
use crate::tui::app::{CreateField, FilterFormField, GridColumn, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::editor::Editor;
use crate::tui::App;
use crate::utils::{parse_key_binding, ParsedKeyBinding};

/// Guard that ensures terminal state is restored even on panic.
/// A terminal left in raw mode or on the alternate screen is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore explicitly on normal exit; the guard does nothing on drop afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already in a cleanup path, errors are ignored
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check the size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    if width < Layout::MIN_WIDTH || height < Layout::MIN_HEIGHT {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, Layout::MIN_WIDTH, Layout::MIN_HEIGHT
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        if event::poll(std::time::Duration::from_millis(16))? {
            match event::read()? {
                // Only Press events; Windows also reports Release
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    if handle_key_event(&mut app, key_event)? {
                        break;
                    }
                }
                // Size is re-read on the next draw
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    guard.restore()?;
    Ok(())
}

/// Returns true when the application should quit
fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match app.ui.mode {
        Mode::ConfirmDelete => handle_delete_confirmation_modal(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::Create => handle_create_mode(app, key_event),
        Mode::Filter => handle_filter_mode(app, key_event),
        Mode::EditCell => handle_cell_edit_mode(app, key_event),
        Mode::View => handle_global_key_bindings(app, key_event),
    }
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            app.modals.delete_modal_selection = 1 - app.modals.delete_modal_selection.min(1);
        }
        KeyCode::Enter => {
            if app.modals.delete_modal_selection == 0 {
                if let Err(e) = app.apply_deletes() {
                    app.set_status_message(format!("Failed to delete tickets: {}", e));
                }
            } else {
                app.cancel_delete_confirmation();
            }
        }
        KeyCode::Esc => app.cancel_delete_confirmation(),
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let help_binding = binding(&app.config.key_bindings.help)?;
    if key_event.code == KeyCode::Esc
        || key_event.code == KeyCode::Char('q')
        || matches_key_event(key_event, &help_binding)
    {
        app.exit_help_mode();
    }
    Ok(false)
}

fn handle_create_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let save_binding = binding(&app.config.key_bindings.save)?;
    if matches_key_event(key_event, &save_binding) {
        // Validation problems are reported by save_create_form itself
        if let Err(e) = app.save_create_form() {
            app.set_status_message(format!("Failed to submit ticket: {}", e));
        }
        return Ok(false);
    }

    let Some(current_field) = app.form.create_form.as_ref().map(|f| f.current_field) else {
        app.exit_create_mode();
        return Ok(false);
    };

    match key_event.code {
        KeyCode::Esc => {
            app.exit_create_mode();
            return Ok(false);
        }
        KeyCode::BackTab => {
            app.navigate_form_field(false);
            return Ok(false);
        }
        KeyCode::Tab => {
            app.navigate_form_field(!key_event.modifiers.contains(KeyModifiers::SHIFT));
            return Ok(false);
        }
        _ => {}
    }

    match current_field {
        CreateField::Priority => match key_event.code {
            KeyCode::Left | KeyCode::Up => app.cycle_form_priority(false),
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => app.cycle_form_priority(true),
            KeyCode::Enter => app.navigate_form_field(true),
            _ => {}
        },
        CreateField::DueDate if key_event.code == KeyCode::Enter => {
            if let Err(e) = app.save_create_form() {
                app.set_status_message(format!("Failed to submit ticket: {}", e));
            }
        }
        CreateField::Description | CreateField::DueDate => {
            if let Some(editor) = app.get_current_form_editor() {
                if key_event.code == KeyCode::Enter {
                    editor.insert_newline();
                } else {
                    handle_editor_key(editor, key_event);
                }
            }
        }
    }
    Ok(false)
}

fn handle_cell_edit_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.cancel_cell_edit(),
        KeyCode::Enter => {
            if let Err(e) = app.commit_cell_edit() {
                app.set_status_message(format!("Failed to save changes: {}", e));
            }
        }
        _ => {
            if let Some(edit) = app.grid.cell_edit.as_mut() {
                handle_editor_key(&mut edit.editor, key_event);
            }
        }
    }
    Ok(false)
}

/// Text editing keys shared by the form fields and the inline cell editor.
/// Other keys are ignored.
fn handle_editor_key(editor: &mut Editor, key_event: KeyEvent) {
    let ctrl = crate::utils::has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Char('z') if ctrl => {
            editor.undo();
        }
        KeyCode::Left if ctrl => editor.move_cursor_word_left(),
        KeyCode::Right if ctrl => editor.move_cursor_word_right(),
        KeyCode::Char(c) if !ctrl => editor.insert_char(c),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left => editor.move_cursor_left(),
        KeyCode::Right => editor.move_cursor_right(),
        KeyCode::Up => editor.move_cursor_up(),
        KeyCode::Down => editor.move_cursor_down(),
        KeyCode::Home => editor.move_cursor_home(),
        KeyCode::End => editor.move_cursor_end(),
        _ => {}
    }
}

fn handle_filter_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let Some(current_field) = app.filter.form_state.as_ref().map(|s| s.current_field) else {
        app.exit_filter_mode();
        return Ok(false);
    };

    match key_event.code {
        KeyCode::Esc => app.exit_filter_mode(),
        KeyCode::BackTab => app.navigate_filter_field(false),
        KeyCode::Tab => app.navigate_filter_field(!key_event.modifiers.contains(KeyModifiers::SHIFT)),
        KeyCode::Enter => match current_field {
            FilterFormField::Apply => app.apply_filters(),
            FilterFormField::Clear => app.clear_filters(),
            FilterFormField::Cancel => app.exit_filter_mode(),
            FilterFormField::Status | FilterFormField::Priority => app.navigate_filter_field(true),
        },
        KeyCode::Left | KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('h') => app.cycle_filter_value(false),
        KeyCode::Right | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('l') | KeyCode::Char(' ') => {
            app.cycle_filter_value(true)
        }
        _ => {}
    }
    Ok(false)
}

fn handle_global_key_bindings(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let bindings = app.config.key_bindings.clone();

    if matches_key_event(key_event, &binding(&bindings.quit)?) {
        // Unsaved board moves are written before leaving
        return match app.commit_board() {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "failed to persist board moves on quit");
                app.set_status_message(format!("Failed to save board moves: {}", e));
                Ok(false)
            }
        };
    }

    if matches_key_event(key_event, &binding(&bindings.help)?) {
        app.enter_help_mode();
        return Ok(false);
    }

    // Tab navigation
    let tab_target = if matches_key_event(key_event, &binding(&bindings.next_tab)?) {
        Some(app.ui.current_tab.next())
    } else if matches_key_event(key_event, &binding(&bindings.tab_1)?) {
        Some(Tab::Tickets)
    } else if matches_key_event(key_event, &binding(&bindings.tab_2)?) {
        Some(Tab::Board)
    } else if matches_key_event(key_event, &binding(&bindings.tab_3)?) {
        Some(Tab::Statistics)
    } else {
        None
    };
    if let Some(tab) = tab_target {
        if let Err(e) = app.switch_tab(tab) {
            app.set_status_message(format!("Failed to save board moves: {}", e));
        }
        return Ok(false);
    }

    if matches_key_event(key_event, &binding(&bindings.new)?) {
        app.enter_create_mode();
        return Ok(false);
    }

    if matches_key_event(key_event, &binding(&bindings.filter)?) {
        app.enter_filter_mode();
        return Ok(false);
    }

    if matches_key_event(key_event, &binding(&bindings.refresh)?) {
        if let Err(e) = app.refresh() {
            app.set_status_message(format!("Failed to reload tickets: {}", e));
        }
        return Ok(false);
    }

    if matches_key_event(key_event, &binding(&bindings.copy_id)?) {
        copy_selected_id(app);
        return Ok(false);
    }

    match app.ui.current_tab {
        Tab::Tickets => handle_grid_keys(app, key_event, &bindings)?,
        Tab::Board => handle_board_keys(app, key_event, &bindings)?,
        Tab::Statistics => {}
    }

    Ok(false)
}

fn handle_grid_keys(
    app: &mut App,
    key_event: KeyEvent,
    bindings: &crate::config::KeyBindings,
) -> Result<(), TuiError> {
    let code = key_event.code;

    if code == KeyCode::Up || matches_key_event(key_event, &binding(&bindings.list_up)?) {
        app.move_selection_up();
    } else if code == KeyCode::Down || matches_key_event(key_event, &binding(&bindings.list_down)?) {
        app.move_selection_down();
    } else if code == KeyCode::PageUp {
        app.move_selection_by(-10);
    } else if code == KeyCode::PageDown {
        app.move_selection_by(10);
    } else if code == KeyCode::Left || matches_key_event(key_event, &binding(&bindings.column_left)?) {
        app.move_column(false);
    } else if code == KeyCode::Right || matches_key_event(key_event, &binding(&bindings.column_right)?) {
        app.move_column(true);
    } else if matches_key_event(key_event, &binding(&bindings.edit)?) {
        if let Err(e) = app.activate_cell() {
            app.set_status_message(format!("Failed to save changes: {}", e));
        }
    } else if matches_key_event(key_event, &binding(&bindings.move_left)?)
        || matches_key_event(key_event, &binding(&bindings.move_right)?)
    {
        let forward = matches_key_event(key_event, &binding(&bindings.move_right)?);
        match app.selected_column() {
            GridColumn::Status | GridColumn::Priority => {
                if let Err(e) = app.cycle_cell(forward) {
                    app.set_status_message(format!("Failed to save changes: {}", e));
                }
            }
            column => app.set_status_message(format!("{} has no options to cycle", column.title())),
        }
    } else if matches_key_event(key_event, &binding(&bindings.toggle_delete)?) {
        app.toggle_delete_flag();
    } else if matches_key_event(key_event, &binding(&bindings.apply_deletes)?) {
        app.request_apply_deletes();
    } else if matches_key_event(key_event, &binding(&bindings.save)?) {
        match app.persist_edits() {
            Ok(true) => {}
            Ok(false) => app.set_status_message("No unsaved changes".to_string()),
            Err(e) => app.set_status_message(format!("Failed to save changes: {}", e)),
        }
    }
    Ok(())
}

fn handle_board_keys(
    app: &mut App,
    key_event: KeyEvent,
    bindings: &crate::config::KeyBindings,
) -> Result<(), TuiError> {
    let code = key_event.code;

    if code == KeyCode::Up || matches_key_event(key_event, &binding(&bindings.list_up)?) {
        app.board_select_card(false);
    } else if code == KeyCode::Down || matches_key_event(key_event, &binding(&bindings.list_down)?) {
        app.board_select_card(true);
    } else if code == KeyCode::Left || matches_key_event(key_event, &binding(&bindings.column_left)?) {
        app.board_select_column(false);
    } else if code == KeyCode::Right || matches_key_event(key_event, &binding(&bindings.column_right)?) {
        app.board_select_column(true);
    } else if matches_key_event(key_event, &binding(&bindings.move_left)?) {
        app.board_move(false);
    } else if matches_key_event(key_event, &binding(&bindings.move_right)?) {
        app.board_move(true);
    } else if matches_key_event(key_event, &binding(&bindings.save)?) {
        match app.commit_board() {
            Ok(0) => app.set_status_message("No unsaved board moves".to_string()),
            Ok(_) => {}
            Err(e) => app.set_status_message(format!("Failed to save board moves: {}", e)),
        }
    }
    Ok(())
}

fn copy_selected_id(app: &mut App) {
    let id = match app.ui.current_tab {
        Tab::Board => app.selected_card().map(|t| t.id.clone()),
        _ => app.selected_ticket().map(|t| t.id.clone()),
    };
    let Some(id) = id else {
        return;
    };

    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(id.clone())) {
        Ok(()) => app.set_status_message(format!("Copied {} to clipboard", id)),
        Err(e) => {
            debug!(error = %e, "clipboard unavailable");
            app.set_status_message(format!("Failed to copy to clipboard: {}", e));
        }
    }
}

fn binding(key_str: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key_str).map_err(TuiError::KeyBindingError)
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Primary modifier: Ctrl on Windows/Linux, Option/Alt on macOS
    let has_primary_mod = crate::utils::has_primary_modifier(key_event.modifiers);
    if binding.requires_ctrl != has_primary_mod {
        return false;
    }
    binding.key_code == key_event.code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteTicketStore, TicketStore};
    use crate::{Config, Status};

    fn create_test_app() -> App {
        let store = SqliteTicketStore::in_memory().unwrap();
        App::new(Config::default(), Box::new(store)).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    #[test]
    fn test_matches_key_event_requires_modifier() {
        let save = parse_key_binding("Ctrl+s").unwrap();
        assert!(matches_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), &save));
        assert!(!matches_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE), &save));
    }

    #[test]
    fn test_editor_keys_edit_and_ignore_the_rest() {
        let mut editor = Editor::single_line("2025-08-15");
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

        handle_editor_key(&mut editor, key(KeyCode::End));
        handle_editor_key(&mut editor, key(KeyCode::Backspace));
        handle_editor_key(&mut editor, key(KeyCode::Char('6')));
        handle_editor_key(&mut editor, key(KeyCode::F(5)));
        handle_editor_key(&mut editor, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(editor.lines, vec!["2025-08-16".to_string()]);
    }

    #[test]
    fn test_quit_key() {
        let mut app = create_test_app();
        assert!(!press(&mut app, KeyCode::Char('j')));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_create_form_through_keys() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ui.mode, Mode::Create);

        for c in "Reset password".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        // Enter on the due date submits with the default date
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.ui.mode, Mode::View);
        let created = app.tickets.iter().find(|t| t.id == "Task-1101").unwrap();
        assert_eq!(created.description, "Reset password");
        assert_eq!(created.status, Status::Open);
        assert_eq!(created.due_date.to_storage_string(), "2025-08-15");
    }

    #[test]
    fn test_flag_and_confirm_delete_through_keys() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.delete_flags.len(), 2);

        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.ui.mode, Mode::View);
        let ids: Vec<String> = app.store.fetch_all().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 98);
        assert!(!ids.contains(&"Task-1100".to_string()));
        assert!(!ids.contains(&"Task-1099".to_string()));
    }

    #[test]
    fn test_escape_cancels_cell_edit() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, Mode::EditCell);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.mode, Mode::View);
        assert!(!app.has_unsaved_changes());
    }
}
