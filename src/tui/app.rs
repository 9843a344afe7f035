use crate::Config;
use crate::models::{CreateTicketRequest, DateCell, Priority, Status, Ticket, TicketFilter, format_date, parse_date};
use crate::store::{DateIssue, StoreError, TicketStore, normalize_due_dates};
use crate::tui::widgets::editor::Editor;
use ratatui::widgets::TableState;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tickets,
    Board,
    Statistics,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Tickets, Tab::Board, Tab::Statistics];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Tickets => "Tickets",
            Tab::Board => "Board",
            Tab::Statistics => "Statistics",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Tickets => 0,
            Tab::Board => 1,
            Tab::Statistics => 2,
        }
    }

    pub fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    EditCell,
    Create,
    Filter,
    Help,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridColumn {
    Id,
    Description,
    Status,
    Priority,
    Submitted,
    Due,
}

impl GridColumn {
    pub const ALL: [GridColumn; 6] = [
        GridColumn::Id,
        GridColumn::Description,
        GridColumn::Status,
        GridColumn::Priority,
        GridColumn::Submitted,
        GridColumn::Due,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            GridColumn::Id => "ID",
            GridColumn::Description => "Description",
            GridColumn::Status => "Status",
            GridColumn::Priority => "Priority",
            GridColumn::Submitted => "Submitted",
            GridColumn::Due => "Due",
        }
    }

    /// ID and submitted date never change after creation
    pub fn is_editable(&self) -> bool {
        !matches!(self, GridColumn::Id | GridColumn::Submitted)
    }
}

/// Text cell being edited in the grid
#[derive(Debug, Clone)]
pub struct CellEdit {
    pub ticket_id: String,
    pub column: GridColumn,
    pub editor: Editor,
}

#[derive(Debug, Clone, Default)]
pub struct GridState {
    pub selected_row: usize,
    pub selected_col: usize,
    pub table_state: TableState,
    pub cell_edit: Option<CellEdit>,
}

#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pub selected_column: usize,
    pub selected_card: usize,
    /// Status changes made on the board and not yet written to the store
    pub pending_moves: BTreeMap<String, Status>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFormField {
    Status,
    Priority,
    Apply,
    Clear,
    Cancel,
}

impl FilterFormField {
    const ORDER: [FilterFormField; 5] = [
        FilterFormField::Status,
        FilterFormField::Priority,
        FilterFormField::Apply,
        FilterFormField::Clear,
        FilterFormField::Cancel,
    ];
}

/// Filter popup selections. Index 0 is "All", 1.. map onto the enum's `ALL` order.
#[derive(Debug, Clone)]
pub struct FilterFormState {
    pub current_field: FilterFormField,
    pub status_index: usize,
    pub priority_index: usize,
}

impl FilterFormState {
    pub const OPTION_COUNT: usize = 4;

    fn from_filter(filter: &TicketFilter) -> Self {
        Self {
            current_field: FilterFormField::Status,
            status_index: filter.status.map(|s| s.index() + 1).unwrap_or(0),
            priority_index: filter.priority.map(|p| p.index() + 1).unwrap_or(0),
        }
    }

    pub fn to_filter(&self) -> TicketFilter {
        TicketFilter {
            status: self.status_index.checked_sub(1).and_then(|i| Status::ALL.get(i).copied()),
            priority: self.priority_index.checked_sub(1).and_then(|i| Priority::ALL.get(i).copied()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub active: TicketFilter,
    pub form_state: Option<FilterFormState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateField {
    Description,
    Priority,
    DueDate,
}

#[derive(Debug, Clone)]
pub struct CreateForm {
    pub current_field: CreateField,
    pub description: Editor,
    pub priority: Priority,
    pub due_date: Editor,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub create_form: Option<CreateForm>,
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    /// 0 = Delete, 1 = Cancel
    pub delete_modal_selection: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_tab: Tab::Tickets,
            mode: Mode::View,
        }
    }
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub store: Box<dyn TicketStore>,

    /// Working set: every ticket, most recent first
    pub tickets: Vec<Ticket>,
    /// The working set as last fetched; edits are detected against it
    snapshot: Vec<Ticket>,
    pub date_issues: Vec<DateIssue>,
    pub delete_flags: BTreeSet<String>,

    // Grouped state
    pub ui: UiState,
    pub grid: GridState,
    pub board: BoardState,
    pub filter: FilterState,
    pub form: FormState,
    pub modals: ModalState,
    pub status: StatusState,
}

impl App {
    pub fn new(config: Config, store: Box<dyn TicketStore>) -> Result<Self, StoreError> {
        let mut app = Self {
            config,
            store,
            tickets: Vec::new(),
            snapshot: Vec::new(),
            date_issues: Vec::new(),
            delete_flags: BTreeSet::new(),
            ui: UiState::default(),
            grid: GridState::default(),
            board: BoardState::default(),
            filter: FilterState::default(),
            form: FormState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
        };

        app.load_data()?;
        Ok(app)
    }

    /// Replace the working set with a fresh fetch. Unsaved board moves are dropped.
    pub fn load_data(&mut self) -> Result<(), StoreError> {
        let mut tickets = self.store.fetch_all()?;
        self.date_issues = normalize_due_dates(&mut tickets);
        self.snapshot = tickets.clone();
        self.tickets = tickets;
        self.board.pending_moves.clear();

        // Flags on tickets that no longer exist are meaningless
        self.delete_flags.retain(|id| self.tickets.iter().any(|t| &t.id == id));
        self.clamp_selection();

        if let Some(first) = self.date_issues.first() {
            self.set_status_message(format!(
                "{} ticket(s) have an invalid due date (first: {} '{}')",
                self.date_issues.len(),
                first.id,
                first.value
            ));
        }
        debug!(count = self.tickets.len(), "working set loaded");
        Ok(())
    }

    /// Re-fetch on request, discarding unsaved board moves
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        self.load_data()?;
        if self.date_issues.is_empty() {
            self.set_status_message(format!("Reloaded {} tickets", self.tickets.len()));
        }
        Ok(())
    }

    pub fn visible_tickets(&self) -> Vec<&Ticket> {
        self.tickets.iter().filter(|t| self.filter.active.matches(t)).collect()
    }

    fn visible_count(&self) -> usize {
        self.tickets.iter().filter(|t| self.filter.active.matches(t)).count()
    }

    pub fn selected_ticket(&self) -> Option<&Ticket> {
        self.tickets
            .iter()
            .filter(|t| self.filter.active.matches(t))
            .nth(self.grid.selected_row)
    }

    fn ticket_mut(&mut self, id: &str) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| t.id == id)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.tickets.len() != self.snapshot.len()
            || self.tickets.iter().zip(&self.snapshot).any(|(a, b)| !a.same_content(b))
    }

    /// Write the whole working set and reload it. On failure the working set
    /// goes back to the last fetched state.
    fn write_working_set(&mut self) -> Result<(), StoreError> {
        if let Err(e) = self.store.replace_all(&self.tickets) {
            self.tickets = self.snapshot.clone();
            self.board.pending_moves.clear();
            return Err(e);
        }
        self.load_data()
    }

    /// Persist grid edits when the working set differs from the last fetch.
    /// Returns whether anything was written.
    pub fn persist_edits(&mut self) -> Result<bool, StoreError> {
        if !self.has_unsaved_changes() {
            return Ok(false);
        }
        self.write_working_set()?;
        info!(count = self.tickets.len(), "persisted grid edits");
        self.set_status_message("Changes saved.".to_string());
        Ok(true)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_count();
        self.grid.selected_row = self.grid.selected_row.min(len.saturating_sub(1));
        self.grid.selected_col = self.grid.selected_col.min(GridColumn::ALL.len() - 1);
        self.sync_table_state();

        self.board.selected_column = self.board.selected_column.min(Status::ALL.len() - 1);
        let cards = self.board_columns()[self.board.selected_column].len();
        self.board.selected_card = self.board.selected_card.min(cards.saturating_sub(1));
    }

    pub fn sync_table_state(&mut self) {
        self.grid.table_state.select(Some(self.grid.selected_row));
        self.grid.table_state.select_column(Some(self.grid.selected_col));
    }

    pub fn move_selection_up(&mut self) {
        if self.grid.selected_row > 0 {
            self.grid.selected_row -= 1;
            self.sync_table_state();
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.grid.selected_row + 1 < self.visible_count() {
            self.grid.selected_row += 1;
            self.sync_table_state();
        }
    }

    pub fn move_selection_by(&mut self, delta: isize) {
        let last = self.visible_count().saturating_sub(1) as isize;
        self.grid.selected_row = (self.grid.selected_row as isize + delta).clamp(0, last.max(0)) as usize;
        self.sync_table_state();
    }

    pub fn move_column(&mut self, forward: bool) {
        let last = GridColumn::ALL.len() - 1;
        self.grid.selected_col = if forward {
            (self.grid.selected_col + 1).min(last)
        } else {
            self.grid.selected_col.saturating_sub(1)
        };
        self.sync_table_state();
    }

    pub fn selected_column(&self) -> GridColumn {
        GridColumn::ALL[self.grid.selected_col.min(GridColumn::ALL.len() - 1)]
    }

    /// Edit the selected cell: status and priority cycle in place,
    /// description and due date open the inline editor.
    pub fn activate_cell(&mut self) -> Result<(), StoreError> {
        let column = self.selected_column();
        let Some(ticket) = self.selected_ticket() else {
            return Ok(());
        };

        let ticket_id = ticket.id.clone();
        let editor = match column {
            GridColumn::Description => Editor::from_string(ticket.description.clone()),
            GridColumn::Due => Editor::single_line(&ticket.due_date.to_storage_string()),
            GridColumn::Status | GridColumn::Priority => return self.cycle_cell(true),
            GridColumn::Id | GridColumn::Submitted => {
                self.set_status_message(format!("{} is read-only", column.title()));
                return Ok(());
            }
        };

        self.grid.cell_edit = Some(CellEdit {
            ticket_id,
            column,
            editor,
        });
        self.ui.mode = Mode::EditCell;
        Ok(())
    }

    /// Step the selected status or priority cell to the next/previous option and persist
    pub fn cycle_cell(&mut self, forward: bool) -> Result<(), StoreError> {
        let column = self.selected_column();
        let Some(id) = self.selected_ticket().map(|t| t.id.clone()) else {
            return Ok(());
        };
        let Some(ticket) = self.ticket_mut(&id) else {
            return Ok(());
        };

        match column {
            GridColumn::Status => {
                ticket.status = if forward { ticket.status.next() } else { ticket.status.prev() };
            }
            GridColumn::Priority => {
                ticket.priority = if forward { ticket.priority.next() } else { ticket.priority.prev() };
            }
            _ => return Ok(()),
        }
        self.persist_edits().map(|_| ())
    }

    /// Accept the inline edit. Invalid input keeps the editor open with a message.
    pub fn commit_cell_edit(&mut self) -> Result<(), StoreError> {
        let Some(edit) = self.grid.cell_edit.take() else {
            self.ui.mode = Mode::View;
            return Ok(());
        };
        let text = edit.editor.to_string();

        let update = match edit.column {
            GridColumn::Description => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Err("Description is required".to_string())
                } else {
                    Ok(CellValue::Description(trimmed.to_string()))
                }
            }
            GridColumn::Due => parse_date(&text)
                .map(CellValue::Due)
                .map_err(|_| format!("Invalid date '{}' (expected YYYY-MM-DD)", text.trim())),
            _ => Err(format!("{} is read-only", edit.column.title())),
        };

        let value = match update {
            Ok(value) => value,
            Err(message) => {
                self.set_status_message(message);
                self.grid.cell_edit = Some(edit);
                return Ok(());
            }
        };

        self.ui.mode = Mode::View;
        if let Some(ticket) = self.ticket_mut(&edit.ticket_id) {
            match value {
                CellValue::Description(description) => ticket.description = description,
                CellValue::Due(date) => ticket.due_date = DateCell::Date(date),
            }
        }
        self.persist_edits().map(|_| ())
    }

    pub fn cancel_cell_edit(&mut self) {
        self.grid.cell_edit = None;
        self.ui.mode = Mode::View;
    }

    pub fn toggle_delete_flag(&mut self) {
        let Some(id) = self.selected_ticket().map(|t| t.id.clone()) else {
            return;
        };
        if !self.delete_flags.remove(&id) {
            self.delete_flags.insert(id);
        }
    }

    /// Ask for confirmation before deleting the flagged tickets
    pub fn request_apply_deletes(&mut self) {
        if self.delete_flags.is_empty() {
            self.set_status_message("No tickets flagged for deletion".to_string());
            return;
        }
        self.modals.delete_modal_selection = 0;
        self.ui.mode = Mode::ConfirmDelete;
    }

    pub fn cancel_delete_confirmation(&mut self) {
        self.ui.mode = Mode::View;
    }

    /// Delete every flagged ticket, then reload. Returns the number of rows removed.
    pub fn apply_deletes(&mut self) -> Result<usize, StoreError> {
        self.ui.mode = Mode::View;
        let ids: Vec<String> = std::mem::take(&mut self.delete_flags).into_iter().collect();

        let mut removed = 0;
        for (i, id) in ids.iter().enumerate() {
            match self.store.delete_one(id) {
                Ok(n) => removed += n,
                Err(e) => {
                    // Keep the not-yet-deleted ones flagged
                    self.delete_flags.extend(ids[i..].iter().cloned());
                    if let Err(reload) = self.load_data() {
                        warn!(error = %reload, "reload after failed delete also failed");
                    }
                    return Err(e);
                }
            }
        }

        self.load_data()?;
        info!(removed, "applied delete flags");
        self.set_status_message(format!("Deleted {} ticket(s)", removed));
        Ok(removed)
    }

    pub fn enter_create_mode(&mut self) {
        self.form.create_form = Some(CreateForm {
            current_field: CreateField::Description,
            description: Editor::new(),
            priority: Priority::High,
            due_date: Editor::single_line(&format_date(self.config.default_due_date())),
        });
        self.ui.mode = Mode::Create;
    }

    pub fn exit_create_mode(&mut self) {
        self.form.create_form = None;
        self.ui.mode = Mode::View;
    }

    pub fn navigate_form_field(&mut self, forward: bool) {
        if let Some(ref mut form) = self.form.create_form {
            form.current_field = match (form.current_field, forward) {
                (CreateField::Description, true) => CreateField::Priority,
                (CreateField::Priority, true) => CreateField::DueDate,
                (CreateField::DueDate, true) => CreateField::Description,
                (CreateField::Description, false) => CreateField::DueDate,
                (CreateField::Priority, false) => CreateField::Description,
                (CreateField::DueDate, false) => CreateField::Priority,
            };
        }
    }

    pub fn cycle_form_priority(&mut self, forward: bool) {
        if let Some(ref mut form) = self.form.create_form {
            form.priority = if forward { form.priority.next() } else { form.priority.prev() };
        }
    }

    pub fn get_current_form_editor(&mut self) -> Option<&mut Editor> {
        let form = self.form.create_form.as_mut()?;
        match form.current_field {
            CreateField::Description => Some(&mut form.description),
            CreateField::DueDate => Some(&mut form.due_date),
            CreateField::Priority => None,
        }
    }

    /// Submit the add-ticket form. Validation problems are reported in the
    /// status bar and leave the form open.
    pub fn save_create_form(&mut self) -> Result<Option<Ticket>, StoreError> {
        let Some(ref form) = self.form.create_form else {
            return Ok(None);
        };

        let description = form.description.to_string().trim().to_string();
        if description.is_empty() {
            self.set_status_message("Validation error: Description is required".to_string());
            return Ok(None);
        }
        let due_text = form.due_date.to_string();
        let due_date = match parse_date(&due_text) {
            Ok(date) => date,
            Err(_) => {
                self.set_status_message(format!(
                    "Validation error: Invalid due date '{}' (expected YYYY-MM-DD)",
                    due_text.trim()
                ));
                return Ok(None);
            }
        };

        let ticket = self.store.create(CreateTicketRequest {
            description,
            priority: form.priority,
            due_date,
        })?;
        self.exit_create_mode();
        self.load_data()?;

        if let Some(row) = self.visible_tickets().iter().position(|t| t.id == ticket.id) {
            self.grid.selected_row = row;
            self.sync_table_state();
        }
        self.set_status_message(format!(
            "Ticket submitted! {} | {} | {} | {} | submitted {} | due {}",
            ticket.id,
            ticket.description.replace('\n', " "),
            ticket.status,
            ticket.priority,
            ticket.date_submitted,
            ticket.due_date
        ));
        Ok(Some(ticket))
    }

    pub fn enter_filter_mode(&mut self) {
        self.filter.form_state = Some(FilterFormState::from_filter(&self.filter.active));
        self.ui.mode = Mode::Filter;
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter.form_state = None;
        self.ui.mode = Mode::View;
    }

    pub fn navigate_filter_field(&mut self, forward: bool) {
        if let Some(ref mut state) = self.filter.form_state {
            let order = FilterFormField::ORDER;
            let current = order.iter().position(|f| *f == state.current_field).unwrap_or(0);
            let next = if forward {
                (current + 1) % order.len()
            } else {
                (current + order.len() - 1) % order.len()
            };
            state.current_field = order[next];
        }
    }

    /// Step the focused selector through All / each option
    pub fn cycle_filter_value(&mut self, forward: bool) {
        if let Some(ref mut state) = self.filter.form_state {
            let n = FilterFormState::OPTION_COUNT;
            let step = |i: usize| if forward { (i + 1) % n } else { (i + n - 1) % n };
            match state.current_field {
                FilterFormField::Status => state.status_index = step(state.status_index),
                FilterFormField::Priority => state.priority_index = step(state.priority_index),
                _ => {}
            }
        }
    }

    pub fn apply_filters(&mut self) {
        if let Some(ref state) = self.filter.form_state {
            self.filter.active = state.to_filter();
            self.grid.selected_row = 0;
            self.board.selected_card = 0;
            self.clamp_selection();
            self.set_status_message("Filters applied".to_string());
        }
        self.exit_filter_mode();
    }

    pub fn clear_filters(&mut self) {
        self.filter.active = TicketFilter::default();
        self.clamp_selection();
        self.set_status_message("Filters cleared".to_string());
        self.exit_filter_mode();
    }

    pub fn get_filter_summary(&self) -> String {
        format!(
            "{} | showing {} of {} | flagged for deletion: {}",
            self.filter.active.summary(),
            self.visible_count(),
            self.tickets.len(),
            self.delete_flags.len()
        )
    }

    /// Visible tickets grouped into Open / In Progress / Closed
    pub fn board_columns(&self) -> [Vec<&Ticket>; 3] {
        let mut columns: [Vec<&Ticket>; 3] = Default::default();
        for ticket in self.tickets.iter().filter(|t| self.filter.active.matches(t)) {
            columns[ticket.status.index()].push(ticket);
        }
        columns
    }

    pub fn selected_card(&self) -> Option<&Ticket> {
        self.board_columns()[self.board.selected_column]
            .get(self.board.selected_card)
            .copied()
    }

    pub fn board_select_column(&mut self, forward: bool) {
        let last = Status::ALL.len() - 1;
        self.board.selected_column = if forward {
            (self.board.selected_column + 1).min(last)
        } else {
            self.board.selected_column.saturating_sub(1)
        };
        let cards = self.board_columns()[self.board.selected_column].len();
        self.board.selected_card = self.board.selected_card.min(cards.saturating_sub(1));
    }

    pub fn board_select_card(&mut self, down: bool) {
        let cards = self.board_columns()[self.board.selected_column].len();
        if down {
            if self.board.selected_card + 1 < cards {
                self.board.selected_card += 1;
            }
        } else {
            self.board.selected_card = self.board.selected_card.saturating_sub(1);
        }
    }

    /// Move the selected card one column left or right. The change stays in the
    /// working set until `commit_board`.
    pub fn board_move(&mut self, forward: bool) {
        let Some((id, status)) = self.selected_card().map(|t| (t.id.clone(), t.status)) else {
            return;
        };
        let target = match (status.index(), forward) {
            (i, true) if i + 1 < Status::ALL.len() => Status::ALL[i + 1],
            (i, false) if i > 0 => Status::ALL[i - 1],
            _ => return,
        };

        if let Some(ticket) = self.ticket_mut(&id) {
            ticket.status = target;
        }
        self.board.pending_moves.insert(id.clone(), target);

        // Selection follows the card
        self.board.selected_column = target.index();
        self.board.selected_card = self.board_columns()[target.index()]
            .iter()
            .position(|t| t.id == id)
            .unwrap_or(0);

        self.set_status_message(format!(
            "{} -> {} ({} unsaved move(s))",
            id,
            target,
            self.board.pending_moves.len()
        ));
    }

    /// Persist all pending board moves with a single write and a single reload
    pub fn commit_board(&mut self) -> Result<usize, StoreError> {
        if self.board.pending_moves.is_empty() {
            return Ok(0);
        }
        let moved = self.board.pending_moves.len();
        self.write_working_set()?;
        info!(moved, "persisted board moves");
        self.set_status_message(format!("Moved {} ticket(s). Changes saved.", moved));
        Ok(moved)
    }

    /// Switch tabs; leaving the board persists its pending moves first
    pub fn switch_tab(&mut self, new_tab: Tab) -> Result<(), StoreError> {
        if self.ui.current_tab == Tab::Board && new_tab != Tab::Board {
            self.commit_board()?;
        }
        self.ui.current_tab = new_tab;
        Ok(())
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 4 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 4;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }
}

enum CellValue {
    Description(String),
    Due(chrono::NaiveDate),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteTicketStore;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::rc::Rc;

    fn create_test_app() -> App {
        let store = SqliteTicketStore::in_memory().unwrap();
        App::new(Config::default(), Box::new(store)).unwrap()
    }

    fn select(app: &mut App, row: usize, column: GridColumn) {
        app.grid.selected_row = row;
        app.grid.selected_col = GridColumn::ALL.iter().position(|c| *c == column).unwrap();
        app.sync_table_state();
    }

    fn stored(app: &App, id: &str) -> Option<Ticket> {
        app.store.fetch_all().unwrap().into_iter().find(|t| t.id == id)
    }

    /// Store whose reads and deletes fail once `broken` is set
    struct BrokenStore {
        inner: SqliteTicketStore,
        broken: Rc<Cell<bool>>,
    }

    impl TicketStore for BrokenStore {
        fn fetch_all(&self) -> Result<Vec<Ticket>, StoreError> {
            if self.broken.get() {
                return Err(StoreError::DirectoryError("database unreachable".to_string()));
            }
            self.inner.fetch_all()
        }

        fn create(&self, request: CreateTicketRequest) -> Result<Ticket, StoreError> {
            self.inner.create(request)
        }

        fn replace_all(&self, tickets: &[Ticket]) -> Result<(), StoreError> {
            self.inner.replace_all(tickets)
        }

        fn delete_one(&self, id: &str) -> Result<usize, StoreError> {
            if self.broken.get() {
                return Err(StoreError::Validation("disk full".to_string()));
            }
            self.inner.delete_one(id)
        }

        fn max_ticket_number(&self) -> Result<Option<u32>, StoreError> {
            self.inner.max_ticket_number()
        }
    }

    #[test]
    fn test_new_loads_seeded_working_set() {
        let app = create_test_app();
        assert_eq!(app.tickets.len(), 100);
        assert_eq!(app.tickets[0].id, "Task-1100");
        assert!(app.date_issues.is_empty());
        assert!(!app.has_unsaved_changes());
        assert!(matches!(app.tickets[0].due_date, DateCell::Date(_)));
    }

    #[test]
    fn test_cycle_status_persists_only_that_ticket() {
        let mut app = create_test_app();
        let before = app.store.fetch_all().unwrap();
        select(&mut app, 3, GridColumn::Status);
        let id = app.selected_ticket().unwrap().id.clone();
        let expected = app.selected_ticket().unwrap().status.next();

        app.activate_cell().unwrap();

        assert_eq!(app.status.message.as_deref(), Some("Changes saved."));
        let after = app.store.fetch_all().unwrap();
        for (old, new) in before.iter().zip(&after) {
            if new.id == id {
                assert_eq!(new.status, expected);
            } else {
                assert!(old.same_content(new));
            }
        }
    }

    #[test]
    fn test_read_only_columns_are_not_edited() {
        let mut app = create_test_app();
        select(&mut app, 0, GridColumn::Submitted);
        app.activate_cell().unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.status.message.as_deref(), Some("Submitted is read-only"));
        assert!(!app.has_unsaved_changes());
    }

    #[test]
    fn test_description_edit_trims_and_persists() {
        let mut app = create_test_app();
        select(&mut app, 0, GridColumn::Description);
        app.activate_cell().unwrap();
        assert_eq!(app.ui.mode, Mode::EditCell);

        let edit = app.grid.cell_edit.as_mut().unwrap();
        edit.editor = Editor::from_string("  Replace toner  ".to_string());
        app.commit_cell_edit().unwrap();

        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(stored(&app, "Task-1100").unwrap().description, "Replace toner");
    }

    #[test]
    fn test_blank_description_keeps_editor_open() {
        let mut app = create_test_app();
        select(&mut app, 0, GridColumn::Description);
        app.activate_cell().unwrap();
        app.grid.cell_edit.as_mut().unwrap().editor = Editor::from_string("   ".to_string());

        app.commit_cell_edit().unwrap();

        assert_eq!(app.ui.mode, Mode::EditCell);
        assert!(app.grid.cell_edit.is_some());
        assert_eq!(app.status.message.as_deref(), Some("Description is required"));
    }

    #[test]
    fn test_due_date_edit_validates() {
        let mut app = create_test_app();
        select(&mut app, 1, GridColumn::Due);
        app.activate_cell().unwrap();

        app.grid.cell_edit.as_mut().unwrap().editor = Editor::single_line("next week");
        app.commit_cell_edit().unwrap();
        assert_eq!(app.ui.mode, Mode::EditCell);

        app.grid.cell_edit.as_mut().unwrap().editor = Editor::single_line("2025-09-01");
        app.commit_cell_edit().unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(stored(&app, "Task-1099").unwrap().due_date.to_storage_string(), "2025-09-01");
    }

    #[test]
    fn test_failed_persist_restores_working_set() {
        let mut app = create_test_app();
        app.tickets[0].due_date = DateCell::Text("soon".to_string());

        assert!(app.persist_edits().is_err());
        assert!(!app.has_unsaved_changes());
        assert_eq!(app.store.fetch_all().unwrap().len(), 100);
    }

    #[test]
    fn test_apply_deletes_removes_exactly_flagged() {
        let mut app = create_test_app();
        select(&mut app, 2, GridColumn::Id);
        app.toggle_delete_flag();
        select(&mut app, 5, GridColumn::Id);
        app.toggle_delete_flag();
        // Toggling twice clears the flag
        select(&mut app, 7, GridColumn::Id);
        app.toggle_delete_flag();
        app.toggle_delete_flag();

        let flagged: Vec<String> = app.delete_flags.iter().cloned().collect();
        assert_eq!(flagged, vec!["Task-1095".to_string(), "Task-1098".to_string()]);

        app.request_apply_deletes();
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        assert_eq!(app.apply_deletes().unwrap(), 2);

        assert_eq!(app.tickets.len(), 98);
        assert!(app.tickets.iter().all(|t| !flagged.contains(&t.id)));
        assert!(app.delete_flags.is_empty());
    }

    #[test]
    fn test_apply_deletes_without_flags_does_nothing() {
        let mut app = create_test_app();
        app.request_apply_deletes();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.tickets.len(), 100);
    }

    #[test]
    fn test_create_form_validation_and_submit() {
        let mut app = create_test_app();
        app.enter_create_mode();
        assert_eq!(app.save_create_form().unwrap(), None);
        assert_eq!(app.ui.mode, Mode::Create);

        app.get_current_form_editor().unwrap().insert_str("fix printer");
        app.navigate_form_field(true);
        app.cycle_form_priority(true);
        app.navigate_form_field(true);
        *app.get_current_form_editor().unwrap() = Editor::single_line("2025-09-01");

        let ticket = app.save_create_form().unwrap().unwrap();
        assert_eq!(ticket.id, "Task-1101");
        assert_eq!(ticket.priority, Priority::Medium);
        assert_eq!(ticket.due_date.as_date(), NaiveDate::from_ymd_opt(2025, 9, 1));
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.tickets.len(), 101);
        assert_eq!(app.selected_ticket().unwrap().id, "Task-1101");
    }

    #[test]
    fn test_filters_apply_to_grid_and_board() {
        let mut app = create_test_app();
        app.enter_filter_mode();
        app.cycle_filter_value(true); // Status: Open
        app.navigate_filter_field(true);
        app.cycle_filter_value(false); // Priority: Low
        app.apply_filters();

        assert_eq!(app.filter.active, TicketFilter { status: Some(Status::Open), priority: Some(Priority::Low) });
        assert!(app.visible_tickets().iter().all(|t| t.status == Status::Open && t.priority == Priority::Low));
        let columns = app.board_columns();
        assert!(columns[1].is_empty() && columns[2].is_empty());

        app.enter_filter_mode();
        app.clear_filters();
        assert_eq!(app.visible_tickets().len(), 100);
    }

    #[test]
    fn test_board_moves_are_batched() {
        let mut app = create_test_app();
        app.switch_tab(Tab::Board).unwrap();
        app.board.selected_column = 0;
        app.board.selected_card = 0;
        let first = app.selected_card().unwrap().id.clone();
        app.board_move(true);
        assert_eq!(app.board.selected_column, 1);
        app.board_move(true);

        app.board.selected_column = 0;
        app.board.selected_card = 0;
        let second = app.selected_card().unwrap().id.clone();
        app.board_move(true);

        // Nothing written yet
        assert_eq!(stored(&app, &first).unwrap().status, app.snapshot.iter().find(|t| t.id == first).unwrap().status);
        assert_eq!(app.board.pending_moves.len(), 2);

        // Leaving the board persists the batch
        app.switch_tab(Tab::Tickets).unwrap();
        assert!(app.board.pending_moves.is_empty());
        assert_eq!(stored(&app, &first).unwrap().status, Status::Closed);
        assert_eq!(stored(&app, &second).unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_board_move_stops_at_edges() {
        let mut app = create_test_app();
        app.board.selected_column = 2;
        app.board.selected_card = 0;
        app.board_move(true);
        assert!(app.board.pending_moves.is_empty());
        assert_eq!(app.commit_board().unwrap(), 0);
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Tickets.next(), Tab::Board);
        assert_eq!(Tab::Statistics.next(), Tab::Tickets);
    }

    #[test]
    fn test_failed_delete_reports_delete_error_when_reload_fails() {
        let broken = Rc::new(Cell::new(false));
        let store = BrokenStore { inner: SqliteTicketStore::in_memory().unwrap(), broken: broken.clone() };
        let mut app = App::new(Config::default(), Box::new(store)).unwrap();

        select(&mut app, 2, GridColumn::Id);
        app.toggle_delete_flag();
        let flagged = app.tickets[2].id.clone();
        broken.set(true);

        let result = app.apply_deletes();
        assert!(matches!(result, Err(StoreError::Validation(ref m)) if m == "disk full"));
        assert!(app.delete_flags.contains(&flagged));
        assert_eq!(app.tickets.len(), 100);
    }
}
