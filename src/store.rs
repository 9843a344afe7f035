//! Ticket persistence.
//!
//! The store is an SQLite table with one row per ticket. Dates are kept as
//! `YYYY-MM-DD` text; the `doc_id` column is storage-internal and never leaves this module.

use rusqlite::types::Type;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    CreateTicketRequest, DateCell, Priority, Status, Ticket, format_date, format_ticket_id,
    parse_date, parse_ticket_number,
};
use crate::seed;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Ticket {id} has an invalid {field}: '{value}'")]
    InvalidDate {
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("Stored ticket ID '{0}' has no numeric suffix")]
    MalformedId(String),
    #[error("Ticket ID '{0}' is not of the form Task-NNNN")]
    InvalidId(String),
    #[error("No ticket number left after {0}")]
    IdsExhausted(u32),
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// A due date that could not be turned into a calendar date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateIssue {
    pub id: String,
    pub value: String,
    pub reason: String,
}

/// Operations the views need from a ticket store
pub trait TicketStore {
    /// All tickets, most recent (highest ID number) first.
    /// Seeds the demo data when the store is empty.
    fn fetch_all(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Insert a new Open ticket submitted today, with the next ID
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, StoreError>;

    /// Replace the whole collection with `tickets`.
    /// The caller must pass the complete set, never a subset.
    fn replace_all(&self, tickets: &[Ticket]) -> Result<(), StoreError>;

    /// Delete every ticket whose ID matches exactly. Returns the number removed.
    fn delete_one(&self, id: &str) -> Result<usize, StoreError>;

    /// Highest ticket number currently stored
    fn max_ticket_number(&self) -> Result<Option<u32>, StoreError>;
}

#[derive(Debug, Error)]
#[error("{0}")]
struct ColumnValueError(String);

pub struct SqliteTicketStore {
    conn: Connection,
}

impl SqliteTicketStore {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let store = SqliteTicketStore { conn };
        store.initialize_schema()?;
        info!(path = %db_path.display(), "opened ticket store");

        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteTicketStore { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tickets (
                doc_id          INTEGER PRIMARY KEY AUTOINCREMENT,
                id              TEXT NOT NULL,
                description     TEXT NOT NULL,
                status          TEXT NOT NULL,
                priority        TEXT NOT NULL,
                date_submitted  TEXT NOT NULL,
                due_date        TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tickets_id ON tickets(id);",
        )?;
        Ok(())
    }

    fn row_to_ticket(row: &rusqlite::Row) -> Result<Ticket, rusqlite::Error> {
        let status: String = row.get(2)?;
        let priority: String = row.get(3)?;
        Ok(Ticket {
            id: row.get(0)?,
            description: row.get(1)?,
            status: status.parse::<Status>().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(ColumnValueError(e)))
            })?,
            priority: priority.parse::<Priority>().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(ColumnValueError(e)))
            })?,
            date_submitted: DateCell::Text(row.get(4)?),
            due_date: DateCell::Text(row.get(5)?),
        })
    }

    fn load_rows(&self) -> Result<Vec<Ticket>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, description, status, priority, date_submitted, due_date FROM tickets",
        )?;
        let tickets = stmt
            .query_map([], Self::row_to_ticket)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tickets)
    }

    fn insert_rows(tx: &Transaction, rows: &[StorageRow]) -> Result<(), StoreError> {
        let mut stmt = tx.prepare(
            "INSERT INTO tickets (id, description, status, priority, date_submitted, due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in rows {
            stmt.execute(rusqlite::params![
                row.id,
                row.description,
                row.status.as_str(),
                row.priority.as_str(),
                row.date_submitted,
                row.due_date,
            ])?;
        }
        Ok(())
    }

    fn seed(&self) -> Result<Vec<Ticket>, StoreError> {
        let seeded = seed::generate(seed::SEED);
        let rows = seeded
            .iter()
            .map(StorageRow::from_ticket)
            .collect::<Result<Vec<_>, _>>()?;

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        Self::insert_rows(&tx, &rows)?;
        tx.commit()?;
        info!(count = rows.len(), "seeded empty ticket store");

        Ok(rows.into_iter().map(StorageRow::into_ticket).collect())
    }

    fn query_max_number(conn: &Connection) -> Result<Option<u32>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id FROM tickets
             ORDER BY CAST(substr(id, instr(id, '-') + 1) AS INTEGER) DESC
             LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => {
                let id: String = row.get(0)?;
                parse_ticket_number(&id)
                    .map(Some)
                    .ok_or(StoreError::MalformedId(id))
            }
            None => Ok(None),
        }
    }
}

impl TicketStore for SqliteTicketStore {
    fn fetch_all(&self) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets = self.load_rows()?;
        if tickets.is_empty() {
            tickets = self.seed()?;
        }
        sort_most_recent_first(&mut tickets);
        debug!(count = tickets.len(), "fetched tickets");
        Ok(tickets)
    }

    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, StoreError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(StoreError::Validation("Description is required".to_string()));
        }

        // Reading the max and inserting share one write transaction, so two
        // processes on the same file cannot hand out the same ID.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let max = Self::query_max_number(&tx)?.unwrap_or(seed::ID_BASELINE);
        let next = max.checked_add(1).ok_or(StoreError::IdsExhausted(max))?;

        let ticket = Ticket {
            id: format_ticket_id(next),
            description: description.to_string(),
            status: Status::Open,
            priority: request.priority,
            date_submitted: DateCell::Text(format_date(today())),
            due_date: DateCell::Text(format_date(request.due_date)),
        };
        let row = StorageRow::from_ticket(&ticket)?;
        Self::insert_rows(&tx, std::slice::from_ref(&row))?;
        tx.commit()?;

        info!(id = %ticket.id, priority = %ticket.priority, "created ticket");
        Ok(ticket)
    }

    fn replace_all(&self, tickets: &[Ticket]) -> Result<(), StoreError> {
        // Validate everything before touching the table
        let rows = tickets
            .iter()
            .map(StorageRow::from_ticket)
            .collect::<Result<Vec<_>, _>>()?;

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM tickets", [])?;
        Self::insert_rows(&tx, &rows)?;
        tx.commit()?;

        info!(removed, inserted = rows.len(), "replaced ticket collection");
        Ok(())
    }

    fn delete_one(&self, id: &str) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM tickets WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        if removed == 0 {
            debug!(id, "delete matched no ticket");
        } else {
            info!(id, removed, "deleted ticket");
        }
        Ok(removed)
    }

    fn max_ticket_number(&self) -> Result<Option<u32>, StoreError> {
        Self::query_max_number(&self.conn)
    }
}

/// A ticket rendered into its stored column values
struct StorageRow {
    id: String,
    description: String,
    status: Status,
    priority: Priority,
    date_submitted: String,
    due_date: String,
}

impl StorageRow {
    /// The ID must be `Task-` plus a number and the due date must parse.
    /// The submitted date is read-only in the grid, so it is stored as-is.
    fn from_ticket(ticket: &Ticket) -> Result<Self, StoreError> {
        if parse_ticket_number(&ticket.id).is_none() {
            return Err(StoreError::InvalidId(ticket.id.clone()));
        }
        let due_date = ticket.due_date.to_storage_string();
        if parse_date(&due_date).is_err() {
            return Err(StoreError::InvalidDate {
                id: ticket.id.clone(),
                field: "due date",
                value: due_date,
            });
        }
        Ok(Self {
            id: ticket.id.clone(),
            description: ticket.description.clone(),
            status: ticket.status,
            priority: ticket.priority,
            date_submitted: ticket.date_submitted.to_storage_string(),
            due_date,
        })
    }

    fn into_ticket(self) -> Ticket {
        Ticket {
            id: self.id,
            description: self.description,
            status: self.status,
            priority: self.priority,
            date_submitted: DateCell::Text(self.date_submitted),
            due_date: DateCell::Text(self.due_date),
        }
    }
}

/// Sort by numeric ID suffix, highest first. IDs without a number go last.
pub fn sort_most_recent_first(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| b.number().cmp(&a.number()));
}

/// Coerce every due date to a typed date.
///
/// Unparsable values keep their raw text and are reported, one issue per ticket.
/// Running it twice gives the same cells and the same issues.
pub fn normalize_due_dates(tickets: &mut [Ticket]) -> Vec<DateIssue> {
    let mut issues = Vec::new();
    for ticket in tickets.iter_mut() {
        if let Err(e) = ticket.due_date.normalize() {
            warn!(id = %ticket.id, value = %ticket.due_date, "unparsable due date");
            issues.push(DateIssue {
                id: ticket.id.clone(),
                value: ticket.due_date.to_storage_string(),
                reason: e.to_string(),
            });
        }
    }
    issues
}

/// Today's date on the local clock
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_store() -> SqliteTicketStore {
        SqliteTicketStore::in_memory().unwrap()
    }

    fn request(description: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            description: description.to_string(),
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        }
    }

    #[test]
    fn test_fetch_all_seeds_empty_store() {
        let store = create_test_store();
        let tickets = store.fetch_all().unwrap();

        assert_eq!(tickets.len(), 100);
        assert_eq!(tickets[0].id, "Task-1100");
        assert_eq!(tickets[99].id, "Task-1001");
        assert!(tickets.iter().all(|t| t.due_date.to_storage_string() == "2025-08-15"));
        for (stored, generated) in tickets.iter().zip(seed::generate(seed::SEED)) {
            assert_eq!(stored.status, generated.status);
            assert_eq!(stored.priority, generated.priority);
        }

        // Seeding happens once; the second fetch reads the stored rows
        let again = store.fetch_all().unwrap();
        assert_eq!(again, tickets);
    }

    #[test]
    fn test_create_on_empty_store_starts_after_baseline() {
        let store = create_test_store();
        let ticket = store.create(request("fix printer")).unwrap();

        assert_eq!(ticket.id, "Task-1101");
        assert_eq!(ticket.status, Status::Open);
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.date_submitted.as_date(), Some(today()));
        assert_eq!(ticket.due_date.to_storage_string(), "2025-09-01");
    }

    #[test]
    fn test_create_ids_strictly_increase() {
        let store = create_test_store();
        let ids: Vec<u32> = (0..5)
            .map(|i| store.create(request(&format!("ticket {}", i))).unwrap().number().unwrap())
            .collect();
        assert_eq!(ids, vec![1101, 1102, 1103, 1104, 1105]);
    }

    #[test]
    fn test_create_rejects_blank_description() {
        let store = create_test_store();
        let result = store.create(request("   "));
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.max_ticket_number().unwrap(), None);
    }

    #[test]
    fn test_ids_not_reused_after_deleting_older_ticket() {
        let store = create_test_store();
        let first = store.create(request("first")).unwrap();
        store.create(request("second")).unwrap();
        store.delete_one(&first.id).unwrap();

        let third = store.create(request("third")).unwrap();
        assert_eq!(third.id, "Task-1103");
    }

    #[test]
    fn test_max_uses_numeric_order() {
        let store = create_test_store();
        let mut tickets = seed::generate(seed::SEED);
        tickets.truncate(2);
        tickets[0].id = "Task-999".to_string();
        tickets[1].id = "Task-10000".to_string();
        store.replace_all(&tickets).unwrap();

        assert_eq!(store.max_ticket_number().unwrap(), Some(10000));
        let ordered = store.fetch_all().unwrap();
        assert_eq!(ordered[0].id, "Task-10000");
    }

    #[test]
    fn test_replace_all_round_trip_is_unchanged() {
        let store = create_test_store();
        let before = store.fetch_all().unwrap();
        store.replace_all(&before).unwrap();
        assert_eq!(store.fetch_all().unwrap(), before);
    }

    #[test]
    fn test_replace_all_accepts_typed_dates() {
        let store = create_test_store();
        let mut tickets = store.fetch_all().unwrap();
        assert!(normalize_due_dates(&mut tickets).is_empty());
        tickets[3].status = Status::Closed;
        let edited_id = tickets[3].id.clone();
        store.replace_all(&tickets).unwrap();

        let after = store.fetch_all().unwrap();
        assert_eq!(after.len(), 100);
        for ticket in &after {
            let original = tickets.iter().find(|t| t.id == ticket.id).unwrap();
            assert!(original.same_content(ticket));
        }
        assert_eq!(after.iter().find(|t| t.id == edited_id).unwrap().status, Status::Closed);
    }

    #[test]
    fn test_replace_all_rejects_invalid_due_date_without_writing() {
        let store = create_test_store();
        let mut tickets = store.fetch_all().unwrap();
        tickets[0].due_date = DateCell::Text("someday".to_string());

        let result = store.replace_all(&tickets);
        assert!(matches!(result, Err(StoreError::InvalidDate { .. })));
        // Nothing was deleted
        assert_eq!(store.fetch_all().unwrap().len(), 100);
    }

    #[test]
    fn test_delete_one() {
        let store = create_test_store();
        store.fetch_all().unwrap();

        assert_eq!(store.delete_one("Task-1050").unwrap(), 1);
        let tickets = store.fetch_all().unwrap();
        assert_eq!(tickets.len(), 99);
        assert!(tickets.iter().all(|t| t.id != "Task-1050"));
    }

    #[test]
    fn test_delete_missing_id_is_noop() {
        let store = create_test_store();
        let before = store.fetch_all().unwrap();
        assert_eq!(store.delete_one("Task-9999").unwrap(), 0);
        assert_eq!(store.fetch_all().unwrap(), before);
    }

    #[test]
    fn test_normalize_due_dates_reports_issues_and_is_idempotent() {
        let store = create_test_store();
        let mut tickets = store.fetch_all().unwrap();
        tickets[1].due_date = DateCell::Text("2025-13-40".to_string());

        let issues = normalize_due_dates(&mut tickets);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, tickets[1].id);
        assert_eq!(issues[0].value, "2025-13-40");
        assert!(matches!(tickets[0].due_date, DateCell::Date(_)));

        let snapshot = tickets.clone();
        let second = normalize_due_dates(&mut tickets);
        assert_eq!(tickets, snapshot);
        assert_eq!(second, issues);
    }

    #[test]
    fn test_unknown_status_in_row_is_an_error() {
        let store = create_test_store();
        store
            .conn
            .execute(
                "INSERT INTO tickets (id, description, status, priority, date_submitted, due_date)
                 VALUES ('Task-1101', 'x', 'Done', 'High', '2025-01-01', '2025-01-02')",
                [],
            )
            .unwrap();
        assert!(store.fetch_all().is_err());
    }

    fn seeded_with_ids(ids: &[&str]) -> Vec<Ticket> {
        let mut tickets = seed::generate(seed::SEED);
        tickets.truncate(ids.len());
        for (ticket, id) in tickets.iter_mut().zip(ids) {
            ticket.id = id.to_string();
        }
        tickets
    }

    #[test]
    fn test_replace_all_rejects_malformed_ids_without_writing() {
        let store = create_test_store();
        store.fetch_all().unwrap();

        for bad in ["Task-99999999999", "Bug-12", "Task-"] {
            let tickets = seeded_with_ids(&["Task-1105", bad]);
            let result = store.replace_all(&tickets);
            assert!(matches!(result, Err(StoreError::InvalidId(ref id)) if id == bad));
        }
        assert_eq!(store.fetch_all().unwrap().len(), 100);
        assert_eq!(store.create(request("still works")).unwrap().id, "Task-1101");
    }

    #[test]
    fn test_create_after_highest_number_is_an_error() {
        let store = create_test_store();
        store.replace_all(&seeded_with_ids(&["Task-4294967295"])).unwrap();

        let result = store.create(request("one too many"));
        assert!(matches!(result, Err(StoreError::IdsExhausted(u32::MAX))));
        assert_eq!(store.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_all_orders_by_descending_number() {
        let store = create_test_store();
        let ids = ["Task-1003", "Task-20", "Task-1100", "Task-0999", "Task-100000", "Task-1"];
        store.replace_all(&seeded_with_ids(&ids)).unwrap();

        let tickets = store.fetch_all().unwrap();
        assert_eq!(tickets.len(), ids.len());
        for pair in tickets.windows(2) {
            assert!(pair[0].number().unwrap() > pair[1].number().unwrap());
        }
        assert_eq!(tickets[0].id, "Task-100000");
        assert_eq!(tickets[5].id, "Task-1");
    }
}
