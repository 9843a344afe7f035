use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage format for every date field: YYYY-MM-DD
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Prefix shared by every ticket ID ("Task-1101")
pub const TICKET_ID_PREFIX: &str = "Task-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Closed")]
    Closed,
}

impl Status {
    /// Board column order
    pub const ALL: [Status; 3] = [Status::Open, Status::InProgress, Status::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Closed => "Closed",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Status::Open => 0,
            Status::InProgress => 1,
            Status::Closed => 2,
        }
    }

    /// Next option, wrapping around (used when cycling a grid cell)
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Status::Open),
            "in progress" | "in-progress" | "in_progress" | "inprogress" => Ok(Status::InProgress),
            "closed" => Ok(Status::Closed),
            other => Err(format!("Unknown status '{}' (expected Open, In Progress or Closed)", other)),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority '{}' (expected High, Medium or Low)", other)),
        }
    }
}

/// A date field as it travels between the store and the grid.
///
/// The store keeps dates as `YYYY-MM-DD` text, so freshly fetched tickets carry
/// `Text`. The grid wants typed values, which `normalize` produces. Text that
/// does not parse stays `Text` so the caller can show it as invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateCell {
    Date(NaiveDate),
    Text(String),
}

impl DateCell {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateCell::Date(date) => Some(*date),
            DateCell::Text(text) => parse_date(text).ok(),
        }
    }

    /// Turn parseable text into a typed date; leaves anything else untouched
    pub fn normalize(&mut self) -> Result<(), chrono::ParseError> {
        if let DateCell::Text(text) = self {
            let date = parse_date(text)?;
            *self = DateCell::Date(date);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.as_date().is_some()
    }

    /// Render for storage. Typed dates are formatted, text is kept as-is.
    pub fn to_storage_string(&self) -> String {
        match self {
            DateCell::Date(date) => format_date(*date),
            DateCell::Text(text) => text.trim().to_string(),
        }
    }
}

impl From<NaiveDate> for DateCell {
    fn from(date: NaiveDate) -> Self {
        DateCell::Date(date)
    }
}

impl fmt::Display for DateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,          // Task-NNNN
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub date_submitted: DateCell,
    pub due_date: DateCell,
}

impl Ticket {
    /// Numeric suffix of the ID, if it has the expected shape
    pub fn number(&self) -> Option<u32> {
        parse_ticket_number(&self.id)
    }

    /// Whether two tickets hold the same data once dates are compared as storage text
    pub fn same_content(&self, other: &Ticket) -> bool {
        self.id == other.id
            && self.description == other.description
            && self.status == other.status
            && self.priority == other.priority
            && self.date_submitted.to_storage_string() == other.date_submitted.to_storage_string()
            && self.due_date.to_storage_string() == other.due_date.to_storage_string()
    }
}

/// Input of the add-ticket form
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    pub description: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
}

/// Status/priority filters applied to the grid and the board. `None` means all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.is_none_or(|s| ticket.status == s)
            && self.priority.is_none_or(|p| ticket.priority == p)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none()
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status {
            parts.push(format!("Status: {}", status));
        }
        if let Some(priority) = self.priority {
            parts.push(format!("Priority: {}", priority));
        }
        if parts.is_empty() {
            "No filters".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Format a ticket number as an ID ("Task-0042", "Task-1101")
pub fn format_ticket_id(number: u32) -> String {
    format!("{}{:04}", TICKET_ID_PREFIX, number)
}

/// Extract the numeric suffix of an ID ("Task-1101" -> 1101).
/// `None` unless the ID is the prefix followed by digits that fit a `u32`.
pub fn parse_ticket_number(id: &str) -> Option<u32> {
    let suffix = id.strip_prefix(TICKET_ID_PREFIX)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<u32>().ok()
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
