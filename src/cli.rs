use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::models::{CreateTicketRequest, Priority, Status, Ticket, TicketFilter, parse_date};
use crate::stats;
use crate::store::{StoreError, TicketStore};

#[derive(Parser)]
#[command(name = "tickets")]
#[command(about = "Task Tickets - a small ticket tracker for the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Create a ticket and print it
    Add {
        /// What needs doing
        description: String,
        /// High, Medium or Low
        #[arg(long, default_value = "Medium")]
        priority: String,
        /// Due date (YYYY-MM-DD); defaults to the configured due date
        #[arg(long)]
        due: Option<String>,
    },
    /// Print tickets, most recent first
    List {
        /// Only show tickets with this status
        #[arg(long)]
        status: Option<String>,
        /// Only show tickets with this priority
        #[arg(long)]
        priority: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete a ticket by ID
    Delete {
        /// Ticket ID, e.g. Task-1101
        id: String,
    },
    /// Print the open count and the chart tables
    Stats,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Failed to encode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Handle the add command
pub fn handle_add(
    description: String,
    priority: String,
    due: Option<String>,
    default_due: chrono::NaiveDate,
    store: &dyn TicketStore,
) -> Result<(), CliError> {
    let priority = priority.parse::<Priority>().map_err(CliError::InvalidArgument)?;

    let due_date = match due {
        Some(due_str) => parse_date(&due_str)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", due_str, e)))?,
        None => default_due,
    };

    let ticket = store.create(CreateTicketRequest {
        description,
        priority,
        due_date,
    })?;

    println!(
        "Created {} ({}, {}, due {})",
        ticket.id, ticket.status, ticket.priority, ticket.due_date
    );

    Ok(())
}

/// Handle the list command
pub fn handle_list(
    status: Option<String>,
    priority: Option<String>,
    json: bool,
    store: &dyn TicketStore,
) -> Result<(), CliError> {
    let filter = TicketFilter {
        status: status
            .map(|s| s.parse::<Status>())
            .transpose()
            .map_err(CliError::InvalidArgument)?,
        priority: priority
            .map(|p| p.parse::<Priority>())
            .transpose()
            .map_err(CliError::InvalidArgument)?,
    };

    let tickets: Vec<Ticket> = store
        .fetch_all()?
        .into_iter()
        .filter(|t| filter.matches(t))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&tickets)?);
    } else {
        print!("{}", format_ticket_table(&tickets));
        println!("{} ticket(s) - {}", tickets.len(), filter.summary());
    }

    Ok(())
}

/// Handle the delete command
pub fn handle_delete(id: String, store: &dyn TicketStore) -> Result<(), CliError> {
    let removed = store.delete_one(id.trim())?;
    if removed == 0 {
        println!("No ticket with ID {}", id.trim());
    } else {
        println!("Deleted {}", id.trim());
    }
    Ok(())
}

/// Handle the stats command
pub fn handle_stats(store: &dyn TicketStore) -> Result<(), CliError> {
    let tickets = store.fetch_all()?;
    print!("{}", format_stats(&tickets));
    Ok(())
}

/// Fixed-width table, one ticket per line
pub fn format_ticket_table(tickets: &[Ticket]) -> String {
    let desc_width = tickets
        .iter()
        .map(|t| t.description.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(11, 48);

    let mut out = format!(
        "{:<10} {:<desc_width$} {:<11} {:<8} {:<10} {:<10}\n",
        "ID", "Description", "Status", "Priority", "Submitted", "Due"
    );
    for ticket in tickets {
        let flat = ticket.description.replace('\n', " ");
        let description = if flat.chars().count() > desc_width {
            let cut: String = flat.chars().take(desc_width - 3).collect();
            format!("{}...", cut)
        } else {
            flat
        };
        out.push_str(&format!(
            "{:<10} {:<desc_width$} {:<11} {:<8} {:<10} {:<10}\n",
            ticket.id,
            description,
            ticket.status.as_str(),
            ticket.priority.as_str(),
            ticket.date_submitted.to_storage_string(),
            ticket.due_date.to_storage_string(),
        ));
    }
    out
}

pub fn format_stats(tickets: &[Ticket]) -> String {
    let mut out = format!("Open tickets: {}\n\n", stats::open_count(tickets));

    out.push_str(&format!(
        "{:<8} {:>6} {:>12} {:>7}\n",
        "Month", "Open", "In Progress", "Closed"
    ));
    for row in stats::status_by_month(tickets) {
        out.push_str(&format!(
            "{:<8} {:>6} {:>12} {:>7}\n",
            row.month.label(),
            row.count(Status::Open),
            row.count(Status::InProgress),
            row.count(Status::Closed),
        ));
    }

    out.push_str(&format!("\n{:<8} {:>6}\n", "Priority", "Count"));
    for (priority, count) in stats::priority_counts(tickets) {
        out.push_str(&format!("{:<8} {:>6}\n", priority.as_str(), count));
    }
    out
}
