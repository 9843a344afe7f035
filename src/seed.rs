//! Demo data written into an empty store on first fetch.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::models::{DateCell, Priority, Status, Ticket, format_ticket_id};

pub const SEED: u64 = 42;
pub const SEED_COUNT: u32 = 100;
/// Highest seeded ticket number; also the baseline for the first created ticket
pub const ID_BASELINE: u32 = 1100;
/// Submitted dates are drawn from `WINDOW_START + [0, WINDOW_DAYS]`
pub const WINDOW_DAYS: u64 = 182;

pub const DESCRIPTIONS: &[&str] = &[
    "Network connectivity issues in the office",
    "Software application crashing on startup",
    "Printer not responding to print commands",
    "Email server downtime",
    "Data backup failure",
    "Login authentication problems",
    "Website performance degradation",
    "Security vulnerability identified",
    "Hardware malfunction in the server room",
    "Employee unable to access shared files",
    "Database connection failure",
    "Mobile application not syncing data",
    "VoIP phone system issues",
    "VPN connection problems for remote employees",
    "System updates causing compatibility issues",
    "File server running out of storage space",
    "Intrusion detection system alerts",
    "Inventory management system errors",
    "Customer data not loading in CRM",
    "Collaboration tool not sending notifications",
];

fn window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap_or_default()
}

pub fn seed_due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 15).unwrap_or_default()
}

/// Generate the seed tickets, `Task-1100` down to `Task-1001`.
/// The same seed always yields the same rows.
pub fn generate(seed: u64) -> Vec<Ticket> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = window_start();
    let due = seed_due_date();

    (ID_BASELINE - SEED_COUNT + 1..=ID_BASELINE)
        .rev()
        .map(|number| {
            let description = DESCRIPTIONS.choose(&mut rng).copied().unwrap_or_default().to_string();
            let status = Status::ALL.choose(&mut rng).copied().unwrap_or(Status::Open);
            let priority = Priority::ALL.choose(&mut rng).copied().unwrap_or(Priority::Medium);
            let offset = rng.random_range(0..=WINDOW_DAYS) as i64;
            Ticket {
                id: format_ticket_id(number),
                description,
                status,
                priority,
                date_submitted: DateCell::Date(start + Duration::days(offset)),
                due_date: DateCell::Date(due),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ids_descending() {
        let tickets = generate(SEED);
        assert_eq!(tickets.len(), 100);
        assert_eq!(tickets.first().unwrap().id, "Task-1100");
        assert_eq!(tickets.last().unwrap().id, "Task-1001");
        for pair in tickets.windows(2) {
            assert_eq!(pair[0].number().unwrap(), pair[1].number().unwrap() + 1);
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        assert_eq!(generate(SEED), generate(SEED));
        assert_ne!(generate(SEED), generate(SEED + 1));
    }

    #[test]
    fn test_generate_values_within_bounds() {
        let start = window_start();
        let end = start + Duration::days(WINDOW_DAYS as i64);
        for ticket in generate(SEED) {
            assert!(DESCRIPTIONS.contains(&ticket.description.as_str()));
            let submitted = ticket.date_submitted.as_date().unwrap();
            assert!(submitted >= start && submitted <= end);
            assert_eq!(ticket.due_date.as_date(), Some(seed_due_date()));
        }
    }
}
