//! Numbers behind the statistics view: open count and the two charts.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{Priority, Status, Ticket};

/// Calendar month used as the x axis of the status chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Short label for chart axes ("Jun 23")
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }
}

/// Ticket counts for one submission month, indexed like `Status::ALL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthStatusCounts {
    pub month: Month,
    pub counts: [u64; 3],
}

impl MonthStatusCounts {
    pub fn count(&self, status: Status) -> u64 {
        self.counts[status.index()]
    }
}

pub fn open_count(tickets: &[Ticket]) -> usize {
    tickets.iter().filter(|t| t.status == Status::Open).count()
}

/// Count tickets per submission month and status, oldest month first.
/// Tickets whose submitted date does not parse are left out.
pub fn status_by_month(tickets: &[Ticket]) -> Vec<MonthStatusCounts> {
    let mut months: BTreeMap<Month, [u64; 3]> = BTreeMap::new();
    for ticket in tickets {
        if let Some(date) = ticket.date_submitted.as_date() {
            months.entry(Month::of(date)).or_insert([0; 3])[ticket.status.index()] += 1;
        }
    }
    months
        .into_iter()
        .map(|(month, counts)| MonthStatusCounts { month, counts })
        .collect()
}

/// Ticket count per priority, in High/Medium/Low order
pub fn priority_counts(tickets: &[Ticket]) -> Vec<(Priority, u64)> {
    Priority::ALL
        .iter()
        .map(|p| (*p, tickets.iter().filter(|t| t.priority == *p).count() as u64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateCell;

    fn ticket(id: &str, status: Status, priority: Priority, submitted: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            description: "Email server downtime".to_string(),
            status,
            priority,
            date_submitted: DateCell::Text(submitted.to_string()),
            due_date: DateCell::Text("2025-08-15".to_string()),
        }
    }

    #[test]
    fn test_open_count() {
        let tickets = vec![
            ticket("Task-1", Status::Open, Priority::High, "2023-06-01"),
            ticket("Task-2", Status::Closed, Priority::High, "2023-06-01"),
            ticket("Task-3", Status::Open, Priority::Low, "2023-07-01"),
        ];
        assert_eq!(open_count(&tickets), 2);
    }

    #[test]
    fn test_status_by_month_groups_and_orders() {
        let tickets = vec![
            ticket("Task-1", Status::Open, Priority::High, "2023-07-14"),
            ticket("Task-2", Status::Closed, Priority::High, "2023-06-01"),
            ticket("Task-3", Status::Open, Priority::Low, "2023-07-01"),
            ticket("Task-4", Status::InProgress, Priority::Low, "2023-06-30"),
            ticket("Task-5", Status::Open, Priority::Low, "garbage"),
        ];
        let months = status_by_month(&tickets);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, Month { year: 2023, month: 6 });
        assert_eq!(months[0].counts, [0, 1, 1]);
        assert_eq!(months[1].month.label(), "Jul 23");
        assert_eq!(months[1].count(Status::Open), 2);
    }

    #[test]
    fn test_priority_counts_cover_every_priority() {
        let tickets = vec![
            ticket("Task-1", Status::Open, Priority::High, "2023-06-01"),
            ticket("Task-2", Status::Open, Priority::High, "2023-06-01"),
        ];
        assert_eq!(
            priority_counts(&tickets),
            vec![(Priority::High, 2), (Priority::Medium, 0), (Priority::Low, 0)]
        );
    }
}
