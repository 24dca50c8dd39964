use crate::model::Task;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

/// How a due date is compared with the evaluation moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdueGranularity {
    /// Due instant strictly before now; a bare date means midnight UTC.
    #[default]
    Timestamp,
    /// Due calendar day strictly before today.
    Day,
}

impl std::str::FromStr for OverdueGranularity {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timestamp" | "time" => Ok(Self::Timestamp),
            "day" | "date" => Ok(Self::Day),
            other => Err(crate::error::AppError::invalid_input(format!(
                "unknown overdue granularity '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDate {
    Day(Date),
    Instant(OffsetDateTime),
}

impl DueDate {
    pub fn instant(&self) -> OffsetDateTime {
        match self {
            Self::Day(date) => date.midnight().assume_offset(UtcOffset::UTC),
            Self::Instant(instant) => *instant,
        }
    }

    pub fn date_in(&self, offset: UtcOffset) -> Date {
        match self {
            Self::Day(date) => *date,
            Self::Instant(instant) => instant.to_offset(offset).date(),
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_due_date(raw: &str) -> Option<DueDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return Some(DueDate::Day(date));
    }

    OffsetDateTime::parse(trimmed, &Rfc3339)
        .ok()
        .map(DueDate::Instant)
}

/// Point-in-time check; a task with a missing or unreadable due date is never overdue.
pub fn is_overdue(task: &Task, now: OffsetDateTime, granularity: OverdueGranularity) -> bool {
    if task.completed {
        return false;
    }

    let Some(due) = task.due_date.as_deref().and_then(parse_due_date) else {
        return false;
    };

    match granularity {
        OverdueGranularity::Timestamp => due.instant() < now,
        OverdueGranularity::Day => due.date_in(now.offset()) < now.date(),
    }
}

pub fn compute_stats(
    tasks: &[Task],
    now: OffsetDateTime,
    granularity: OverdueGranularity,
) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();
    let overdue = tasks
        .iter()
        .filter(|task| is_overdue(task, now, granularity))
        .count();

    TaskStats {
        total,
        completed,
        pending: total - completed,
        overdue,
    }
}

#[cfg(test)]
mod tests {
    use super::{DueDate, OverdueGranularity, compute_stats, is_overdue, parse_due_date};
    use crate::model::{Category, Priority, Task};
    use time::macros::{date, datetime};

    fn task(id: u64, completed: bool, due_date: Option<&str>) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: String::new(),
            completed,
            priority: Priority::Medium,
            category: Category::Personal,
            due_date: due_date.map(str::to_string),
            created_at: "2025-12-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(
            parse_due_date("2025-12-20"),
            Some(DueDate::Day(date!(2025 - 12 - 20)))
        );
        assert_eq!(
            parse_due_date("2025-12-20T09:30:00+02:00").map(|due| due.instant()),
            Some(datetime!(2025-12-20 07:30:00 UTC))
        );
        assert_eq!(parse_due_date(""), None);
        assert_eq!(parse_due_date("next tuesday"), None);
    }

    #[test]
    fn completed_tasks_are_never_overdue() {
        let now = datetime!(2025-12-20 12:00:00 UTC);
        let tasks = vec![
            task(1, false, Some("2025-12-19")),
            task(2, true, Some("2025-12-19")),
        ];

        let stats = compute_stats(&tasks, now, OverdueGranularity::Timestamp);
        assert_eq!(stats.overdue, 1);
        assert!(is_overdue(&tasks[0], now, OverdueGranularity::Timestamp));
        assert!(!is_overdue(&tasks[1], now, OverdueGranularity::Timestamp));
    }

    #[test]
    fn timestamp_granularity_flags_today_after_midnight() {
        let now = datetime!(2025-12-20 08:00:00 UTC);
        let due_today = task(1, false, Some("2025-12-20"));

        assert!(is_overdue(&due_today, now, OverdueGranularity::Timestamp));
        assert!(!is_overdue(&due_today, now, OverdueGranularity::Day));
    }

    #[test]
    fn day_granularity_uses_the_evaluation_offset() {
        let now = datetime!(2025-12-20 23:30:00 -05:00);
        let due = task(1, false, Some("2025-12-21T01:00:00Z"));

        assert!(!is_overdue(&due, now, OverdueGranularity::Day));
        assert!(is_overdue(&due, now, OverdueGranularity::Timestamp));
    }

    #[test]
    fn tasks_without_readable_due_date_are_not_overdue() {
        let now = datetime!(2025-12-20 08:00:00 UTC);

        assert!(!is_overdue(&task(1, false, None), now, OverdueGranularity::Timestamp));
        assert!(!is_overdue(&task(2, false, Some("soon")), now, OverdueGranularity::Day));
    }

    #[test]
    fn counts_total_completed_pending() {
        let now = datetime!(2025-12-20 08:00:00 UTC);
        let tasks = vec![
            task(1, true, None),
            task(2, false, Some("2030-01-01")),
            task(3, false, None),
        ];

        let stats = compute_stats(&tasks, now, OverdueGranularity::Timestamp);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 0);
        assert_eq!(compute_stats(&[], now, OverdueGranularity::Day).total, 0);
    }

    #[test]
    fn parses_granularity_names() {
        assert_eq!("day".parse::<OverdueGranularity>().unwrap(), OverdueGranularity::Day);
        assert_eq!(
            "Timestamp".parse::<OverdueGranularity>().unwrap(),
            OverdueGranularity::Timestamp
        );
        assert!("week".parse::<OverdueGranularity>().is_err());
    }
}
