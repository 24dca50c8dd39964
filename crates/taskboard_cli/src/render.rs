use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskboard_core::config::Palette;
use taskboard_core::model::{Task, TaskId};
use taskboard_core::stats::{DueDate, TaskStats, parse_due_date};
use taskboard_core::task_api::local_offset;

pub fn status_label(task: &Task, overdue: bool) -> String {
    let status = if task.completed { "completed" } else { "pending" };
    if overdue {
        format!("{status} (overdue)")
    } else {
        status.to_string()
    }
}

/// Due date in the short `es-ES` form (`d/m/yyyy`); unreadable values are
/// shown as stored.
pub fn format_due_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "-".to_string();
    };

    let date = match parse_due_date(raw) {
        Some(DueDate::Day(date)) => date,
        Some(due @ DueDate::Instant(_)) => due.date_in(local_offset()),
        None => return raw.to_string(),
    };
    format!("{}/{}/{}", date.day(), u8::from(date.month()), date.year())
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: TaskId,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// `overdue` is evaluated once per row by the caller.
pub fn tasks_table(tasks: &[(&Task, bool)]) -> String {
    let rows = tasks.iter().map(|(task, overdue)| TaskRow {
        id: task.id,
        title: task.title.clone(),
        priority: task.priority.as_str(),
        category: task.category.as_str(),
        due: format_due_date(task.due_date.as_deref()),
        status: status_label(task, *overdue),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Mirrors the stored record shape, so a missing due date is `""`.
pub fn task_json(task: &Task, overdue: bool) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
        "priority": task.priority.as_str(),
        "category": task.category.as_str(),
        "dueDate": task.due_date.as_deref().unwrap_or(""),
        "createdAt": task.created_at,
        "overdue": overdue,
    })
}

pub fn task_details(task: &Task, overdue: bool, palette: &Palette) -> String {
    let status = status_label(task, overdue);
    let status = if overdue {
        palette.accentize(&status)
    } else if task.completed {
        palette.mutedize(&status)
    } else {
        status
    };
    let description = if task.description.is_empty() {
        "-"
    } else {
        task.description.as_str()
    };

    [
        format!("ID: {}", task.id),
        format!("Title: {}", task.title),
        format!("Description: {description}"),
        format!("Status: {status}"),
        format!("Priority: {}", task.priority),
        format!("Category: {}", task.category),
        format!("Due: {}", format_due_date(task.due_date.as_deref())),
        format!("Created: {}", task.created_at),
    ]
    .join("\n")
}

pub fn stats_line(stats: &TaskStats, palette: &Palette) -> String {
    let overdue = stats.overdue.to_string();
    let overdue = if stats.overdue > 0 {
        palette.accentize(&overdue)
    } else {
        overdue
    };
    format!(
        "Total: {} | Completed: {} | Pending: {} | Overdue: {}",
        stats.total, stats.completed, stats.pending, overdue
    )
}
