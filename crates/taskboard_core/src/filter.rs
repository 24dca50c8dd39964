use crate::error::AppError;
use crate::model::{Category, Priority, Task};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todas" => Ok(Self::All),
            "completed" | "done" | "completadas" => Ok(Self::Completed),
            "pending" | "pendientes" => Ok(Self::Pending),
            other => Err(AppError::invalid_input(format!("unknown status '{other}'"))),
        }
    }
}

/// The four independent criteria that pick the visible set. `None` for
/// priority or category means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub search: String,
}

impl FilterCriteria {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task)
            && self.priority.is_none_or(|priority| task.priority == priority)
            && self.category.is_none_or(|category| task.category == category)
            && matches_search(task, &self.search)
    }
}

fn matches_search(task: &Task, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }

    let needle = search.to_lowercase();
    task.title.to_lowercase().contains(&needle) || task.description.to_lowercase().contains(&needle)
}

/// Parses a priority criterion, where `all` (or `todas`) selects every priority.
pub fn parse_priority_filter(raw: &str) -> Result<Option<Priority>, AppError> {
    if is_all(raw) {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

pub fn parse_category_filter(raw: &str) -> Result<Option<Category>, AppError> {
    if is_all(raw) {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

fn is_all(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "all" | "todas")
}

/// Tasks matching every criterion, in store order.
pub fn visible_tasks<'a>(tasks: &'a [Task], criteria: &FilterCriteria) -> Vec<&'a Task> {
    tasks.iter().filter(|task| criteria.matches(task)).collect()
}
