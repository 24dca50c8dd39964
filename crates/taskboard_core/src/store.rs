use crate::error::AppError;
use crate::model::{NewTask, Task, TaskId};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Ordered collection of tasks. Order is display order and only
/// [`TaskStore::reorder`] moves an existing task.
///
/// Every operation that references an id treats a missing id as a no-op and
/// reports it through its return value rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    last_id: TaskId,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let last_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
        Self { tasks, last_id }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn create(&mut self, new_task: NewTask) -> Result<Option<Task>, AppError> {
        self.create_at(new_task, OffsetDateTime::now_utc())
    }

    /// Appends a task stamped with `now`. A blank title leaves the store
    /// untouched and yields `Ok(None)`. The title is kept as typed.
    ///
    /// Fails with `invalid_data` once a loaded id has reached `u64::MAX`.
    pub fn create_at(
        &mut self,
        new_task: NewTask,
        now: OffsetDateTime,
    ) -> Result<Option<Task>, AppError> {
        if new_task.title.trim().is_empty() {
            return Ok(None);
        }

        let created_at = format_created_at(now)?;
        let id = self.next_id(now)?;
        let task = Task {
            id,
            title: new_task.title,
            description: new_task.description,
            completed: false,
            priority: new_task.priority,
            category: new_task.category,
            due_date: new_task.due_date.filter(|value| !value.trim().is_empty()),
            created_at,
        };

        tracing::debug!(id, "task created");
        self.tasks.push(task.clone());
        Ok(Some(task))
    }

    // Millisecond clock, bumped past the last issued id so two creations in
    // the same millisecond stay distinct.
    fn next_id(&mut self, now: OffsetDateTime) -> Result<TaskId, AppError> {
        let millis = TaskId::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
        let after_last = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| AppError::invalid_data("task id space exhausted"))?;
        let id = millis.max(after_last);
        self.last_id = id;
        Ok(id)
    }

    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let index = self.position(id)?;
        tracing::debug!(id, "task deleted");
        Some(self.tasks.remove(index))
    }

    pub fn toggle_complete(&mut self, id: TaskId) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.completed = !task.completed;
        tracing::debug!(id, completed = task.completed, "task toggled");
        Some(task.clone())
    }

    /// Replaces the task with the same id, keeping its position.
    pub fn update(&mut self, task: Task) -> Option<Task> {
        let index = self.position(task.id)?;
        tracing::debug!(id = task.id, "task updated");
        self.tasks[index] = task.clone();
        Some(task)
    }

    /// Moves `dragged` into the slot `target` occupied before the move.
    ///
    /// Dragging downward lands the task just after the target (the list has
    /// shrunk by one once the dragged task is lifted out); dragging upward
    /// lands it just before the target.
    pub fn reorder(&mut self, dragged: TaskId, target: TaskId) -> bool {
        if dragged == target {
            return false;
        }

        let (Some(from), Some(to)) = (self.position(dragged), self.position(target)) else {
            return false;
        };

        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        tracing::debug!(dragged, target, from, to, "task reordered");
        true
    }
}

fn format_created_at(now: OffsetDateTime) -> Result<String, AppError> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    now.to_offset(UtcOffset::UTC)
        .format(format)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::model::{Category, NewTask, Priority, Task, TaskId};
    use time::macros::datetime;

    fn store_with(titles: &[&str]) -> TaskStore {
        let mut store = TaskStore::new();
        let now = datetime!(2025-12-20 10:00:00 UTC);
        for title in titles {
            store.create_at(NewTask::new(*title), now).unwrap();
        }
        store
    }

    fn ids(store: &TaskStore) -> Vec<TaskId> {
        store.tasks().iter().map(|task| task.id).collect()
    }

    fn titles(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn create_appends_pending_task_with_defaults() {
        let mut store = store_with(&["first"]);
        let created = store
            .create_at(
                NewTask::new("  Pay rent ")
                    .priority(Priority::High)
                    .category(Category::Personal)
                    .due_date("2025-12-20"),
                datetime!(2025-12-20 10:00:00.123456 UTC),
            )
            .unwrap()
            .expect("task created");

        assert_eq!(store.len(), 2);
        assert_eq!(store.tasks().last(), Some(&created));
        assert_eq!(created.title, "  Pay rent ");
        assert!(!created.completed);
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.due_date.as_deref(), Some("2025-12-20"));
        assert_eq!(created.created_at, "2025-12-20T10:00:00.123Z");
    }

    #[test]
    fn create_ignores_blank_titles() {
        let mut store = store_with(&["first"]);
        let before = store.clone();

        assert!(store.create(NewTask::new("")).unwrap().is_none());
        assert!(store.create(NewTask::new(" \t\n")).unwrap().is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let store = store_with(&["a", "b", "c"]);
        let ids = ids(&store);

        assert_eq!(ids[0], 1_766_224_800_000);
        assert_eq!(ids[1], ids[0] + 1);
        assert_eq!(ids[2], ids[0] + 2);
    }

    #[test]
    fn loaded_store_never_reissues_an_id() {
        let mut store = TaskStore::from_tasks(vec![Task {
            id: 9_999_999_999_999,
            title: "from the future".to_string(),
            description: String::new(),
            completed: false,
            priority: Priority::Medium,
            category: Category::Personal,
            due_date: None,
            created_at: "2025-12-20T00:00:00.000Z".to_string(),
        }]);

        let created = store.create(NewTask::new("next")).unwrap().unwrap();
        assert_eq!(created.id, 10_000_000_000_000);
    }

    #[test]
    fn exhausted_id_space_is_an_error_not_a_wrap() {
        let mut store = TaskStore::from_tasks(vec![Task {
            id: TaskId::MAX,
            title: "last possible".to_string(),
            description: String::new(),
            completed: false,
            priority: Priority::Medium,
            category: Category::Personal,
            due_date: None,
            created_at: "2025-12-20T00:00:00.000Z".to_string(),
        }]);
        let before = store.clone();

        let err = store.create(NewTask::new("next")).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
        assert_eq!(err.message(), "task id space exhausted");
        assert_eq!(store, before);
        assert!(store.create(NewTask::new("  ")).unwrap().is_none());
    }

    #[test]
    fn toggle_twice_restores_completion() {
        let mut store = store_with(&["a"]);
        let id = ids(&store)[0];

        assert!(store.toggle_complete(id).unwrap().completed);
        assert!(!store.toggle_complete(id).unwrap().completed);
        assert!(store.toggle_complete(42).is_none());
    }

    #[test]
    fn delete_removes_in_place_and_ignores_missing_ids() {
        let mut store = store_with(&["a", "b", "c"]);
        let id = ids(&store)[1];

        assert_eq!(store.delete(id).map(|task| task.title), Some("b".to_string()));
        assert_eq!(titles(&store), vec!["a", "c"]);
        assert!(store.delete(id).is_none());
        assert!(store.toggle_complete(id).is_none());
        assert!(!store.reorder(id, ids(&store)[0]));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_keeps_position() {
        let mut store = store_with(&["a", "b", "c"]);
        let mut task = store.tasks()[1].clone();
        task.title = "renamed".to_string();
        task.priority = Priority::Low;

        assert!(store.update(task).is_some());
        assert_eq!(titles(&store), vec!["a", "renamed", "c"]);
        assert_eq!(store.tasks()[1].priority, Priority::Low);

        let mut ghost = store.tasks()[0].clone();
        ghost.id = 7;
        let before = store.clone();
        assert!(store.update(ghost).is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn reorder_downward_lands_after_target() {
        let mut store = store_with(&["a", "b", "c", "d"]);
        let ids = ids(&store);

        assert!(store.reorder(ids[0], ids[2]));
        assert_eq!(titles(&store), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn reorder_upward_lands_before_target() {
        let mut store = store_with(&["a", "b", "c", "d"]);
        let ids = ids(&store);

        assert!(store.reorder(ids[3], ids[1]));
        assert_eq!(titles(&store), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn reorder_adjacent_swaps() {
        let mut store = store_with(&["a", "b", "c"]);
        let ids = ids(&store);

        assert!(store.reorder(ids[0], ids[1]));
        assert_eq!(titles(&store), vec!["b", "a", "c"]);
        assert!(store.reorder(ids[2], ids[0]));
        assert_eq!(titles(&store), vec!["b", "c", "a"]);
    }

    #[test]
    fn reorder_same_or_missing_ids_is_noop() {
        let mut store = store_with(&["a", "b"]);
        let ids = ids(&store);
        let before = store.clone();

        assert!(!store.reorder(ids[0], ids[0]));
        assert!(!store.reorder(ids[0], 1));
        assert!(!store.reorder(1, ids[0]));
        assert_eq!(store, before);
    }

    #[test]
    fn reorder_preserves_membership() {
        let mut store = store_with(&["a", "b", "c", "d", "e"]);
        let original = ids(&store);

        assert!(store.reorder(original[1], original[4]));
        let mut after = ids(&store);
        assert_eq!(after.len(), original.len());
        after.sort_unstable();
        let mut sorted = original.clone();
        sorted.sort_unstable();
        assert_eq!(after, sorted);
        assert_eq!(store.tasks()[4].id, original[1]);
    }
}
