use crate::edit::{EditField, EditSession};
use crate::error::AppError;
use crate::filter::{FilterCriteria, visible_tasks};
use crate::model::{NewTask, Task, TaskId};
use crate::notify::{Notifier, activation_argument};
use crate::stats::{OverdueGranularity, TaskStats, compute_stats, is_overdue};
use crate::storage::{StoreLoad, TaskPersistence, load_store};
use crate::store::TaskStore;
use time::OffsetDateTime;

#[derive(Debug)]
pub struct NotificationOutcome {
    pub tasks: Vec<Task>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: TaskId,
    pub error: AppError,
}

/// Owns the store, the edit session and the persistence adapter.
///
/// Store methods stay free of side effects; the board writes the full task
/// list through the adapter after each call that changed the store. Write
/// failures never undo the in-memory change, they are queued as warnings.
pub struct TaskBoard<P: TaskPersistence> {
    store: TaskStore,
    session: EditSession,
    persistence: P,
    granularity: OverdueGranularity,
    warnings: Vec<AppError>,
}

impl<P: TaskPersistence> TaskBoard<P> {
    pub fn open(persistence: P) -> Self {
        let StoreLoad { store, warning } = load_store(&persistence);
        Self {
            store,
            session: EditSession::new(),
            persistence,
            granularity: OverdueGranularity::default(),
            warnings: warning.into_iter().collect(),
        }
    }

    pub fn with_granularity(mut self, granularity: OverdueGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Changes how overdue is judged from the next check on.
    pub fn set_granularity(&mut self, granularity: OverdueGranularity) {
        self.granularity = granularity;
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn granularity(&self) -> OverdueGranularity {
        self.granularity
    }

    /// Drains warnings from the initial load and from failed writes.
    pub fn take_warnings(&mut self) -> Vec<AppError> {
        std::mem::take(&mut self.warnings)
    }

    fn persist(&mut self) {
        if let Err(err) = self.persistence.save(self.store.tasks()) {
            tracing::warn!(error = %err, "failed to persist tasks, keeping in-memory state");
            self.warnings.push(err);
        }
    }

    fn persist_if<T>(&mut self, outcome: Option<T>) -> Option<T> {
        if outcome.is_some() {
            self.persist();
        }
        outcome
    }

    pub fn add(&mut self, new_task: NewTask) -> Result<Option<Task>, AppError> {
        let created = self.store.create(new_task)?;
        Ok(self.persist_if(created))
    }

    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.store.delete(id);
        self.persist_if(removed)
    }

    pub fn toggle_complete(&mut self, id: TaskId) -> Option<Task> {
        let toggled = self.store.toggle_complete(id);
        self.persist_if(toggled)
    }

    pub fn update(&mut self, task: Task) -> Option<Task> {
        let updated = self.store.update(task);
        self.persist_if(updated)
    }

    pub fn reorder(&mut self, dragged: TaskId, target: TaskId) -> bool {
        let moved = self.store.reorder(dragged, target);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn draft(&self) -> Option<&Task> {
        self.session.draft()
    }

    pub fn start_edit(&mut self, id: TaskId) -> bool {
        self.session.start(&self.store, id)
    }

    pub fn edit_field(&mut self, field: EditField) -> bool {
        self.session.edit_field(field)
    }

    pub fn save_edit(&mut self) -> Option<Task> {
        let saved = self.session.save(&mut self.store);
        self.persist_if(saved)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.session.cancel()
    }

    pub fn visible_tasks(&self, criteria: &FilterCriteria) -> Vec<&Task> {
        visible_tasks(self.store.tasks(), criteria)
    }

    pub fn stats(&self) -> TaskStats {
        self.stats_at(OffsetDateTime::now_utc())
    }

    pub fn stats_at(&self, now: OffsetDateTime) -> TaskStats {
        compute_stats(
            self.store.tasks(),
            now.to_offset(local_offset()),
            self.granularity,
        )
    }

    pub fn is_overdue(&self, task: &Task) -> bool {
        self.is_overdue_at(task, OffsetDateTime::now_utc())
    }

    pub fn is_overdue_at(&self, task: &Task, now: OffsetDateTime) -> bool {
        is_overdue(task, now.to_offset(local_offset()), self.granularity)
    }

    /// Sends one notification per pending overdue task. A failed
    /// notification is recorded and the rest still go out.
    pub fn notify_overdue(&self, notifier: &dyn Notifier) -> NotificationOutcome {
        let now = OffsetDateTime::now_utc();
        let mut notified = Vec::new();
        let mut failures = Vec::new();

        for task in self.store.tasks() {
            if !self.is_overdue_at(task, now) {
                continue;
            }

            match notifier.notify_with_action(task, &activation_argument(task.id)) {
                Ok(()) => {
                    tracing::info!(id = task.id, "overdue notification sent");
                    notified.push(task.clone());
                }
                Err(err) => failures.push(NotificationFailure {
                    task_id: task.id,
                    error: err,
                }),
            }
        }

        NotificationOutcome {
            tasks: notified,
            failures,
        }
    }
}

/// Day-granularity checks compare calendar days in the local offset; falls
/// back to UTC when the offset cannot be determined.
pub fn local_offset() -> time::UtcOffset {
    time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC)
}
