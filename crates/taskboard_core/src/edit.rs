use crate::model::{Task, TaskId};
use crate::store::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditField {
    Title(String),
    Description(String),
}

/// Holds at most one draft. Starting a new edit discards the previous
/// draft's unsaved changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    draft: Option<Task>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> Option<&Task> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self, id: TaskId) -> bool {
        self.draft.as_ref().is_some_and(|draft| draft.id == id)
    }

    pub fn start(&mut self, store: &TaskStore, id: TaskId) -> bool {
        match store.get(id) {
            Some(task) => {
                self.draft = Some(task.clone());
                true
            }
            None => false,
        }
    }

    pub fn edit_field(&mut self, field: EditField) -> bool {
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };

        match field {
            EditField::Title(value) => draft.title = value,
            EditField::Description(value) => draft.description = value,
        }
        true
    }

    /// Writes the draft's title and description over the task as it is now
    /// in the store, then clears the draft.
    pub fn save(&mut self, store: &mut TaskStore) -> Option<Task> {
        let draft = self.draft.take()?;
        let mut merged = store.get(draft.id)?.clone();
        merged.title = draft.title;
        merged.description = draft.description;
        store.update(merged)
    }

    pub fn cancel(&mut self) -> bool {
        self.draft.take().is_some()
    }
}
