use crate::error::AppError;
use crate::model::Task;
use crate::store::TaskStore;

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

/// Loads and saves the whole task sequence as one serialized blob.
pub trait TaskPersistence {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<Task>>, AppError>;

    fn save(&mut self, tasks: &[Task]) -> Result<(), AppError>;
}

#[derive(Debug)]
pub struct StoreLoad {
    pub store: TaskStore,
    pub warning: Option<AppError>,
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

pub fn decode_tasks(blob: &str) -> Result<Vec<Task>, AppError> {
    serde_json::from_str(blob)
        .map_err(|err| AppError::invalid_data(format!("stored tasks are malformed: {err}")))
}

/// Builds the store from the adapter. A malformed or unreadable blob yields
/// an empty store plus a warning instead of an error.
pub fn load_store<P: TaskPersistence + ?Sized>(persistence: &P) -> StoreLoad {
    match persistence.load() {
        Ok(Some(tasks)) => StoreLoad {
            store: TaskStore::from_tasks(tasks),
            warning: None,
        },
        Ok(None) => StoreLoad {
            store: TaskStore::new(),
            warning: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "could not load stored tasks, starting empty");
            StoreLoad {
                store: TaskStore::new(),
                warning: Some(err),
            }
        }
    }
}
