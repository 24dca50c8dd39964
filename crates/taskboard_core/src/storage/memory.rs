use crate::error::AppError;
use crate::model::Task;
use crate::storage::{TaskPersistence, decode_tasks, encode_tasks};

/// Keeps the serialized blob in memory. Useful as a stand-in for the file
/// store; it can be switched to fail every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob<B: Into<String>>(blob: B) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl TaskPersistence for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Task>>, AppError> {
        self.blob.as_deref().map(decode_tasks).transpose()
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::io("storage quota exceeded"));
        }

        self.blob = Some(encode_tasks(tasks)?);
        self.writes += 1;
        Ok(())
    }
}
