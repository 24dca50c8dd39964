mod task;

pub use task::{Category, NewTask, Priority, Task, TaskId};
