use crate::error::AppError;
use crate::model::{Priority, Task};
use crate::notify::{APP_NAME, Notifier, join_within, launch_show, notification_body};
use notify_rust::{Notification, Urgency};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Desktop notifications over D-Bus. Click handlers run on their own
/// threads and are kept so a short-lived process can wait for them.
#[derive(Default)]
pub struct LinuxNotifier {
    pending: Mutex<Vec<JoinHandle<()>>>,
}

fn urgency_for(priority: Priority) -> Urgency {
    match priority {
        Priority::Low => Urgency::Low,
        Priority::Medium => Urgency::Normal,
        Priority::High => Urgency::Critical,
    }
}

impl Notifier for LinuxNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        self.notify_with_action(task, "")
    }

    fn notify_with_action(&self, task: &Task, action: &str) -> Result<(), AppError> {
        let action = action.trim();
        let mut notification = Notification::new();
        notification
            .appname(APP_NAME)
            .summary(&format!("Overdue {} task", task.category))
            .body(&notification_body(task))
            .urgency(urgency_for(task.priority));
        if !action.is_empty() {
            notification.action(action, "Open");
        }

        let handle = notification
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        if action.is_empty() {
            return Ok(());
        }

        // Blocks until the notification closes, so it gets its own thread.
        let action_key = action.to_string();
        let task_id = task.id;
        let waiter = std::thread::spawn(move || {
            handle.wait_for_action(|selected| {
                if selected == action_key || selected == "default" {
                    if let Err(err) = launch_show(task_id) {
                        tracing::warn!(id = task_id, error = %err, "could not open task from notification");
                    }
                }
            });
        });
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(waiter);

        Ok(())
    }

    fn wait_for_actions(&self, timeout: Duration) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let handles = std::mem::take(&mut *pending);
        drop(pending);
        join_within(handles, timeout)
    }
}
