use crate::error::AppError;
use crate::model::Task;
use crate::notify::{APP_NAME, Notifier, launch_show, notification_body, parse_activation_argument};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        self.notify_with_action(task, "")
    }

    fn notify_with_action(&self, task: &Task, action: &str) -> Result<(), AppError> {
        let task_id = task.id;
        let detail = format!("{} / {}", task.category, task.priority);
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&format!("{APP_NAME}: overdue task"))
            .text1(&notification_body(task))
            .text2(&detail);

        let action = action.trim();
        if !action.is_empty() {
            toast = toast.add_button("Open", action);
        }

        // A click on the body carries no arguments; fall back to this task.
        toast
            .on_activated(move |args| {
                let target = args
                    .as_deref()
                    .and_then(parse_activation_argument)
                    .unwrap_or(task_id);
                if let Err(err) = launch_show(target) {
                    tracing::warn!(id = target, error = %err, "could not open task from notification");
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
