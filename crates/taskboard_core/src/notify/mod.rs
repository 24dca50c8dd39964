use crate::error::AppError;
use crate::model::{Task, TaskId};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const APP_NAME: &str = "taskboard";
const DISABLE_ENV_VAR: &str = "TASKBOARD_DISABLE_NOTIFICATIONS";

pub trait Notifier {
    fn notify(&self, task: &Task) -> Result<(), AppError>;

    fn notify_with_action(&self, task: &Task, action: &str) -> Result<(), AppError> {
        let _ = action;
        self.notify(task)
    }

    /// Blocks until pending click handlers finish or `timeout` passes.
    /// Returns how many were still waiting when it gave up.
    fn wait_for_actions(&self, timeout: Duration) -> usize {
        let _ = timeout;
        0
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task: &Task) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(AppError::InvalidData(_)) => Ok(Box::new(NoopNotifier)),
        Err(other) => Err(other),
    }
}

const JOIN_POLL: Duration = Duration::from_millis(50);

/// Joins every handle that finishes before `timeout`; the rest are left
/// detached and counted.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn join_within(handles: Vec<JoinHandle<()>>, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    let mut pending = handles;

    loop {
        let (finished, waiting): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|handle| handle.is_finished());
        for handle in finished {
            if handle.join().is_err() {
                tracing::warn!("notification click handler panicked");
            }
        }

        let now = Instant::now();
        if waiting.is_empty() || now >= deadline {
            return waiting.len();
        }
        std::thread::sleep(JOIN_POLL.min(deadline - now));
        pending = waiting;
    }
}

/// Notification body: title, then the due date when there is one.
pub fn notification_body(task: &Task) -> String {
    match task.due_date.as_deref() {
        Some(due) => format!("{} (due {})", task.title, due),
        None => task.title.clone(),
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(task_id: TaskId) -> String {
    format!("{ACTION_PREFIX}{task_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<TaskId> {
    argument.strip_prefix(ACTION_PREFIX)?.trim().parse().ok()
}

/// Re-runs the current executable as `show <id>`.
pub fn launch_show(task_id: TaskId) -> Result<(), AppError> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(task_id.to_string())
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier::default()))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
