use clap::{Parser, Subcommand, ValueEnum};
use taskboard_core::model::TaskId;

#[derive(Parser, Debug)]
#[command(name = "taskboard", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskboard add "Pay rent" -p high -c personal --due 2025-12-31
    Add {
        title: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<String>,
        /// personal, work, study or health
        #[arg(short, long)]
        category: Option<String>,
        /// Due date as YYYY-MM-DD or an RFC 3339 timestamp
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: taskboard delete 1734690000000
    Delete { id: TaskId },
    /// Toggle a task between pending and completed
    ///
    /// Example: taskboard toggle 1734690000000
    #[command(alias = "done")]
    Toggle { id: TaskId },
    /// Show details of a task
    ///
    /// Example: taskboard show 1734690000000
    Show { id: TaskId },
    /// Edit a task's title or description
    ///
    /// With --title/--description the change is saved at once. Without
    /// them an edit session is opened (interactive mode); continue with
    /// `set`, then `save` or `cancel`.
    ///
    /// Example: taskboard edit 1734690000000 --title "Pay rent today"
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a field of the task being edited
    ///
    /// Example: set title "Pay rent today"
    Set { field: DraftField, value: String },
    /// Save the task being edited
    Save,
    /// Discard the task being edited
    Cancel,
    /// Move a task into the slot of another task
    ///
    /// Example: taskboard move 1734690000000 1734690000500
    #[command(alias = "reorder")]
    Move { dragged: TaskId, target: TaskId },
    /// List tasks matching the given filters
    ///
    /// Example: taskboard list --status pending --search milk
    List {
        /// all, completed or pending
        #[arg(long, default_value = "all")]
        status: String,
        /// all, low, medium or high
        #[arg(long, default_value = "all")]
        priority: String,
        /// all, personal, work, study or health
        #[arg(long, default_value = "all")]
        category: String,
        /// Case-insensitive text to find in title or description
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show task counts
    Stats,
    /// Send notifications for overdue tasks
    Notify,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
}

/// Flag name used to identify config override arguments before parsing.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

/// Collects `--config-override` values from raw arguments, so configuration
/// (and with it aliases) is known before the command line is parsed.
pub fn extract_config_overrides(args: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(CONFIG_OVERRIDE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            values.push(value.to_string());
        }
    }

    values
}

/// Splits one interactive line into arguments, honouring double quotes and
/// backslash escapes inside them.
pub fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err("unterminated quote in command".to_string());
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}
