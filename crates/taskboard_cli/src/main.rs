use clap::CommandFactory;
use clap::Parser;
use clap::error::ErrorKind;
use std::io::{self, BufRead};
use std::time::Duration;
use taskboard_cli::cli::{Cli, Command, DraftField, extract_config_overrides, split_command_line};
use taskboard_cli::render;
use taskboard_core::config::{self, Config, ConfigOverrides};
use taskboard_core::edit::EditField;
use taskboard_core::error::AppError;
use taskboard_core::filter::{self, FilterCriteria};
use taskboard_core::model::{NewTask, Task};
use taskboard_core::notify::{notifier_from_env, parse_activation_argument};
use taskboard_core::stats::parse_due_date;
use taskboard_core::storage::JsonFileStore;
use taskboard_core::task_api::TaskBoard;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

type Board = TaskBoard<JsonFileStore>;

/// How long a one-shot `notify` stays alive so a click can still open the task.
const CLICK_WAIT: Duration = Duration::from_secs(30);

/// One-shot runs exit right after the command; an interactive session lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    OneShot,
    Interactive,
}

fn no_edit_in_progress() -> AppError {
    AppError::invalid_input("no edit in progress")
}

fn require_title(value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::invalid_input("title is required"))
    } else {
        Ok(())
    }
}

fn apply_overrides(base: &Config, raw: &[String]) -> Result<Config, AppError> {
    if raw.is_empty() {
        return Ok(base.clone());
    }

    let mut overrides = ConfigOverrides::default();
    for value in raw {
        config::apply_override(&mut overrides, value)?;
    }
    Ok(config::merge_overrides(base, &overrides))
}

fn print_task_result(verb: &str, task: &Task, board: &Board, json: bool) {
    if json {
        println!("{}", render::task_json(task, board.is_overdue(task)));
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
    }
}

fn report_warnings(board: &mut Board) {
    for warning in board.take_warnings() {
        eprintln!("WARNING: {warning}");
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// `Ok(None)` when clap printed help or version text instead.
fn parse_args(config: &Config, args: Vec<String>) -> Result<Option<Cli>, AppError> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("taskboard".to_string());
    argv.extend(config.expand_alias(args));

    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print().map_err(|err| AppError::io(err.to_string()))?;
            Ok(None)
        }
        Err(err) => Err(normalize_parse_error(err)),
    }
}

fn run_command(
    board: &mut Board,
    base: &Config,
    cli: Cli,
    session: Session,
) -> Result<(), AppError> {
    tracing::debug!(command = ?cli.command, json = cli.json, "running command");
    let config = apply_overrides(base, &cli.config_override)?;
    board.set_granularity(config.overdue);
    let palette = config.palette();
    let json = cli.json;

    match cli.command {
        Command::Add {
            title,
            description,
            priority,
            category,
            due,
        } => {
            let title = title.unwrap_or_default();
            require_title(&title)?;

            let priority = match priority {
                Some(raw) => raw.parse()?,
                None => config.default_priority.unwrap_or_default(),
            };
            let category = match category {
                Some(raw) => raw.parse()?,
                None => config.default_category.unwrap_or_default(),
            };

            let mut new_task = NewTask::new(title)
                .description(description)
                .priority(priority)
                .category(category);
            if let Some(due) = due.filter(|value| !value.trim().is_empty()) {
                if parse_due_date(&due).is_none() {
                    return Err(AppError::invalid_input(
                        "due date must be YYYY-MM-DD or RFC 3339",
                    ));
                }
                new_task = new_task.due_date(due);
            }

            let task = board
                .add(new_task)?
                .ok_or_else(|| AppError::invalid_input("title is required"))?;
            print_task_result("Added", &task, board, json);
        }
        Command::Delete { id } => {
            let task = board.delete(id).ok_or_else(|| AppError::task_not_found(id))?;
            print_task_result("Deleted", &task, board, json);
        }
        Command::Toggle { id } => {
            let task = board
                .toggle_complete(id)
                .ok_or_else(|| AppError::task_not_found(id))?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            print_task_result(verb, &task, board, json);
        }
        Command::Show { id } => {
            let task = board.get(id).ok_or_else(|| AppError::task_not_found(id))?;
            let overdue = board.is_overdue(task);
            if json {
                println!("{}", render::task_json(task, overdue));
            } else {
                println!("{}", render::task_details(task, overdue, &palette));
            }
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            if let Some(title) = title.as_deref() {
                require_title(title)?;
            }
            if !board.start_edit(id) {
                return Err(AppError::task_not_found(id));
            }

            if title.is_none() && description.is_none() {
                let draft = board.draft().cloned().ok_or_else(no_edit_in_progress)?;
                print_task_result("Editing", &draft, board, json);
                return Ok(());
            }

            if let Some(title) = title {
                board.edit_field(EditField::Title(title));
            }
            if let Some(description) = description {
                board.edit_field(EditField::Description(description));
            }
            let task = board
                .save_edit()
                .ok_or_else(|| AppError::task_not_found(id))?;
            print_task_result("Updated", &task, board, json);
        }
        Command::Set { field, value } => {
            let edit = match field {
                DraftField::Title => {
                    require_title(&value)?;
                    EditField::Title(value)
                }
                DraftField::Description => EditField::Description(value),
            };
            if !board.edit_field(edit) {
                return Err(no_edit_in_progress());
            }
            let draft = board.draft().cloned().ok_or_else(no_edit_in_progress)?;
            print_task_result("Draft", &draft, board, json);
        }
        Command::Save => {
            let draft_id = board
                .draft()
                .map(|draft| draft.id)
                .ok_or_else(no_edit_in_progress)?;
            let task = board
                .save_edit()
                .ok_or_else(|| AppError::task_not_found(draft_id))?;
            print_task_result("Updated", &task, board, json);
        }
        Command::Cancel => {
            if !board.cancel_edit() {
                return Err(no_edit_in_progress());
            }
            if json {
                println!("{}", serde_json::json!({ "cancelled": true }));
            } else {
                println!("Edit cancelled");
            }
        }
        Command::Move { dragged, target } => {
            for id in [dragged, target] {
                if board.get(id).is_none() {
                    return Err(AppError::task_not_found(id));
                }
            }

            board.reorder(dragged, target);
            let position = board
                .tasks()
                .iter()
                .position(|task| task.id == dragged)
                .ok_or_else(|| AppError::task_not_found(dragged))?;
            let task = &board.tasks()[position];
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "task": render::task_json(task, board.is_overdue(task)),
                        "position": position + 1,
                    })
                );
            } else {
                println!(
                    "Moved task: {} ({}) to position {}",
                    task.title,
                    task.id,
                    position + 1
                );
            }
        }
        Command::List {
            status,
            priority,
            category,
            search,
        } => {
            let criteria = FilterCriteria {
                status: status.parse()?,
                priority: filter::parse_priority_filter(&priority)?,
                category: filter::parse_category_filter(&category)?,
                search,
            };
            let now = OffsetDateTime::now_utc();
            let rows: Vec<(&Task, bool)> = board
                .visible_tasks(&criteria)
                .into_iter()
                .map(|task| (task, board.is_overdue_at(task, now)))
                .collect();

            if json {
                let payload: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|(task, overdue)| render::task_json(task, *overdue))
                    .collect();
                println!("{}", serde_json::Value::Array(payload));
            } else if rows.is_empty() {
                println!("No tasks found.");
            } else {
                println!("{}", render::tasks_table(&rows));
                let overdue = rows.iter().filter(|(_, overdue)| *overdue).count();
                let overdue = if overdue > 0 {
                    palette.accentize(&format!("{overdue} overdue"))
                } else {
                    format!("{overdue} overdue")
                };
                println!(
                    "{} of {} tasks shown, {}",
                    rows.len(),
                    board.tasks().len(),
                    overdue
                );
            }
        }
        Command::Stats => {
            let stats = board.stats();
            if json {
                println!("{}", serde_json::to_value(stats)?);
            } else {
                println!("{}", render::stats_line(&stats, &palette));
            }
        }
        Command::Notify => {
            let notifier = notifier_from_env()?;
            let outcome = board.notify_overdue(notifier.as_ref());

            for failure in &outcome.failures {
                eprintln!(
                    "WARNING: notification for task {} failed: {}",
                    failure.task_id, failure.error
                );
            }

            if json {
                let payload: Vec<serde_json::Value> = outcome
                    .tasks
                    .iter()
                    .map(|task| render::task_json(task, true))
                    .collect();
                println!("{}", serde_json::Value::Array(payload));
            } else if outcome.tasks.is_empty() {
                println!("No overdue tasks.");
            } else {
                for task in &outcome.tasks {
                    println!("Notified task: {} ({})", task.title, task.id);
                }
            }

            if session == Session::OneShot && !outcome.tasks.is_empty() {
                let abandoned = notifier.wait_for_actions(CLICK_WAIT);
                if abandoned > 0 {
                    tracing::debug!(abandoned, "stopped waiting for notification clicks");
                }
            }
        }
    }

    Ok(())
}

fn run_interactive(board: &mut Board, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) if args.is_empty() => continue,
            Ok(args) => args,
            Err(message) => {
                eprintln!("ERROR: {}", AppError::invalid_input(message));
                continue;
            }
        };

        let cli = match parse_args(config, args) {
            Ok(Some(cli)) => cli,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if let Err(err) = run_command(board, config, cli, Session::Interactive) {
            eprintln!("ERROR: {err}");
        }
        report_warnings(board);
    }

    Ok(())
}

fn load_config(args: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: {err}");
    }
    apply_overrides(&loaded.config, &extract_config_overrides(args))
}

fn open_board(config: &Config) -> Result<Board, AppError> {
    let mut board = TaskBoard::open(JsonFileStore::from_env()?).with_granularity(config.overdue);
    report_warnings(&mut board);
    Ok(board)
}

/// A notification click relaunches the binary with a single `show:ID`.
fn activation_args(args: Vec<String>) -> Vec<String> {
    match args.as_slice() {
        [single] => match parse_activation_argument(single) {
            Some(id) => vec!["show".to_string(), id.to_string()],
            None => args,
        },
        _ => args,
    }
}

fn run(args: Vec<String>) -> Result<(), AppError> {
    let args = activation_args(args);
    let config = load_config(&args)?;

    if args.is_empty() {
        let mut board = open_board(&config)?;
        return run_interactive(&mut board, &config);
    }

    let Some(cli) = parse_args(&config, args)? else {
        return Ok(());
    };

    let mut board = open_board(&config)?;
    let result = run_command(&mut board, &config, cli, Session::OneShot);
    report_warnings(&mut board);
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    if let Err(err) = run(args) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
