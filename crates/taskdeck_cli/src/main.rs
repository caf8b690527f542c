use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskdeck_cli::cli::{Cli, Command, ConfigOverrideTarget, parse_config_override};
use taskdeck_core::config::{self, ConfigOverrides};
use taskdeck_core::error::AppError;
use taskdeck_core::http::ApiClient;
use taskdeck_core::model::Task;
use taskdeck_core::session::SessionStore;
use taskdeck_core::session::guard::SessionGuard;
use taskdeck_core::{auth_api, task_api};

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("TASKDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::ApiUrl => overrides.api_url = Some(parsed.value),
            ConfigOverrideTarget::TimeoutSecs => {
                let secs = parsed
                    .value
                    .parse::<u64>()
                    .map_err(|_| AppError::invalid_input("timeout must be a number of seconds"))?;
                overrides.timeout_secs = Some(secs);
            }
        }
    }
    Ok(overrides)
}

/// Gate for commands that need a confirmed session. Each command execution
/// mounts a fresh guard and resolves it against the restored store.
fn require_session(store: &SessionStore) -> Result<(), AppError> {
    let mut guard = SessionGuard::new();
    guard.resolve(store);
    guard.require().map_err(|_| {
        AppError::unauthorized("not logged in (run 'taskdeck login <EMAIL> <PASSWORD>' first)")
    })
}

/// A 401 on a task request means the stored token is no longer honored.
/// Drop the session so the next command starts from a clean slate.
fn session_rejected(err: AppError, store: &mut SessionStore) -> AppError {
    if err.code() == "unauthorized" && store.is_authenticated() {
        store.clear().ok();
        return AppError::unauthorized(format!("{} (session cleared, log in again)", err.message()));
    }
    err
}

fn status_label(task: &Task) -> Result<String, AppError> {
    if task.completed {
        return Ok("completed".to_string());
    }
    if task_api::task_overdue(task)? {
        Ok("pending (overdue)".to_string())
    } else {
        Ok("pending".to_string())
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Due")]
    due: String,
}

fn print_tasks_table(tasks: &[Task]) -> Result<(), AppError> {
    if tasks.is_empty() {
        println!("No tasks. Get started with: taskdeck add \"<TITLE>\"");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        rows.push(TaskRow {
            id: task.id.clone(),
            title: task.title.clone(),
            status: status_label(task)?,
            due: task.due_date.clone().unwrap_or_else(|| "-".to_string()),
        });
    }
    println!("{}", Table::new(rows).with(Style::sharp()));
    Ok(())
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
        "due_date": task.due_date,
        "created_at": task.created_at,
        "updated_at": task.updated_at,
    })
}

fn print_tasks_json(tasks: &[Task]) {
    let payload: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn print_task_detail(task: &Task) -> Result<(), AppError> {
    println!("{} | {}", task.id, task.title);
    println!("Status:      {}", status_label(task)?);
    println!(
        "Description: {}",
        task.description.as_deref().unwrap_or("-")
    );
    println!("Due:         {}", task.due_date.as_deref().unwrap_or("-"));
    println!("Created:     {}", task.created_at);
    println!("Updated:     {}", task.updated_at);
    Ok(())
}

fn user_json(store: &SessionStore) -> serde_json::Value {
    match store.user() {
        Some(user) => serde_json::json!({
            "id": user.id,
            "email": user.email,
            "name": user.name,
        }),
        None => serde_json::Value::Null,
    }
}

/// The list is always refetched in full after a mutation; there is no local
/// task cache to patch.
fn print_list_summary(api: &ApiClient, store: &mut SessionStore) -> Result<(), AppError> {
    let tasks =
        task_api::list_tasks(api, store, None).map_err(|err| session_rejected(err, store))?;
    let completed = tasks.iter().filter(|task| task.completed).count();
    println!("{} task(s), {} completed", tasks.len(), completed);
    Ok(())
}

fn confirm_delete(id: &str) -> Result<bool, AppError> {
    print!("Delete task {id}? [y/N] ");
    io::stdout()
        .flush()
        .map_err(|err| AppError::io(err.to_string()))?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|err| AppError::io(err.to_string()))?;

    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn run_command(cli: Cli, api: &ApiClient, store: &mut SessionStore) -> Result<(), AppError> {
    match cli.command {
        Command::Register {
            email,
            password,
            name,
        } => {
            auth_api::register(api, store, &email, &password, &name)?;
            if cli.json {
                println!("{}", user_json(store));
            } else if let Some(user) = store.user() {
                println!("Welcome, {}!", user.display_name());
            }
        }
        Command::Login { email, password } => {
            auth_api::login(api, store, &email, &password)?;
            if cli.json {
                println!("{}", user_json(store));
            } else if let Some(user) = store.user() {
                println!("Welcome, {}!", user.display_name());
            }
        }
        Command::Logout => {
            store.clear()?;
            if cli.json {
                println!("{}", serde_json::json!({"logged_out": true}));
            } else {
                println!("Logged out");
            }
        }
        Command::Whoami => {
            require_session(store)?;
            if cli.json {
                println!("{}", user_json(store));
            } else if let Some(user) = store.user() {
                println!("{} <{}>", user.display_name(), user.email);
            }
        }
        Command::List { completed, pending } => {
            require_session(store)?;
            let filter = if completed {
                Some(true)
            } else if pending {
                Some(false)
            } else {
                None
            };

            let tasks = task_api::list_tasks(api, store, filter)
                .map_err(|err| session_rejected(err, store))?;
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                print_tasks_table(&tasks)?;
            }
        }
        Command::Add { title, description } => {
            require_session(store)?;
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("Title is required")),
            };

            let task = task_api::create_task(api, store, &title, description.as_deref())
                .map_err(|err| session_rejected(err, store))?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Added task: {} ({})", task.title, task.id);
                print_list_summary(api, store)?;
            }
        }
        Command::Show { id } => {
            require_session(store)?;
            let task =
                task_api::get_task(api, store, &id).map_err(|err| session_rejected(err, store))?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                print_task_detail(&task)?;
            }
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            require_session(store)?;
            if title.is_none() && description.is_none() {
                return Err(AppError::invalid_input("nothing to update"));
            }

            // Full-replacement PUT: carry over every field the edit does not
            // own, the completion flag included.
            let current =
                task_api::get_task(api, store, &id).map_err(|err| session_rejected(err, store))?;
            let title = title.unwrap_or_else(|| current.title.clone());
            let description = description.or_else(|| current.description.clone());

            let task = task_api::update_task(
                api,
                store,
                &id,
                &title,
                description.as_deref(),
                current.completed,
            )
            .map_err(|err| session_rejected(err, store))?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Done { id } => {
            require_session(store)?;
            let task = task_api::toggle_complete(api, store, &id)
                .map_err(|err| session_rejected(err, store))?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                if task.completed {
                    println!("Completed task: {} ({})", task.title, task.id);
                } else {
                    println!("Reopened task: {} ({})", task.title, task.id);
                }
                print_list_summary(api, store)?;
            }
        }
        Command::Delete { id, yes } => {
            require_session(store)?;
            if !yes && !confirm_delete(&id)? {
                println!("Aborted");
                return Ok(());
            }

            task_api::delete_task(api, store, &id).map_err(|err| session_rejected(err, store))?;
            if cli.json {
                println!("{}", serde_json::json!({"deleted": id}));
            } else {
                println!("Deleted task: {id}");
                print_list_summary(api, store)?;
            }
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override)?;
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: {err}");
    }
    let merged = config::merge_overrides(&loaded.config, &overrides);

    let api = ApiClient::from_config(&merged)?;
    let mut store = SessionStore::open()?;

    run_command(cli, &api, &mut store)
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

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    let mut saw_quote = false;

    while let Some(ch) = chars.next() {
        match ch {
            quote @ ('"' | '\'') => {
                saw_quote = true;
                loop {
                    match chars.next() {
                        Some('\\') if quote == '"' => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => {
                                return Err(AppError::invalid_input(
                                    "unterminated quote in command",
                                ));
                            }
                        },
                        Some(inner) if inner == quote => break,
                        Some(inner) => current.push(inner),
                        None => {
                            return Err(AppError::invalid_input("unterminated quote in command"));
                        }
                    }
                }
            }
            ch if ch.is_whitespace() => {
                if !current.is_empty() || saw_quote {
                    args.push(std::mem::take(&mut current));
                }
                saw_quote = false;
            }
            ch => current.push(ch),
        }
    }

    if !current.is_empty() || saw_quote {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

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
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskdeck".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if wants_rendered_output(&err) => {
                let _ = err.print();
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run(cli) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn main() {
    init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if wants_rendered_output(&err) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

/// Help and version requests surface as clap errors but carry their own
/// rendering and a zero exit.
fn wants_rendered_output(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
    )
}
