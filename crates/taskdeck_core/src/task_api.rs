use crate::error::AppError;
use crate::http::{self, ApiClient};
use crate::model::{Task, TaskListRecord, TaskRecord};
use crate::session::SessionStore;
use serde::Serialize;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

const LIST_FALLBACK: &str = "Failed to fetch tasks";
const GET_FALLBACK: &str = "Failed to fetch task";
const CREATE_FALLBACK: &str = "Failed to create task";
const UPDATE_FALLBACK: &str = "Failed to update task";
const TOGGLE_FALLBACK: &str = "Failed to toggle task";
const DELETE_FALLBACK: &str = "Failed to delete task";

/// Create/update body. `description` is always serialized so that an absent
/// description reaches the backend as an explicit `null`, and `completed` is
/// only carried on full updates of an existing task.
#[derive(Debug, Serialize)]
struct TaskPayload<'a> {
    title: &'a str,
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
}

fn bearer(store: &SessionStore) -> Result<&str, AppError> {
    store
        .token()
        .ok_or_else(|| AppError::unauthorized("not logged in"))
}

/// Fetch the session user's tasks, optionally filtered by completion state.
pub fn list_tasks(
    client: &ApiClient,
    store: &SessionStore,
    completed: Option<bool>,
) -> Result<Vec<Task>, AppError> {
    let token = bearer(store)?;

    let mut request = client.get("/api/tasks").bearer_auth(token);
    if let Some(completed) = completed {
        request = request.query(&[("completed", completed.to_string())]);
    }

    let response = http::send(request, LIST_FALLBACK)?;
    let list: TaskListRecord = http::decode(response)?;
    Ok(list.tasks.into_iter().map(TaskRecord::normalize).collect())
}

pub fn get_task(client: &ApiClient, store: &SessionStore, id: &str) -> Result<Task, AppError> {
    let trimmed_id = require_id(id)?;
    let token = bearer(store)?;

    let response = http::send(
        client.get(&format!("/api/tasks/{trimmed_id}")).bearer_auth(token),
        GET_FALLBACK,
    )?;
    let record: TaskRecord = http::decode(response)?;
    Ok(record.normalize())
}

/// Create a task. The title is validated before any request is issued.
pub fn create_task(
    client: &ApiClient,
    store: &SessionStore,
    title: &str,
    description: Option<&str>,
) -> Result<Task, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("Title is required"));
    }
    let token = bearer(store)?;

    let payload = TaskPayload {
        title: trimmed,
        description: normalize_description(description),
        completed: None,
    };

    let response = http::send(
        client.post("/api/tasks").bearer_auth(token).json(&payload),
        CREATE_FALLBACK,
    )?;
    let record: TaskRecord = http::decode(response)?;
    Ok(record.normalize())
}

/// Full replacement update. Callers editing an existing task pass its
/// current `completed` flag so the edit cannot reset state the form does
/// not own.
pub fn update_task(
    client: &ApiClient,
    store: &SessionStore,
    id: &str,
    title: &str,
    description: Option<&str>,
    completed: bool,
) -> Result<Task, AppError> {
    let trimmed_id = require_id(id)?;
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("Title is required"));
    }
    let token = bearer(store)?;

    let payload = TaskPayload {
        title: trimmed,
        description: normalize_description(description),
        completed: Some(completed),
    };

    let response = http::send(
        client
            .put(&format!("/api/tasks/{trimmed_id}"))
            .bearer_auth(token)
            .json(&payload),
        UPDATE_FALLBACK,
    )?;
    let record: TaskRecord = http::decode(response)?;
    Ok(record.normalize())
}

/// Flip the completion flag server-side; the client does not need to know
/// the current value.
pub fn toggle_complete(
    client: &ApiClient,
    store: &SessionStore,
    id: &str,
) -> Result<Task, AppError> {
    let trimmed_id = require_id(id)?;
    let token = bearer(store)?;

    let response = http::send(
        client
            .patch(&format!("/api/tasks/{trimmed_id}/complete"))
            .bearer_auth(token),
        TOGGLE_FALLBACK,
    )?;
    let record: TaskRecord = http::decode(response)?;
    Ok(record.normalize())
}

/// Remove the task. Confirming destructive intent is the caller's job.
pub fn delete_task(client: &ApiClient, store: &SessionStore, id: &str) -> Result<(), AppError> {
    let trimmed_id = require_id(id)?;
    let token = bearer(store)?;

    http::send(
        client
            .delete(&format!("/api/tasks/{trimmed_id}"))
            .bearer_auth(token),
        DELETE_FALLBACK,
    )?;
    Ok(())
}

/// True when the task carries a due date earlier than the local calendar
/// day.
pub fn task_overdue(task: &Task) -> Result<bool, AppError> {
    let due_date = match task.due_date.as_deref() {
        Some(value) => value.trim(),
        None => return Ok(false),
    };

    let format = format_description!("[year]-[month]-[day]");
    let due = Date::parse(due_date, &format)
        .map_err(|_| AppError::invalid_data("due_date must be YYYY-MM-DD"))?;

    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();
    Ok(due < today)
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn normalize_description(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|value| !value.is_empty())
}
