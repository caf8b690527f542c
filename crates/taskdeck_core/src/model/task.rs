use serde::{Deserialize, Serialize};

/// A task as the rest of the client sees it, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: String,
}

/// Wire shape of a task record as the backend emits it: snake_case fields
/// and a numeric id. `due_date` is read when present but never sent back.
#[derive(Debug, Deserialize)]
pub struct TaskRecord {
    id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
    user_id: String,
}

impl TaskRecord {
    pub fn normalize(self) -> Task {
        Task {
            id: self.id.to_string(),
            title: self.title,
            description: self.description,
            completed: self.completed,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user_id: self.user_id,
        }
    }
}

/// `GET /api/tasks` wraps the records in a `tasks` envelope.
#[derive(Debug, Deserialize)]
pub struct TaskListRecord {
    pub tasks: Vec<TaskRecord>,
}

#[cfg(test)]
mod tests {
    use super::{TaskListRecord, TaskRecord};

    #[test]
    fn normalize_stringifies_numeric_id() {
        let record: TaskRecord = serde_json::from_str(
            r#"{
                "id": 42,
                "user_id": "7",
                "title": "Buy milk",
                "description": null,
                "completed": false,
                "created_at": "2026-01-05T09:00:00",
                "updated_at": "2026-01-05T09:00:00"
            }"#,
        )
        .unwrap();

        let task = record.normalize();
        assert_eq!(task.id, "42");
        assert_eq!(task.user_id, "7");
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
        assert!(!task.completed);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let record: TaskRecord = serde_json::from_str(
            r#"{
                "id": 1,
                "user_id": "7",
                "title": "Bare",
                "created_at": "2026-01-05T09:00:00",
                "updated_at": "2026-01-05T09:00:00"
            }"#,
        )
        .unwrap();

        let task = record.normalize();
        assert_eq!(task.description, None);
        assert!(!task.completed);
    }

    #[test]
    fn rejects_mistyped_completed_flag() {
        let result: Result<TaskRecord, _> = serde_json::from_str(
            r#"{
                "id": 1,
                "user_id": "7",
                "title": "Bad",
                "completed": "yes",
                "created_at": "2026-01-05T09:00:00",
                "updated_at": "2026-01-05T09:00:00"
            }"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn list_envelope_unwraps() {
        let list: TaskListRecord = serde_json::from_str(
            r#"{"tasks": [
                {
                    "id": 1,
                    "user_id": "7",
                    "title": "One",
                    "completed": true,
                    "created_at": "2026-01-05T09:00:00",
                    "updated_at": "2026-01-06T10:00:00"
                }
            ]}"#,
        )
        .unwrap();

        assert_eq!(list.tasks.len(), 1);
        let task = list.tasks.into_iter().next().unwrap().normalize();
        assert!(task.completed);
        assert_eq!(task.updated_at, "2026-01-06T10:00:00");
    }
}
