/// Tasks and task mutation inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Progress status of a task
///
/// Wire spellings match the persisted values: "Not Started", "In Progress",
/// "Completed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value {
            "Not Started" => Some(TaskStatus::NotStarted),
            "In Progress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// A single task
///
/// `task_list` is immutable after creation: a task cannot move between lists.
/// Invariant: `task_list` references an existing `TaskList` whose `tasks`
/// collection contains this task's `id`.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    /// Required due date
    pub due_date: DateTime<Utc>,

    pub status: TaskStatus,

    /// Assigned user, if any. Existence of the user is deliberately not
    /// validated on assignment (see DESIGN.md).
    pub assigned_user: Option<Uuid>,

    /// Owning task list, immutable after creation
    pub task_list: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        due_date: DateTime<Utc>,
        status: TaskStatus,
        assigned_user: Option<Uuid>,
        task_list: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description,
            due_date,
            status,
            assigned_user,
            task_list,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a task
///
/// `due_date` and `task_list` are typed as `Option` because the transport may
/// omit them; the consistency manager rejects a missing value with `Invalid`
/// rather than letting deserialization decide the error shape.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub status: Option<TaskStatus>,

    pub assigned_user: Option<Uuid>,

    pub task_list: Option<Uuid>,
}

/// Partial update for a task; only supplied fields are applied
///
/// `task_list` is present so that an attempt to move a task between lists can
/// be rejected explicitly instead of being silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,

    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub status: Option<TaskStatus>,

    pub task_list: Option<Uuid>,
}
