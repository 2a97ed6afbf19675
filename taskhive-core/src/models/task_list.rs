/// Task lists
///
/// A task list is owned by exactly one user (the authority anchor for
/// ownership checks) and enumerates its tasks by id, in insertion order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A named, user-owned collection of task ids
///
/// Invariant: every id in `tasks` references an existing `Task` whose
/// `task_list` field equals this list's `id`. The pair of writes that keeps
/// the two sides in agreement goes through `Store::insert_task_in_list` /
/// `Store::remove_task_from_list` only.
#[derive(Debug, Clone, Serialize)]
pub struct TaskList {
    /// Unique list ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Owning user, immutable after creation
    pub owner: Uuid,

    /// Member task ids, insertion order preserved, no duplicates
    pub tasks: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskList {
    pub fn new(name: impl Into<String>, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a task id, ignoring duplicates.
    pub fn add_task(&mut self, task_id: Uuid) {
        if !self.tasks.contains(&task_id) {
            self.tasks.push(task_id);
            self.updated_at = Utc::now();
        }
    }

    /// Removes a task id. A missing id is a no-op, not an error: the list may
    /// already have lost the reference in an inconsistent prior state.
    pub fn remove_task(&mut self, task_id: Uuid) {
        self.tasks.retain(|id| *id != task_id);
        self.updated_at = Utc::now();
    }
}
