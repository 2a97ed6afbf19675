/// Domain models for TaskHive
///
/// Three entity collections, keyed by opaque UUIDs:
///
/// - `user`: accounts, credentials and roles
/// - `task_list`: named, user-owned collections of task ids
/// - `task`: individual tasks, each belonging to exactly one task list
///
/// The referential fields between tasks and task lists are maintained by the
/// consistency manager in `crate::tasks`; nothing else may edit them.

pub mod task;
pub mod task_list;
pub mod user;

pub use task::{CreateTask, Task, TaskStatus, UpdateTask};
pub use task_list::TaskList;
pub use user::{Role, User};
