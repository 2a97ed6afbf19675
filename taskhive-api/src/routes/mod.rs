/// API route handlers, organized by resource
///
/// - `health`: health check
/// - `users`: registration, sessions, account and role management
/// - `task_lists`: task-list CRUD and listings
/// - `tasks`: task CRUD, assignment, and the consistency-managed mutations

pub mod health;
pub mod task_lists;
pub mod tasks;
pub mod users;
