/// Persistence abstraction
///
/// The core never talks to a database directly: everything goes through the
/// `Store` trait, which loads and saves entities by identifier and runs the
/// handful of queries the domain needs. Two implementations exist:
///
/// - `MemStore`: in-process maps behind one mutex, used by tests and as an
///   infrastructure-free dev mode
/// - `PgStore`: PostgreSQL via sqlx
///
/// Three mutations are special because they touch state that concurrent
/// requests race on, and every implementation must serialize them per entity:
///
/// - `rotate_refresh_token`: compare-and-swap on the per-user refresh
///   reference, so a superseded refresh token can never win a rotation race
/// - `insert_task_in_list` / `remove_task_from_list`: both sides of the
///   task↔list relation written as one unit, so no reader observes a task
///   whose owning list omits it or a list entry whose task is gone

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Task, TaskList, User};

pub use memory::MemStore;
pub use postgres::{create_pool, run_migrations, PgStore};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Referenced entity absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Email uniqueness violation
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// Backend failure; surfaces as a server fault, detail is logged and
    /// never shown to callers
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("record"),
            sqlx::Error::Database(db_err) => {
                if db_err
                    .constraint()
                    .map_or(false, |name| name.contains("email"))
                {
                    return StoreError::DuplicateEmail;
                }
                StoreError::Backend(db_err.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Entity persistence consumed by the core
#[async_trait]
pub trait Store: Send + Sync {
    // -- users ------------------------------------------------------------

    /// Persists a new user. Fails with `DuplicateEmail` if another user
    /// already holds the email (case-insensitive).
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Writes back a full user record (profile, password, role). Does not
    /// touch `refresh_token`; that field has its own serialized mutations.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Overwrites the refresh-token reference unconditionally. Login sets a
    /// fresh value (invalidating any previous session), logout clears it.
    async fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), StoreError>;

    /// Compare-and-swap on the refresh-token reference: stores `next` only if
    /// the current value still equals `current`, returning whether the swap
    /// happened. `false` means the presented token was superseded by a newer
    /// login or a concurrent rotation.
    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError>;

    // -- task lists -------------------------------------------------------

    async fn create_task_list(&self, list: TaskList) -> Result<TaskList, StoreError>;

    async fn find_task_list(&self, id: Uuid) -> Result<Option<TaskList>, StoreError>;

    async fn update_task_list(&self, list: &TaskList) -> Result<(), StoreError>;

    /// Deletes the list record. Member tasks are not cascaded (original
    /// backend behavior, recorded in DESIGN.md).
    async fn delete_task_list(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list_task_lists(&self) -> Result<Vec<TaskList>, StoreError>;

    async fn task_lists_owned_by(&self, user_id: Uuid) -> Result<Vec<TaskList>, StoreError>;

    // -- tasks ------------------------------------------------------------

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn update_task(&self, task: &Task) -> Result<(), StoreError>;

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Persists the task and appends its id to the owning list's collection
    /// as one unit. Fails with `NotFound` if the list is gone.
    async fn insert_task_in_list(&self, task: Task) -> Result<Task, StoreError>;

    /// Deletes the task and removes its id from the list's collection as one
    /// unit. An id already absent from the collection is removed as a no-op.
    async fn remove_task_from_list(&self, task_id: Uuid, list_id: Uuid) -> Result<(), StoreError>;
}
