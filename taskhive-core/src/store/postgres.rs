/// PostgreSQL store
///
/// sqlx-backed `Store` implementation. The serialized mutations map onto
/// Postgres primitives:
///
/// - refresh-token rotation is a conditional `UPDATE … WHERE refresh_token =
///   $current`; zero rows affected means the caller lost the race
/// - the paired task/list writes run inside a transaction, taking a row lock
///   on the list (`SELECT … FOR UPDATE`) so two concurrent mutations of the
///   same list cannot interleave
///
/// Task membership is stored as a `UUID[]` column on `task_lists`, which
/// keeps insertion order and lets both sides of the relation commit together.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{Role, Task, TaskList, TaskStatus, User};

use super::{Store, StoreError};

/// Creates a connection pool with sane production defaults.
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(url)
        .await
}

/// Runs all pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("running database migrations");
    sqlx::migrate!("../migrations").run(pool).await
}

/// `Store` implementation over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::parse(&role)
            .ok_or_else(|| StoreError::Backend(format!("unknown role value: {role}")))?,
        refresh_token: row.try_get("refresh_token")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn task_list_from_row(row: &PgRow) -> Result<TaskList, StoreError> {
    Ok(TaskList {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        owner: row.try_get("owner")?,
        tasks: row.try_get("tasks")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn task_from_row(row: &PgRow) -> Result<Task, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        due_date: row.try_get("due_date")?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| StoreError::Backend(format!("unknown task status: {status}")))?,
        assigned_user: row.try_get("assigned_user")?,
        task_list: row.try_get("task_list")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, role, refresh_token, created_at, updated_at";
const LIST_COLUMNS: &str = "id, name, owner, tasks, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, title, description, due_date, status, assigned_user, task_list, created_at, updated_at";

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, password_hash, role, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.refresh_token.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET full_name = $2, email = $3, password_hash = $4, role = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(token)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }

        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        // Conditional write: only the holder of the current reference wins.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(user_id)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_task_list(&self, list: TaskList) -> Result<TaskList, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO task_lists (id, name, owner, tasks, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(list.id)
        .bind(&list.name)
        .bind(list.owner)
        .bind(&list.tasks)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(list)
    }

    async fn find_task_list(&self, id: Uuid) -> Result<Option<TaskList>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {LIST_COLUMNS} FROM task_lists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(task_list_from_row).transpose()
    }

    async fn update_task_list(&self, list: &TaskList) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE task_lists SET name = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(list.id)
        .bind(&list.name)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task list"));
        }

        Ok(())
    }

    async fn delete_task_list(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM task_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task list"));
        }

        Ok(())
    }

    async fn list_task_lists(&self) -> Result<Vec<TaskList>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LIST_COLUMNS} FROM task_lists ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(task_list_from_row).collect()
    }

    async fn task_lists_owned_by(&self, user_id: Uuid) -> Result<Vec<TaskList>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LIST_COLUMNS} FROM task_lists WHERE owner = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(task_list_from_row).collect()
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(task_from_row).transpose()
    }

    async fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, due_date = $4, status = $5,
                assigned_user = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.assigned_user)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task"));
        }

        Ok(())
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_user = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(task_from_row).collect()
    }

    async fn insert_task_in_list(&self, task: Task) -> Result<Task, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the list row so concurrent membership writes serialize.
        let list = sqlx::query("SELECT id FROM task_lists WHERE id = $1 FOR UPDATE")
            .bind(task.task_list)
            .fetch_optional(&mut *tx)
            .await?;
        if list.is_none() {
            return Err(StoreError::NotFound("task list"));
        }

        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, due_date, status, assigned_user, task_list, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.assigned_user)
        .bind(task.task_list)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE task_lists
            SET tasks = array_append(tasks, $2), updated_at = NOW()
            WHERE id = $1 AND NOT (tasks @> ARRAY[$2]::uuid[])
            "#,
        )
        .bind(task.task_list)
        .bind(task.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn remove_task_from_list(&self, task_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM task_lists WHERE id = $1 FOR UPDATE")
            .bind(list_id)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        // array_remove is a no-op when the id is already absent.
        sqlx::query(
            "UPDATE task_lists SET tasks = array_remove(tasks, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(list_id)
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    const INIT_MIGRATION: &str = include_str!("../../../migrations/20240115000000_init.sql");

    /// Deleting a task list must succeed even when it still contains tasks,
    /// leaving them as orphans. A foreign key from tasks.task_list back to
    /// task_lists would turn every such delete into a constraint violation,
    /// so the schema must not declare one.
    #[test]
    fn test_schema_lets_list_deletion_orphan_tasks() {
        let tasks_table = INIT_MIGRATION
            .split("CREATE TABLE IF NOT EXISTS tasks")
            .nth(1)
            .and_then(|rest| rest.split(';').next())
            .expect("tasks table definition present");

        assert!(
            !tasks_table.contains("REFERENCES task_lists"),
            "tasks.task_list must not reference task_lists: {tasks_table}"
        );
    }
}
