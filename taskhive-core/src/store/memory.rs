/// In-memory store
///
/// Three maps behind a single async mutex. Holding one lock across each
/// operation gives the per-entity serialization the `Store` contract asks
/// for (refresh-token compare-and-swap, paired task/list writes) without any
/// further machinery. Used by the test suites and as a dev mode that needs
/// no database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Task, TaskList, User};

use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    lists: HashMap<Uuid, TaskList>,
    tasks: HashMap<Uuid, Task>,
}

/// Infrastructure-free `Store` implementation
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;

        let taken = inner
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(StoreError::DuplicateEmail);
        }

        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        let taken = inner
            .users
            .values()
            .any(|other| other.id != user.id && other.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(StoreError::DuplicateEmail);
        }

        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::NotFound("user"))?;

        // Preserve the refresh reference: full-record writes never touch it.
        let refresh_token = stored.refresh_token.clone();
        *stored = user.clone();
        stored.refresh_token = refresh_token;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.lock().await.users.values().cloned().collect())
    }

    async fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("user"))?;

        user.refresh_token = token.map(str::to_owned);
        user.touch();
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("user"))?;

        if user.refresh_token.as_deref() != Some(current) {
            return Ok(false);
        }

        user.refresh_token = Some(next.to_owned());
        user.touch();
        Ok(true)
    }

    async fn create_task_list(&self, list: TaskList) -> Result<TaskList, StoreError> {
        self.inner.lock().await.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn find_task_list(&self, id: Uuid) -> Result<Option<TaskList>, StoreError> {
        Ok(self.inner.lock().await.lists.get(&id).cloned())
    }

    async fn update_task_list(&self, list: &TaskList) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .lists
            .get_mut(&list.id)
            .ok_or(StoreError::NotFound("task list"))?;

        *stored = list.clone();
        Ok(())
    }

    async fn delete_task_list(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .lists
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("task list"))
    }

    async fn list_task_lists(&self) -> Result<Vec<TaskList>, StoreError> {
        Ok(self.inner.lock().await.lists.values().cloned().collect())
    }

    async fn task_lists_owned_by(&self, user_id: Uuid) -> Result<Vec<TaskList>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .lists
            .values()
            .filter(|list| list.owner == user_id)
            .cloned()
            .collect())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.lock().await.tasks.get(&id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .tasks
            .get_mut(&task.id)
            .ok_or(StoreError::NotFound("task"))?;

        *stored = task.clone();
        Ok(())
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .tasks
            .values()
            .filter(|task| task.assigned_user == Some(user_id))
            .cloned()
            .collect())
    }

    async fn insert_task_in_list(&self, task: Task) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().await;

        let list = inner
            .lists
            .get_mut(&task.task_list)
            .ok_or(StoreError::NotFound("task list"))?;
        list.add_task(task.id);

        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn remove_task_from_list(&self, task_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        inner.tasks.remove(&task_id);
        if let Some(list) = inner.lists.get_mut(&list_id) {
            list.remove_task(task_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::TaskStatus;

    fn user(email: &str) -> User {
        User::new("Test User", email, "$argon2id$fake")
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_case_insensitively() {
        let store = MemStore::new();
        store.create_user(user("a@x.com")).await.unwrap();

        assert!(matches!(
            store.create_user(user("A@X.COM")).await,
            Err(StoreError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let store = MemStore::new();
        let created = store.create_user(user("Ana@x.com")).await.unwrap();

        let found = store.find_user_by_email("ana@X.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_update_user_preserves_refresh_reference() {
        let store = MemStore::new();
        let mut u = store.create_user(user("a@x.com")).await.unwrap();
        store.set_refresh_token(u.id, Some("tok")).await.unwrap();

        u.full_name = "Renamed".to_string();
        store.update_user(&u).await.unwrap();

        let reloaded = store.find_user_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(reloaded.full_name, "Renamed");
        assert_eq!(reloaded.refresh_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_refresh_rotation_is_compare_and_swap() {
        let store = MemStore::new();
        let u = store.create_user(user("a@x.com")).await.unwrap();
        store.set_refresh_token(u.id, Some("first")).await.unwrap();

        assert!(store.rotate_refresh_token(u.id, "first", "second").await.unwrap());

        // The superseded value loses.
        assert!(!store.rotate_refresh_token(u.id, "first", "third").await.unwrap());

        let reloaded = store.find_user_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(reloaded.refresh_token.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_paired_task_writes_stay_consistent() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        let list = store
            .create_task_list(TaskList::new("Home", owner))
            .await
            .unwrap();

        let task = Task::new(
            "Buy milk",
            None,
            Utc::now(),
            TaskStatus::NotStarted,
            None,
            list.id,
        );
        let task = store.insert_task_in_list(task).await.unwrap();

        let list = store.find_task_list(list.id).await.unwrap().unwrap();
        assert!(list.tasks.contains(&task.id));

        store.remove_task_from_list(task.id, list.id).await.unwrap();
        let list = store.find_task_list(list.id).await.unwrap().unwrap();
        assert!(list.tasks.is_empty());
        assert!(store.find_task(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_into_missing_list_fails() {
        let store = MemStore::new();
        let task = Task::new(
            "Orphan",
            None,
            Utc::now(),
            TaskStatus::NotStarted,
            None,
            Uuid::new_v4(),
        );

        assert!(matches!(
            store.insert_task_in_list(task).await,
            Err(StoreError::NotFound("task list"))
        ));
    }
}
