/// Integration tests for task lists and tasks
///
/// Exercises ownership authorization, the admin override, and the
/// task↔list consistency rules through the full router.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;
use taskhive_core::models::Role;
use taskhive_core::store::Store;
use uuid::Uuid;

#[tokio::test]
async fn test_task_lifecycle_keeps_list_membership_in_step() {
    let ctx = TestContext::new();
    let (_, access) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;

    let list_id = ctx.create_list(&access, "Home").await;
    let task_id = ctx.create_task(&access, list_id, "Buy milk").await;

    let (status, body) = ctx
        .request(
            Method::GET,
            &format!("/api/v1/task-lists/{list_id}"),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"], json!([task_id.to_string()]));

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/tasks/{task_id}"),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Both the task record and the list entry are gone.
    let (status, _) = ctx
        .request(
            Method::GET,
            &format!("/api/v1/tasks/{task_id}"),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx
        .request(
            Method::GET,
            &format!("/api/v1/task-lists/{list_id}"),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(body["tasks"], json!([]));
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new();
    let (_, access) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let list_id = ctx.create_list(&access, "Home").await;

    // Missing due date.
    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/v1/tasks/create",
            Some(&access),
            Some(json!({ "title": "No due date", "task_list": list_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing list.
    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/v1/tasks/create",
            Some(&access),
            Some(json!({ "title": "Nowhere", "due_date": "2026-09-01T12:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nonexistent list.
    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/v1/tasks/create",
            Some(&access),
            Some(json!({
                "title": "Ghost list",
                "due_date": "2026-09-01T12:00:00Z",
                "task_list": Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stranger_is_forbidden_admin_overrides() {
    let ctx = TestContext::new();
    let (_, ana) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let (_, bob) = ctx.signed_in_user("Bob", "bob@example.com", "p1").await;

    let list_id = ctx.create_list(&ana, "Home").await;
    let task_id = ctx.create_task(&ana, list_id, "Buy milk").await;

    // Bob cannot create in, mutate, or delete from Ana's list.
    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/v1/tasks/create",
            Some(&bob),
            Some(json!({
                "title": "Intrusion",
                "due_date": "2026-09-01T12:00:00Z",
                "task_list": list_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/tasks/update/{task_id}"),
            Some(&bob),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/tasks/{task_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // But may read the task by id.
    let (status, body) = ctx
        .request(
            Method::GET,
            &format!("/api/v1/tasks/{task_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Buy milk");

    // An admin deletes regardless of ownership.
    let (admin_id, _) = ctx.signed_in_user("Root", "root@example.com", "p1").await;
    ctx.set_role(admin_id, Role::Admin).await;
    let (admin, _) = ctx.login("root@example.com", "p1").await;

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/tasks/{task_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_patches_fields_but_cannot_move() {
    let ctx = TestContext::new();
    let (_, access) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let list_id = ctx.create_list(&access, "Home").await;
    let other_list = ctx.create_list(&access, "Work").await;
    let task_id = ctx.create_task(&access, list_id, "Buy milk").await;

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/tasks/update/{task_id}"),
            Some(&access),
            Some(json!({ "status": "In Progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "In Progress");
    assert_eq!(body["title"], "Buy milk");

    // Moving between lists is rejected, even for the owner of both.
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/tasks/update/{task_id}"),
            Some(&access),
            Some(json!({ "task_list": other_list })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_and_unassign() {
    let ctx = TestContext::new();
    let (_, ana) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let (bob_id, _) = ctx.signed_in_user("Bob", "bob@example.com", "p1").await;

    let list_id = ctx.create_list(&ana, "Home").await;
    let task_id = ctx.create_task(&ana, list_id, "Buy milk").await;

    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/api/v1/tasks/assign/{task_id}"),
            Some(&ana),
            Some(json!({ "user_id": bob_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["assigned_user"], bob_id.to_string());

    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/api/v1/tasks/unassign/{task_id}"),
            Some(&ana),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_user"], json!(null));
}

#[tokio::test]
async fn test_visible_lists_include_assignments() {
    let ctx = TestContext::new();
    let (_, ana) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let (bob_id, bob) = ctx.signed_in_user("Bob", "bob@example.com", "p1").await;

    let ana_list = ctx.create_list(&ana, "Home").await;
    let bob_list = ctx.create_list(&bob, "Mine").await;
    let task_id = ctx.create_task(&ana, ana_list, "Shared chore").await;

    ctx.request(
        Method::POST,
        &format!("/api/v1/tasks/assign/{task_id}"),
        Some(&ana),
        Some(json!({ "user_id": bob_id })),
    )
    .await;

    let (status, body) = ctx
        .request(Method::GET, "/api/v1/task-lists/", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut ids: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|list| list["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    let mut expected = vec![ana_list.to_string(), bob_list.to_string()];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_list_get_all_is_admin_only() {
    let ctx = TestContext::new();
    let (_, ana) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    ctx.create_list(&ana, "Home").await;

    let (status, _) = ctx
        .request(Method::GET, "/api/v1/task-lists/get-all", Some(&ana), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (admin_id, _) = ctx.signed_in_user("Root", "root@example.com", "p1").await;
    ctx.set_role(admin_id, Role::Admin).await;
    let (admin, _) = ctx.login("root@example.com", "p1").await;

    let (status, body) = ctx
        .request(Method::GET, "/api/v1/task-lists/get-all", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_access_is_owner_or_admin() {
    let ctx = TestContext::new();
    let (_, ana) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let (_, bob) = ctx.signed_in_user("Bob", "bob@example.com", "p1").await;
    let list_id = ctx.create_list(&ana, "Home").await;

    let (status, _) = ctx
        .request(
            Method::GET,
            &format!("/api/v1/task-lists/{list_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/task-lists/update/{list_id}"),
            Some(&bob),
            Some(json!({ "name": "Stolen" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/task-lists/{list_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleting_a_list_does_not_cascade_to_tasks() {
    let ctx = TestContext::new();
    let (_, access) = ctx.signed_in_user("Ana", "ana@example.com", "p1").await;
    let list_id = ctx.create_list(&access, "Home").await;
    let task_id = ctx.create_task(&access, list_id, "Survivor").await;

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/task-lists/{list_id}"),
            Some(&access),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The task record outlives its list and stays fetchable by id.
    let task = ctx.store.find_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.title, "Survivor");
}
