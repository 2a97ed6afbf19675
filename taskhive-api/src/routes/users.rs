/// User account endpoints
///
/// Registration, login/logout, token refresh, profile reads and updates,
/// password changes, and the operator-only role management.
///
/// # Endpoints
///
/// - `POST /api/v1/users/register`: create an account (public)
/// - `POST /api/v1/users/login`: open a session (public)
/// - `POST /api/v1/users/refresh-token`: rotate the token pair (public,
///   authenticated by the refresh token itself)
/// - `POST /api/v1/users/logout`: revoke the session
/// - `GET /api/v1/users`: own profile
/// - `GET /api/v1/users/get-all`: every user (operator only)
/// - `POST /api/v1/users/change-password`
/// - `PATCH /api/v1/users/update-account`
/// - `POST /api/v1/users/update-role`: promote/demote (operator only)
///
/// The token pair is returned in the body and duplicated as HTTP-only
/// `accessToken` / `refreshToken` cookies.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::AppendHeaders,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use taskhive_core::auth::{password, policy::Actor, TokenPair};
use taskhive_core::models::User;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::{cookie_value, ACCESS_COOKIE, REFRESH_COOKIE},
};

/// Two `Set-Cookie` headers carrying a fresh token pair.
fn set_session_cookies(pair: &TokenPair) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            format!(
                "{ACCESS_COOKIE}={}; HttpOnly; Secure; SameSite=Lax; Path=/",
                pair.access_token
            ),
        ),
        (
            header::SET_COOKIE,
            format!(
                "{REFRESH_COOKIE}={}; HttpOnly; Secure; SameSite=Lax; Path=/",
                pair.refresh_token
            ),
        ),
    ])
}

/// Two expired `Set-Cookie` headers, clearing the pair on logout.
fn clear_session_cookies() -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            format!("{ACCESS_COOKIE}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0"),
        ),
        (
            header::SET_COOKIE,
            format!("{REFRESH_COOKIE}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0"),
        ),
    ])
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request; the token may come from the body or the cookie
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Change-password request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Account-details update; at least one field must be supplied
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Role-change request. `role` stays a string so unknown values fail
/// validation in the policy instead of surfacing as a deserialization error.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// `POST /api/v1/users/register`
///
/// # Errors
///
/// - `400`: blank required field or malformed email
/// - `409`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if [&req.full_name, &req.email, &req.password]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ApiError::BadRequest("all fields are required".to_string()));
    }
    req.validate()?;

    let hash = password::hash_password(&req.password)?;
    let user = state
        .store
        .create_user(User::new(req.full_name, req.email, hash))
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /api/v1/users/login`
///
/// Returns the user plus the token pair; the same pair is set as HTTP-only
/// cookies. The failure message never reveals whether the email exists.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let (user, pair) = state.sessions.login(&req.email, &req.password).await?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok((
        set_session_cookies(&pair),
        Json(json!({
            "user": user,
            "access_token": pair.access_token,
            "refresh_token": pair.refresh_token,
        })),
    ))
}

/// `POST /api/v1/users/logout`
///
/// Clears the stored refresh reference and expires both cookies.
pub async fn logout(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<impl axum::response::IntoResponse> {
    state.sessions.revoke(actor.id).await?;

    Ok((
        clear_session_cookies(),
        Json(json!({ "message": "logged out" })),
    ))
}

/// `POST /api/v1/users/refresh-token`
///
/// Rotates a refresh token into a fresh pair. The token is read from the
/// body, falling back to the `refreshToken` cookie.
///
/// # Errors
///
/// - `401`: token missing, invalid, expired, revoked or superseded
pub async fn refresh(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let presented = body
        .and_then(|Json(req)| req.refresh_token)
        .or_else(|| cookie_value(&headers, REFRESH_COOKIE))
        .ok_or_else(|| ApiError::Unauthorized("missing refresh token".to_string()))?;

    let pair = state.sessions.rotate(&presented).await?;

    Ok((
        set_session_cookies(&pair),
        Json(json!({
            "access_token": pair.access_token,
            "refresh_token": pair.refresh_token,
        })),
    ))
}

/// `GET /api/v1/users`: own profile.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// `GET /api/v1/users/get-all`: operator only.
pub async fn get_all(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<User>>> {
    state.policy.require_operator(&actor)?;

    let users = state.store.list_users().await?;
    Ok(Json(users))
}

/// `POST /api/v1/users/change-password`
///
/// # Errors
///
/// - `400`: a field is missing or blank
/// - `401`: old password does not verify
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::BadRequest(
            "both old and new password are required".to_string(),
        ));
    }

    if !password::verify_password(&req.old_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("incorrect password".to_string()));
    }

    let mut updated = user;
    updated.password_hash = password::hash_password(&req.new_password)?;
    updated.touch();
    state.store.update_user(&updated).await?;

    tracing::info!(user_id = %updated.id, "password changed");
    Ok(Json(json!({ "message": "password changed successfully" })))
}

/// `PATCH /api/v1/users/update-account`
///
/// Applies only the supplied fields; at least one is required.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<User>> {
    if req.full_name.is_none() && req.email.is_none() {
        return Err(ApiError::BadRequest(
            "provide at least one field to update".to_string(),
        ));
    }

    let mut updated = user;
    if let Some(full_name) = req.full_name {
        if full_name.trim().is_empty() {
            return Err(ApiError::BadRequest("full name cannot be blank".to_string()));
        }
        updated.full_name = full_name;
    }
    if let Some(email) = req.email {
        if email.trim().is_empty() {
            return Err(ApiError::BadRequest("email cannot be blank".to_string()));
        }
        updated.email = email;
    }
    updated.touch();

    // Duplicate email surfaces as 409 from the store.
    state.store.update_user(&updated).await?;
    Ok(Json(updated))
}

/// `POST /api/v1/users/update-role`: operator only
///
/// The target role must be `Admin` or `User`; requesting "Super Admin" fails
/// validation even for the operator.
///
/// # Errors
///
/// - `400`: role value not assignable
/// - `403`: actor is not the distinguished operator
/// - `404`: target user absent
pub async fn update_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Value>> {
    state.policy.require_operator(&actor)?;
    let role = state.policy.parse_assignable_role(&req.role)?;

    let mut target = state
        .store
        .find_user_by_id(req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    target.role = role;
    target.touch();
    state.store.update_user(&target).await?;

    tracing::info!(user_id = %target.id, role = %role, "role updated");
    Ok(Json(json!({
        "message": "user role updated successfully",
        "user": target,
    })))
}
