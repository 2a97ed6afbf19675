/// Access-token authentication middleware
///
/// Extracts the access token from the `Authorization: Bearer …` header or,
/// failing that, from the `accessToken` cookie; validates it through the
/// access-only path; loads the user record; and inserts both an `Actor`
/// (id + role + email, read fresh from the store so role changes apply
/// immediately) and the full `User` into request extensions for handlers.
///
/// Any failure here is `Unauthorized` ("no valid identity"), never
/// `Forbidden`, which is the policy layer's verdict.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use taskhive_core::auth::{jwt, policy::Actor};

use crate::{app::AppState, error::ApiError};

/// Cookie names under which the token pair travels
pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Requires a valid access token; inserts `Actor` and `User` extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .or_else(|| cookie_value(req.headers(), ACCESS_COOKIE))
        .ok_or_else(|| ApiError::Unauthorized("missing access token".to_string()))?;

    let claims = jwt::validate_access_token(&token, state.jwt_secret())?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".to_string()))?;

    let actor = Actor::new(user.id, user.role, user.email.clone());
    req.extensions_mut().insert(actor);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Pulls the token out of `Authorization: Bearer …`.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

/// Reads a single cookie value from the `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_cookie_value_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=tok123; refreshToken=tok456"),
        );

        assert_eq!(
            cookie_value(&headers, ACCESS_COOKIE).as_deref(),
            Some("tok123")
        );
        assert_eq!(
            cookie_value(&headers, REFRESH_COOKIE).as_deref(),
            Some("tok456")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
