/// Session lifecycle: login, token rotation, revocation
///
/// `SessionService` owns the credential lifecycle end to end and is the only
/// component allowed to write `User.refresh_token`. Its side effects are
/// exactly: reading and writing that one field through the store.
///
/// Single-session-per-user by design: the stored reference is the point of
/// truth for "which refresh token is currently valid". A login overwrites it,
/// a rotation swaps it with compare-and-swap semantics, a logout clears it.
/// Any refresh token that is not the stored reference (superseded by a newer
/// login, beaten in a rotation race, or revoked) fails with `Unauthorized`
/// semantics (`InvalidRefresh`).

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::models::User;
use crate::store::{Store, StoreError};

use super::jwt::{self, Claims, JwtError};
use super::password::{self, PasswordError};

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Login failed. One message for unknown email and wrong password, so
    /// the response never reveals whether the email exists.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Refresh token is invalid, expired, revoked or superseded
    #[error("invalid refresh token")]
    InvalidRefresh,

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues, rotates and revokes session token pairs
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn Store>,
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn Store>,
        secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            store,
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Signs a fresh access/refresh pair for a user. Does not persist
    /// anything; callers decide which reference becomes current.
    fn issue_pair(&self, user: &User) -> Result<TokenPair, SessionError> {
        let access_token = jwt::sign(
            &Claims::access(user.id, user.role, self.access_ttl),
            &self.secret,
        )?;
        let refresh_token = jwt::sign(&Claims::refresh(user.id, self.refresh_ttl), &self.secret)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verifies credentials and opens a session.
    ///
    /// The new refresh token overwrites any stored reference, which
    /// implicitly invalidates the previous session.
    pub async fn login(&self, email: &str, pass: &str) -> Result<(User, TokenPair), SessionError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        if !password::verify_password(pass, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let pair = self.issue_pair(&user)?;
        self.store
            .set_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user, pair))
    }

    /// Rotates a refresh token into a fresh pair.
    ///
    /// The presented token must both validate cryptographically and equal
    /// the stored reference; the swap to the new reference is a
    /// compare-and-swap keyed on the presented token, so of two concurrent
    /// rotations for the same user exactly one wins and the other gets
    /// `InvalidRefresh`.
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair, SessionError> {
        let claims = jwt::validate_refresh_token(presented, &self.secret)
            .map_err(|_| SessionError::InvalidRefresh)?;

        let user = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(SessionError::InvalidRefresh)?;

        if user.refresh_token.as_deref() != Some(presented) {
            tracing::debug!(user_id = %user.id, "rotation rejected: superseded refresh token");
            return Err(SessionError::InvalidRefresh);
        }

        let pair = self.issue_pair(&user)?;
        let swapped = self
            .store
            .rotate_refresh_token(user.id, presented, &pair.refresh_token)
            .await?;
        if !swapped {
            // Lost the race to a concurrent rotation or a newer login.
            return Err(SessionError::InvalidRefresh);
        }

        Ok(pair)
    }

    /// Ends the user's session. Future rotations fail until the next login.
    pub async fn revoke(&self, user_id: Uuid) -> Result<(), SessionError> {
        self.store.set_refresh_token(user_id, None).await?;
        Ok(())
    }
}
