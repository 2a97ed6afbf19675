/// JWT issuance and validation
///
/// Tokens are signed with HS256 and carry the issuer claim `"taskhive"`.
/// Two disjoint kinds exist and are validated through separate entry points
/// so a refresh token can never be replayed where an access token is
/// expected, and vice versa:
///
/// - **Access**: minutes-scale lifetime, carries the user's role
/// - **Refresh**: days-scale lifetime, identity only
///
/// The signing secret is process-wide configuration and is never embedded in
/// a token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Issuer claim on every token
pub const ISSUER: &str = "taskhive";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("failed to create token: {0}")]
    Create(String),

    #[error("token has expired")]
    Expired,

    #[error("token validation failed: {0}")]
    Invalid(String),

    /// Presented token is valid but of the wrong kind
    #[error("expected {expected} token")]
    WrongKind { expected: &'static str },
}

/// Token kind claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claims carried by a TaskHive token
///
/// Access tokens carry `{sub, role, iat, exp}`, refresh tokens `{sub, iat,
/// exp}`; both add `iss`, `nbf` and the `kind` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID
    pub sub: Uuid,

    /// Issuer, always "taskhive"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Unique token ID. Two tokens minted for the same user in the same
    /// second would otherwise serialize to the same string, which would make
    /// "superseded reference" checks vacuous.
    pub jti: Uuid,

    /// Account role, access tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Token kind discriminator
    pub kind: TokenKind,
}

impl Claims {
    /// Builds access-token claims for a user.
    pub fn access(user_id: Uuid, role: Role, ttl: Duration) -> Self {
        Self::build(user_id, Some(role), TokenKind::Access, ttl)
    }

    /// Builds refresh-token claims for a user. Refresh tokens carry no role:
    /// the role is re-read from the user record when the pair is rotated.
    pub fn refresh(user_id: Uuid, ttl: Duration) -> Self {
        Self::build(user_id, None, TokenKind::Refresh, ttl)
    }

    fn build(user_id: Uuid, role: Option<Role>, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
            role,
            kind,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact JWT string.
pub fn sign(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Create(e.to_string()))
}

/// Validates signature, expiry, nbf and issuer, returning the claims.
///
/// Kind is not checked here; use `validate_access_token` or
/// `validate_refresh_token` at call sites.
pub fn validate(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Validates a token and requires it to be an access token.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate(token, secret)?;

    if claims.kind != TokenKind::Access {
        return Err(JwtError::WrongKind { expected: "access" });
    }

    Ok(claims)
}

/// Validates a token and requires it to be a refresh token.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate(token, secret)?;

    if claims.kind != TokenKind::Refresh {
        return Err(JwtError::WrongKind { expected: "refresh" });
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-at-least-32-bytes!!";

    #[test]
    fn test_access_token_round_trip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::access(user_id, Role::Admin, Duration::minutes(15));
        let token = sign(&claims, SECRET).unwrap();

        let validated = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.role, Some(Role::Admin));
        assert_eq!(validated.kind, TokenKind::Access);
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_refresh_token_carries_no_role() {
        let claims = Claims::refresh(Uuid::new_v4(), Duration::days(7));
        let token = sign(&claims, SECRET).unwrap();

        let validated = validate_refresh_token(&token, SECRET).unwrap();
        assert_eq!(validated.role, None);
        assert_eq!(validated.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_kind_mismatch_is_rejected_both_ways() {
        let refresh = sign(&Claims::refresh(Uuid::new_v4(), Duration::days(7)), SECRET).unwrap();
        let access = sign(
            &Claims::access(Uuid::new_v4(), Role::User, Duration::minutes(15)),
            SECRET,
        )
        .unwrap();

        assert!(matches!(
            validate_access_token(&refresh, SECRET),
            Err(JwtError::WrongKind { expected: "access" })
        ));
        assert!(matches!(
            validate_refresh_token(&access, SECRET),
            Err(JwtError::WrongKind { expected: "refresh" })
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Issued in the past with a negative ttl, so exp (and nbf) are behind us.
        let claims = Claims::access(Uuid::new_v4(), Role::User, Duration::hours(-2));
        let token = sign(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, SECRET),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims::access(Uuid::new_v4(), Role::User, Duration::minutes(15));
        let token = sign(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, "a-completely-different-secret-value"),
            Err(JwtError::Invalid(_))
        ));
    }
}
