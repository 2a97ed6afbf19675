/// Authentication and authorization
///
/// - `jwt`: HS256 token signing/validation, disjoint access/refresh kinds
/// - `password`: Argon2id hashing and verification
/// - `policy`: the central access-control decision component
/// - `session`: login, refresh-token rotation and revocation

pub mod jwt;
pub mod password;
pub mod policy;
pub mod session;

pub use jwt::{Claims, JwtError, TokenKind};
pub use password::{hash_password, verify_password, PasswordError};
pub use policy::{Actor, Policy, PolicyError};
pub use session::{SessionError, SessionService, TokenPair};
