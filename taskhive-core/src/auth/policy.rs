/// Access-control policy
///
/// The single source of truth for every ownership and role decision in
/// TaskHive. All call sites (route handlers and the task consistency
/// manager) go through `Policy` so the precedence order lives in one place:
///
/// 1. Admin / Super Admin: allowed for every task and task-list operation.
/// 2. Actor owns the target task list: allowed on that list and its tasks.
/// 3. Otherwise: `Forbidden`.
///
/// `Forbidden` means "valid identity, insufficient privilege" and is distinct
/// from `Unauthorized` ("no valid identity"), which is produced by the token
/// layer, never here.
///
/// Two operations, listing all users and promoting/demoting a role,
/// additionally require the actor's email to match a single configured
/// bootstrap address (see DESIGN.md).

use uuid::Uuid;

use crate::models::user::Role;

/// The authenticated identity performing an operation
///
/// Always passed explicitly into policy and consistency-manager calls, never
/// inferred from ambient state. `role` and `email` come from the user record,
/// not from token claims, so a role change takes effect without waiting for
/// the old access token to expire.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
}

impl Actor {
    pub fn new(id: Uuid, role: Role, email: impl Into<String>) -> Self {
        Self {
            id,
            role,
            email: email.into(),
        }
    }
}

/// Error type for policy decisions
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Valid identity, insufficient privilege or ownership
    #[error("{0}")]
    Forbidden(&'static str),

    /// Requested role value is not assignable through the API
    #[error("invalid role: {0}")]
    InvalidRole(String),
}

/// Pure decision component for authorization
#[derive(Debug, Clone)]
pub struct Policy {
    super_admin_email: String,
}

impl Policy {
    pub fn new(super_admin_email: impl Into<String>) -> Self {
        Self {
            super_admin_email: super_admin_email.into(),
        }
    }

    /// Allows owner, Admin and Super Admin; everyone else is `Forbidden`.
    ///
    /// `owner` is the owning user of the target task list, which also anchors
    /// authorization for every task inside that list.
    pub fn require_list_access(&self, actor: &Actor, owner: Uuid) -> Result<(), PolicyError> {
        if actor.role.is_admin() || actor.id == owner {
            return Ok(());
        }

        Err(PolicyError::Forbidden(
            "you do not have permission to access this task list",
        ))
    }

    /// Admin or Super Admin, regardless of ownership. Used for admin-wide
    /// reads such as listing every task list.
    pub fn require_admin(&self, actor: &Actor) -> Result<(), PolicyError> {
        if actor.role.is_admin() {
            return Ok(());
        }

        Err(PolicyError::Forbidden("access denied"))
    }

    /// The single-operator escape hatch: Super Admin role AND the configured
    /// bootstrap email. Gates listing all users and changing roles only.
    pub fn require_operator(&self, actor: &Actor) -> Result<(), PolicyError> {
        if actor.role == Role::SuperAdmin && actor.email == self.super_admin_email {
            return Ok(());
        }

        Err(PolicyError::Forbidden("access denied"))
    }

    /// Parses a requested target role for promote/demote.
    ///
    /// Only `Admin` and `User` are assignable; "Super Admin" (or anything
    /// unrecognized) fails validation even when the operator asks for it.
    pub fn parse_assignable_role(&self, requested: &str) -> Result<Role, PolicyError> {
        match Role::parse(requested) {
            Some(role @ (Role::Admin | Role::User)) => Ok(role),
            _ => Err(PolicyError::InvalidRole(requested.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Policy {
        Policy::new("SuperAdmin@gmail.com")
    }

    fn actor(role: Role) -> Actor {
        Actor::new(Uuid::new_v4(), role, "someone@example.com")
    }

    #[test]
    fn test_owner_may_access_own_list() {
        let p = policy();
        let a = actor(Role::User);
        assert!(p.require_list_access(&a, a.id).is_ok());
    }

    #[test]
    fn test_non_owner_user_is_forbidden() {
        let p = policy();
        let a = actor(Role::User);
        assert!(matches!(
            p.require_list_access(&a, Uuid::new_v4()),
            Err(PolicyError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let p = policy();
        for role in [Role::Admin, Role::SuperAdmin] {
            let a = actor(role);
            assert!(p.require_list_access(&a, Uuid::new_v4()).is_ok());
            assert!(p.require_admin(&a).is_ok());
        }
    }

    #[test]
    fn test_plain_user_fails_admin_check() {
        let p = policy();
        assert!(p.require_admin(&actor(Role::User)).is_err());
    }

    #[test]
    fn test_operator_needs_role_and_email() {
        let p = policy();

        // Right role, wrong email.
        assert!(p.require_operator(&actor(Role::SuperAdmin)).is_err());

        // Right email, wrong role.
        let impostor = Actor::new(Uuid::new_v4(), Role::Admin, "SuperAdmin@gmail.com");
        assert!(p.require_operator(&impostor).is_err());

        // Both.
        let operator = Actor::new(Uuid::new_v4(), Role::SuperAdmin, "SuperAdmin@gmail.com");
        assert!(p.require_operator(&operator).is_ok());
    }

    #[test]
    fn test_assignable_roles() {
        let p = policy();
        assert_eq!(p.parse_assignable_role("Admin").unwrap(), Role::Admin);
        assert_eq!(p.parse_assignable_role("User").unwrap(), Role::User);

        assert!(matches!(
            p.parse_assignable_role("Super Admin"),
            Err(PolicyError::InvalidRole(_))
        ));
        assert!(matches!(
            p.parse_assignable_role("root"),
            Err(PolicyError::InvalidRole(_))
        ));
    }
}
