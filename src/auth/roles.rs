use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Addresses under this domain sign up as admins.
pub const ADMIN_EMAIL_SUFFIX: &str = "@admin.com";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role `{other}`"),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the address sits under the admin domain. Case-insensitive: the email is
/// normalized first, so `Boss@ADMIN.com` cannot slip past as a user or vice versa.
pub fn is_admin_email(email: &str) -> bool {
    crate::validation::normalize_email(email).ends_with(ADMIN_EMAIL_SUFFIX)
}

pub fn resolve_role(email: &str) -> Role {
    if is_admin_email(email) {
        Role::Admin
    } else {
        Role::User
    }
}

/// Anything that carries a role: stored principals and verified token identities.
pub trait HasRole {
    fn role(&self) -> Role;
}

/// Per-operation authorization. The gate only authenticates; routes that need a role
/// call this (directly or through `AdminPrincipal`).
pub fn require_role(principal: &impl HasRole, required: Role) -> Result<(), AppError> {
    if principal.role() == required {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Access denied: {required} role required")))
    }
}
