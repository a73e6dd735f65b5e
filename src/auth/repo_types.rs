use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::roles::{HasRole, Role};

/// Principal row as stored; `role` is plain text in the table.
#[derive(Debug, FromRow)]
pub struct PrincipalRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

/// A user or an admin.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String, // normalized, unique
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = anyhow::Error;

    fn try_from(r: PrincipalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            role: r.role.parse()?,
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            created_at: r.created_at,
        })
    }
}

impl HasRole for Principal {
    fn role(&self) -> Role {
        self.role
    }
}

/// Validated signup data with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum CreatePrincipalError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Credential store. `create` must be an atomic check-and-insert on `email`.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Principal>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Principal>>;
    async fn create(&self, principal: NewPrincipal) -> Result<Principal, CreatePrincipalError>;
}
