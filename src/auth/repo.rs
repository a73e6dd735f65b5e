use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{CreatePrincipalError, NewPrincipal, Principal, PrincipalRow, PrincipalStore};
use crate::db::is_unique_violation;

/// Principals in Postgres. Email uniqueness comes from the `principals_email_key` constraint.
pub struct PgPrincipalStore {
    db: PgPool,
}

impl PgPrincipalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM principals
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find principal by email")?;
        row.map(Principal::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find principal by id")?;
        row.map(Principal::try_from).transpose()
    }

    async fn create(&self, p: NewPrincipal) -> Result<Principal, CreatePrincipalError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            INSERT INTO principals (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&p.name)
        .bind(&p.email)
        .bind(&p.password_hash)
        .bind(p.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CreatePrincipalError::DuplicateEmail
            } else {
                CreatePrincipalError::Storage(anyhow::Error::new(e).context("insert principal"))
            }
        })?;
        Ok(Principal::try_from(row)?)
    }
}
