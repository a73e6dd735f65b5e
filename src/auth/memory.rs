use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{CreatePrincipalError, NewPrincipal, Principal, PrincipalStore};

/// In-memory principals keyed by email. The write lock makes check-and-insert atomic.
#[derive(Default)]
pub struct MemoryPrincipalStore {
    by_email: RwLock<HashMap<String, Principal>>,
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Principal>> {
        Ok(self.by_email.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Principal>> {
        Ok(self
            .by_email
            .read()
            .await
            .values()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, p: NewPrincipal) -> Result<Principal, CreatePrincipalError> {
        let mut map = self.by_email.write().await;
        if map.contains_key(&p.email) {
            return Err(CreatePrincipalError::DuplicateEmail);
        }
        let principal = Principal {
            id: Uuid::new_v4(),
            name: p.name,
            email: p.email.clone(),
            password_hash: p.password_hash,
            role: p.role,
            created_at: OffsetDateTime::now_utc(),
        };
        map.insert(p.email, principal.clone());
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use std::sync::Arc;

    fn draft(email: &str) -> NewPrincipal {
        NewPrincipal {
            name: "Asha".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn concurrent_signups_with_one_email_yield_one_winner() {
        let store = Arc::new(MemoryPrincipalStore::default());
        let a = tokio::spawn({
            let store = store.clone();
            async move { store.create(draft("same@example.com")).await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.create(draft("same@example.com")).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(CreatePrincipalError::DuplicateEmail)))
            .count();
        assert_eq!((ok, dup), (1, 1));
    }

    #[tokio::test]
    async fn lookups_find_created_principal() {
        let store = MemoryPrincipalStore::default();
        let p = store.create(draft("a@example.com")).await.unwrap();
        assert_eq!(store.find_by_email("a@example.com").await.unwrap().unwrap().id, p.id);
        assert_eq!(store.find_by_id(p.id).await.unwrap().unwrap().email, "a@example.com");
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
    }
}
