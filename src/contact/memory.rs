use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{ContactMessage, ContactStore, NewContactMessage};

#[derive(Default)]
pub struct MemoryContactStore {
    messages: RwLock<Vec<ContactMessage>>,
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn create(&self, msg: NewContactMessage) -> anyhow::Result<ContactMessage> {
        let stored = ContactMessage {
            id: Uuid::new_v4(),
            name: msg.name,
            email: msg.email,
            message: msg.message,
            created_at: OffsetDateTime::now_utc(),
        };
        self.messages.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> anyhow::Result<Vec<ContactMessage>> {
        Ok(self.messages.read().await.iter().rev().cloned().collect())
    }
}
