use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, msg: NewContactMessage) -> anyhow::Result<ContactMessage>;
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<ContactMessage>>;
}
