use std::sync::Arc;

use tracing::info;

use crate::{
    auth::{jwt::JwtKeys, repo::PgPrincipalStore, repo_types::PrincipalStore},
    cars::{repo::PgCarStore, repo_types::CarStore},
    config::{AppConfig, StorageConfig},
    contact::{repo::PgContactStore, repo_types::ContactStore},
    db::Database,
    storage::{LocalStorage, S3Storage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub principals: Arc<dyn PrincipalStore>,
    pub cars: Arc<dyn CarStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig, db: &Database) -> anyhow::Result<Self> {
        let storage: Arc<dyn StorageClient> = match &config.storage {
            StorageConfig::Local { upload_dir } => {
                let local = LocalStorage::new(upload_dir.clone()).await?;
                info!(dir = %local.root().display(), "using local image storage");
                Arc::new(local)
            }
            StorageConfig::S3(s3) => {
                info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "using s3 image storage");
                Arc::new(S3Storage::new(s3).await?)
            }
        };

        let pool = db.pool().clone();
        Ok(Self::from_parts(
            config,
            Arc::new(PgPrincipalStore::new(pool.clone())),
            Arc::new(PgCarStore::new(pool.clone())),
            Arc::new(PgContactStore::new(pool)),
            storage,
        ))
    }

    pub fn from_parts(
        config: AppConfig,
        principals: Arc<dyn PrincipalStore>,
        cars: Arc<dyn CarStore>,
        contacts: Arc<dyn ContactStore>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            config: Arc::new(config),
            principals,
            cars,
            contacts,
            storage,
        }
    }
}

/// Handles to the in-memory backends behind [`AppState::fake`].
#[cfg(test)]
pub struct Fakes {
    pub storage: Arc<crate::storage::memory::MemoryStorage>,
    pub cars: Arc<crate::cars::memory::MemoryCarStore>,
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> (Self, Fakes) {
        Self::fake_in(crate::config::AppEnv::Development)
    }

    pub fn fake_in(env: crate::config::AppEnv) -> (Self, Fakes) {
        use crate::{
            auth::memory::MemoryPrincipalStore, cars::memory::MemoryCarStore,
            contact::memory::MemoryContactStore, storage::memory::MemoryStorage,
        };

        let config = AppConfig::from_lookup(|key| match key {
            "APP_ENV" if env.is_development() => Some("development".into()),
            "APP_ENV" => Some("production".into()),
            "DATABASE_URL" => Some("postgres://unused@localhost/unused".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .expect("test config");

        let storage = Arc::new(MemoryStorage::default());
        let cars = Arc::new(MemoryCarStore::default());
        let state = Self::from_parts(
            config,
            Arc::new(MemoryPrincipalStore::default()),
            cars.clone(),
            Arc::new(MemoryContactStore::default()),
            storage.clone(),
        );
        (state, Fakes { storage, cars })
    }
}
