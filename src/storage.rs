use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::debug;

use crate::config::S3Config;

/// URL prefix under which locally stored files are served.
pub const LOCAL_URL_PREFIX: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("stored object not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Blob storage for car images. `put_object` returns the reference kept on the record;
/// `delete_object` takes that same reference.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError>;
    async fn delete_object(&self, reference: &str) -> Result<(), StorageError>;
}

/// Drops empty, `.` and `..` segments so a key can never leave the storage root.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Files under a directory on the local disk, served at [`LOCAL_URL_PREFIX`].
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &str) -> PathBuf {
        let key = reference.strip_prefix(LOCAL_URL_PREFIX).unwrap_or(reference);
        self.root.join(sanitize_key(key))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> Result<String, StorageError> {
        let key = sanitize_key(key);
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        debug!(path = %path.display(), bytes = body.len(), "stored file");
        Ok(format!("{LOCAL_URL_PREFIX}/{key}"))
    }

    async fn delete_object(&self, reference: &str) -> Result<(), StorageError> {
        let path = self.path_for(reference);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(reference.to_string()))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove {}", path.display()))
                .into()),
        }
    }
}

/// S3 or MinIO bucket. References are object keys.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError> {
        let key = sanitize_key(key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(key)
    }

    // S3 deletes are idempotent, so a missing key is never reported.
    async fn delete_object(&self, reference: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(reference)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStorage {
        objects: Mutex<HashMap<String, Bytes>>,
        fail_puts: AtomicBool,
    }

    impl MemoryStorage {
        pub async fn contains(&self, reference: &str) -> bool {
            self.objects.lock().await.contains_key(reference)
        }

        pub async fn len(&self) -> usize {
            self.objects.lock().await.len()
        }

        pub fn fail_puts(&self, fail: bool) {
            self.fail_puts.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl StorageClient for MemoryStorage {
        async fn put_object(&self, key: &str, body: Bytes, _ct: &str) -> Result<String, StorageError> {
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(anyhow::anyhow!("storage offline").into());
            }
            let reference = format!("{LOCAL_URL_PREFIX}/{}", sanitize_key(key));
            self.objects.lock().await.insert(reference.clone(), body);
            Ok(reference)
        }

        async fn delete_object(&self, reference: &str) -> Result<(), StorageError> {
            match self.objects.lock().await.remove(reference) {
                Some(_) => Ok(()),
                None => Err(StorageError::NotFound(reference.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("/cars//./a.jpg"), "cars/a.jpg");
    }

    #[tokio::test]
    async fn local_store_and_delete() {
        let dir = std::env::temp_dir().join(format!("carrental-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&dir).await.unwrap();

        let reference = storage
            .put_object("cars/a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(reference, "/uploads/cars/a.jpg");
        assert_eq!(tokio::fs::read(dir.join("cars/a.jpg")).await.unwrap(), b"jpeg");

        storage.delete_object(&reference).await.unwrap();
        assert!(!dir.join("cars/a.jpg").exists());
        assert!(matches!(
            storage.delete_object(&reference).await,
            Err(StorageError::NotFound(_))
        ));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn local_delete_cannot_escape_root() {
        let dir = std::env::temp_dir().join(format!("carrental-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&dir).await.unwrap();
        assert_eq!(storage.path_for("/uploads/../../secret"), dir.join("secret"));
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
