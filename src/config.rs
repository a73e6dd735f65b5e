use std::path::PathBuf;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
/// One year. Keeps `iat + ttl` far inside the range of a timestamp.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(self) -> bool {
        self == AppEnv::Development
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Where uploaded car images end up.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local { upload_dir: PathBuf },
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub frontend_origin: HeaderValue,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests never touch the process env.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match get("APP_ENV").as_deref() {
            Some("development") | Some("dev") => AppEnv::Development,
            None | Some("production") | Some("prod") => AppEnv::Production,
            Some(other) => bail!("APP_ENV must be `development` or `production`, got `{other}`"),
        };

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = match get("JWT_SECRET") {
            Some(s) if !s.is_empty() => s,
            _ if env == AppEnv::Production => bail!("JWT_SECRET must be set in production"),
            _ => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "carrental".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "carrental-clients".into()),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60 * 24)?,
        };
        if !(1..=MAX_JWT_TTL_MINUTES).contains(&jwt.ttl_minutes) {
            bail!("JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}");
        }

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("local") => StorageConfig::Local {
                upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".into())),
            },
            Some("s3") => StorageConfig::S3(S3Config {
                endpoint: get("MINIO_ENDPOINT").context("MINIO_ENDPOINT must be set for s3 storage")?,
                bucket: get("MINIO_BUCKET").context("MINIO_BUCKET must be set for s3 storage")?,
                access_key: get("MINIO_ACCESS_KEY")
                    .context("MINIO_ACCESS_KEY must be set for s3 storage")?,
                secret_key: get("MINIO_SECRET_KEY")
                    .context("MINIO_SECRET_KEY must be set for s3 storage")?,
                region: get("MINIO_REGION").unwrap_or_else(|| "us-east-1".into()),
            }),
            Some(other) => bail!("STORAGE_BACKEND must be `local` or `s3`, got `{other}`"),
        };

        let frontend = get("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into());
        let frontend_origin = HeaderValue::from_str(&frontend)
            .with_context(|| format!("FRONTEND_URL is not a valid origin: {frontend}"))?;

        Ok(Self {
            env,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "APP_PORT", 5000)?,
            database_url,
            jwt,
            storage,
            frontend_origin,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
