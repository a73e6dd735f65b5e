use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{claims::Claims, roles::Role};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

/// Signing and verification keys plus the fixed claim values.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes as u64) * 60),
        }
    }

    pub fn issue(&self, principal_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue_at(principal_id, role, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, principal_id: Uuid, role: Role, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: principal_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(principal_id = %principal_id, %role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        debug!(principal_id = %data.claims.sub, role = %data.claims.role, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str) -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        secret: secret.into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 60,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_returns_claims() {
        let keys = test_keys("dev-secret");
        let id = Uuid::new_v4();
        let token = keys.issue(id, Role::Admin).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn token_past_its_ttl_is_expired() {
        let keys = test_keys("dev-secret");
        let two_hours_ago = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys
            .issue_at(Uuid::new_v4(), Role::User, two_hours_ago)
            .expect("sign");
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_just_inside_its_ttl_is_accepted() {
        let keys = test_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(59);
        let token = keys.issue_at(Uuid::new_v4(), Role::User, issued).expect("sign");
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = test_keys("secret-a").issue(Uuid::new_v4(), Role::User).unwrap();
        assert_eq!(test_keys("secret-b").verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = test_keys("dev-secret");
        for token in ["", "abc", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30."] {
            assert_eq!(keys.verify(token), Err(TokenError::Invalid), "{token}");
        }
    }

    #[test]
    fn other_audience_is_rejected() {
        let good = test_keys("same-secret");
        let other = JwtKeys::from_config(&JwtConfig {
            secret: "same-secret".into(),
            issuer: "test-issuer".into(),
            audience: "someone-else".into(),
            ttl_minutes: 60,
        });
        let token = good.issue(Uuid::new_v4(), Role::User).unwrap();
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }
}
