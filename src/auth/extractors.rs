use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{
    jwt::JwtKeys,
    roles::{require_role, HasRole, Role},
};
use crate::error::AppError;

/// Verified identity taken from the bearer token.
///
/// Extracting it is the authentication gate: no token is a 401, a token that fails
/// verification is a 403. It never looks at the role; see [`require_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPrincipal {
    pub id: Uuid,
    pub role: Role,
}

impl HasRole for AuthPrincipal {
    fn role(&self) -> Role {
        self.role
    }
}

/// Takes the token out of `Authorization: Bearer <token>`. Anything else counts as no token.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(AppError::Unauthenticated("Access token required".into()));
        };

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "rejected bearer token");
            AppError::Forbidden("Invalid or expired token".into())
        })?;

        Ok(AuthPrincipal {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Gate plus `require_role(.., Admin)`.
#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal(pub AuthPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = AuthPrincipal::from_request_parts(parts, state).await?;
        require_role(&principal, Role::Admin)?;
        Ok(AdminPrincipal(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_keys;
    use axum::http::Request;

    async fn run<T>(header: Option<&str>, keys: &JwtKeys) -> Result<T, AppError>
    where
        T: FromRequestParts<JwtKeys, Rejection = AppError>,
    {
        let mut builder = Request::builder().uri("/api/car/delete/1");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        T::from_request_parts(&mut parts, keys).await
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let keys = test_keys("s");
        let err = run::<AuthPrincipal>(None, &keys).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn other_schemes_and_empty_bearer_count_as_missing() {
        let keys = test_keys("s");
        for header in ["Basic dXNlcjpwYXNz", "Bearer ", "Bearer    ", "token"] {
            let err = run::<AuthPrincipal>(Some(header), &keys).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated(_)), "{header}");
        }
    }

    #[tokio::test]
    async fn bad_token_is_forbidden() {
        let keys = test_keys("s");
        let foreign = test_keys("other").issue(Uuid::new_v4(), Role::User).unwrap();
        for header in ["Bearer nonsense".to_string(), format!("Bearer {foreign}")] {
            let err = run::<AuthPrincipal>(Some(&header), &keys).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{header}");
        }
    }

    #[tokio::test]
    async fn expired_token_is_forbidden() {
        let keys = test_keys("s");
        let issued = time::OffsetDateTime::now_utc() - time::Duration::hours(2);
        let stale = keys.issue_at(Uuid::new_v4(), Role::User, issued).unwrap();
        let err = run::<AuthPrincipal>(Some(&format!("Bearer {stale}")), &keys)
            .await
            .unwrap_err();
        match err {
            AppError::Forbidden(m) => assert_eq!(m, "Invalid or expired token"),
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn good_token_yields_the_principal() {
        let keys = test_keys("s");
        let id = Uuid::new_v4();
        let token = keys.issue(id, Role::User).unwrap();
        let principal = run::<AuthPrincipal>(Some(&format!("Bearer {token}")), &keys)
            .await
            .unwrap();
        assert_eq!(principal, AuthPrincipal { id, role: Role::User });
    }

    #[tokio::test]
    async fn admin_principal_requires_admin_role() {
        let keys = test_keys("s");
        let user = keys.issue(Uuid::new_v4(), Role::User).unwrap();
        let err = run::<AdminPrincipal>(Some(&format!("Bearer {user}")), &keys)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let admin = keys.issue(Uuid::new_v4(), Role::Admin).unwrap();
        let AdminPrincipal(p) = run::<AdminPrincipal>(Some(&format!("Bearer {admin}")), &keys)
            .await
            .unwrap();
        assert_eq!(p.role, Role::Admin);
    }
}
