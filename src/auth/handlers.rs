use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AdminLoginResponse, AuthResponse, LoginRequest, MeResponse, PublicPrincipal, SignupRequest},
    extractors::AuthPrincipal,
    password::{hash_password, verify_dummy, verify_password},
    repo_types::{CreatePrincipalError, NewPrincipal, Principal},
    roles::{is_admin_email, require_role, resolve_role, Role, ADMIN_EMAIL_SUFFIX},
};
use crate::{
    error::AppError,
    extract::AppJson,
    state::AppState,
    validation::{self, MIN_PASSWORD_LEN},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/api/admin/signup", post(admin_signup))
        .route("/api/admin/login", post(admin_login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(get_me))
}

fn validate_signup(payload: SignupRequest) -> Result<(String, String, String), AppError> {
    let name = validation::required_text(&payload.name, "Name is required")?;
    let email = validation::email(&payload.email, "Valid email is required")?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok((name, email, payload.password))
}

fn validate_login(payload: LoginRequest) -> Result<(String, String), AppError> {
    let email = validation::email(&payload.email, "Valid email is required")?;
    if payload.password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }
    Ok((email, payload.password))
}

/// Hashes, inserts and signs. The store's uniqueness constraint is the only duplicate check.
async fn register(
    state: &AppState,
    name: String,
    email: String,
    password: &str,
    role: Role,
) -> Result<(Principal, String), AppError> {
    let plain = password.to_owned();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("password hashing task")??;
    let principal = state
        .principals
        .create(NewPrincipal {
            name,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            CreatePrincipalError::DuplicateEmail => AppError::Duplicate("Email already exists".into()),
            CreatePrincipalError::Storage(e) => AppError::Internal(e),
        })?;
    let token = state.jwt.issue(principal.id, principal.role)?;
    info!(principal_id = %principal.id, role = %principal.role, "principal registered");
    Ok((principal, token))
}

/// Looks up and checks the password. Unknown email and wrong password look the same.
async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<Principal, AppError> {
    let invalid = || AppError::Unauthenticated("Invalid credentials".into());
    let found = state.principals.find_by_email(email).await?;

    // argon2 is CPU bound; keep it off the async workers
    let plain = password.to_owned();
    let hash = found.as_ref().map(|p| p.password_hash.clone());
    let matches = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&plain, &hash),
        None => {
            verify_dummy(&plain);
            false
        }
    })
    .await
    .context("password verification task")?;

    match found {
        Some(principal) if matches => Ok(principal),
        Some(principal) => {
            warn!(principal_id = %principal.id, "login with wrong password");
            Err(invalid())
        }
        None => {
            warn!("login for unknown email");
            Err(invalid())
        }
    }
}

fn auth_response(message: &'static str, principal: &Principal, token: String) -> AuthResponse {
    AuthResponse {
        success: true,
        message,
        token,
        role: principal.role,
        name: principal.name.clone(),
        user: PublicPrincipal::from(principal),
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (name, email, password) = validate_signup(payload)?;
    let role = resolve_role(&email);
    let (principal, token) = register(&state, name, email, &password, role).await?;
    Ok((
        StatusCode::CREATED,
        Json(auth_response("User created successfully", &principal, token)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (email, password) = validate_login(payload)?;
    let principal = authenticate(&state, &email, &password).await?;
    let token = state.jwt.issue(principal.id, principal.role)?;
    info!(principal_id = %principal.id, "principal logged in");
    Ok(Json(auth_response("Login successful", &principal, token)))
}

#[instrument(skip(state, payload))]
pub async fn admin_signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (name, email, password) = validate_signup(payload)?;
    if !is_admin_email(&email) {
        return Err(AppError::validation(format!(
            "Email must end with {ADMIN_EMAIL_SUFFIX}"
        )));
    }
    let (principal, token) = register(&state, name, email, &password, Role::Admin).await?;
    Ok((
        StatusCode::CREATED,
        Json(auth_response("Admin registered successfully", &principal, token)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    let (email, password) = validate_login(payload)?;
    if !is_admin_email(&email) {
        warn!("admin login with non-admin email");
        return Err(AppError::Forbidden("Access denied: Not an admin email".into()));
    }
    let principal = authenticate(&state, &email, &password).await?;
    require_role(&principal, Role::Admin)?;
    let token = state.jwt.issue(principal.id, principal.role)?;
    info!(principal_id = %principal.id, "admin logged in");
    Ok(Json(AdminLoginResponse {
        success: true,
        token,
        name: principal.name,
        role: principal.role,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    principal: AuthPrincipal,
) -> Result<Json<MeResponse>, AppError> {
    let found = state
        .principals
        .find_by_id(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(MeResponse {
        success: true,
        user: PublicPrincipal::from(&found),
    }))
}
