use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::repo_types::{ContactMessage, NewContactMessage};
use crate::{
    auth::extractors::AdminPrincipal,
    error::AppError,
    extract::AppJson,
    response::MessageResponse,
    state::AppState,
    validation,
};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub success: bool,
    pub messages: Vec<ContactMessage>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/contact", post(submit_contact))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/admin/contact", get(list_contacts))
}

fn validate_contact(req: ContactRequest) -> Result<NewContactMessage, AppError> {
    Ok(NewContactMessage {
        name: validation::required_text(&req.name, "Name is required")?,
        email: validation::email(&req.email, "Valid email is required")?,
        message: validation::required_text(&req.message, "Message is required")?,
    })
}

#[instrument(skip(state, payload))]
pub async fn submit_contact(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let msg = validate_contact(payload)?;
    let saved = state.contacts.create(msg).await?;
    info!(contact_id = %saved.id, "contact message received");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok(
            "Thank you for contacting us! We will get back to you soon.",
        )),
    ))
}

#[instrument(skip_all)]
pub async fn list_contacts(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
) -> Result<Json<ContactListResponse>, AppError> {
    let messages = state.contacts.list().await?;
    Ok(Json(ContactListResponse {
        success: true,
        messages,
    }))
}
