use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CarDraft, CarListResponse, CarResponse, UploadItem},
    repo_types::CarPatch,
    services::{add_car, delete_car, list_cars, update_car},
};
use crate::{
    auth::extractors::AuthPrincipal,
    error::AppError,
    extract::{AppJson, AppMultipart, AppPath},
    response::MessageResponse,
    state::AppState,
};

// Room for the text fields and multipart framing around the image.
const MULTIPART_SLACK: usize = 64 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/api/car/all", get(get_all_cars))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/car/add",
            post(add_car_multipart).layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_SLACK)),
        )
        .route("/api/car/update/:id", put(update_car_json))
        .route("/api/car/delete/:id", delete(delete_car_by_id))
}

/// Pulls text fields and the `image` file out of the form. Unknown fields are skipped.
async fn read_car_form(mut mp: Multipart, max_upload_bytes: usize) -> Result<(CarDraft, Option<UploadItem>), AppError> {
    let mut draft = CarDraft::default();
    let mut image = None;

    while let Some(field) = mp.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "image" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let body = field.bytes().await?;
            if body.len() > max_upload_bytes {
                return Err(AppError::validation(format!(
                    "Car image must be at most {max_upload_bytes} bytes"
                )));
            }
            image = Some(UploadItem { body, content_type });
            continue;
        }

        let slot = match name.as_str() {
            "name" => &mut draft.name,
            "brand" => &mut draft.brand,
            "seats" => &mut draft.seats,
            "pricePerDay" => &mut draft.price_per_day,
            "gearType" => &mut draft.gear_type,
            "fuelType" => &mut draft.fuel_type,
            "ac" => &mut draft.ac,
            _ => continue,
        };
        *slot = Some(field.text().await?);
    }
    Ok((draft, image))
}

/// POST /api/car/add (multipart)
#[instrument(skip(state, mp))]
pub async fn add_car_multipart(
    State(state): State<AppState>,
    AppMultipart(mp): AppMultipart,
) -> Result<(StatusCode, Json<CarResponse>), AppError> {
    let (draft, image) = read_car_form(mp, state.config.max_upload_bytes).await?;
    let car = draft.validate()?;

    let image = image
        .filter(|i| !i.body.is_empty())
        .ok_or_else(|| AppError::validation("Car image is required"))?;
    if !image.content_type.starts_with("image/") {
        return Err(AppError::validation("Only image files are allowed"));
    }

    let car = add_car(&state, car, image).await?;
    Ok((
        StatusCode::CREATED,
        Json(CarResponse {
            success: true,
            message: "Car added successfully",
            car,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_all_cars(State(state): State<AppState>) -> Result<Json<CarListResponse>, AppError> {
    let cars = list_cars(&state).await?;
    Ok(Json(CarListResponse { success: true, cars }))
}

#[instrument(skip(state, patch), fields(principal_id = %principal.id))]
pub async fn update_car_json(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    AppPath(id): AppPath<Uuid>,
    AppJson(patch): AppJson<CarPatch>,
) -> Result<Json<CarResponse>, AppError> {
    let car = update_car(&state, id, patch).await?;
    Ok(Json(CarResponse {
        success: true,
        message: "Car updated successfully",
        car,
    }))
}

#[instrument(skip(state), fields(principal_id = %principal.id))]
pub async fn delete_car_by_id(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_car(&state, id).await?;
    Ok(Json(MessageResponse::ok("Car deleted successfully")))
}
