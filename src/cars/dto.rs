use bytes::Bytes;
use serde::Serialize;

use super::repo_types::Car;

/// Raw multipart text fields for a new car, before validation.
#[derive(Debug, Default)]
pub struct CarDraft {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub seats: Option<String>,
    pub price_per_day: Option<String>,
    pub gear_type: Option<String>,
    pub fuel_type: Option<String>,
    pub ac: Option<String>,
}

/// The uploaded image file.
#[derive(Debug)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct CarResponse {
    pub success: bool,
    pub message: &'static str,
    pub car: Car,
}

#[derive(Debug, Serialize)]
pub struct CarListResponse {
    pub success: bool,
    pub cars: Vec<Car>,
}
