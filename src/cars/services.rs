use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CarDraft, UploadItem},
    repo_types::{Car, CarPatch, FuelType, GearType, NewCar},
};
use crate::{compensation::Compensations, error::AppError, state::AppState, storage::StorageError};

const MIN_SEATS: i32 = 2;

/// Draft fields after validation, still waiting for an image reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCar {
    pub name: String,
    pub brand: String,
    pub seats: i32,
    pub price_per_day: f64,
    pub gear_type: GearType,
    pub ac: bool,
    pub fuel_type: FuelType,
}

fn check_seats(seats: i32) -> Result<i32, AppError> {
    if seats < MIN_SEATS {
        return Err(AppError::validation(format!("Seats must be at least {MIN_SEATS}")));
    }
    Ok(seats)
}

fn check_price(price: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Price per day must be a non-negative number"));
    }
    Ok(price)
}

fn check_text(value: &str, field: &str) -> Result<String, AppError> {
    crate::validation::required_text(value, &format!("{field} must not be empty"))
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CarDraft {
    pub fn validate(&self) -> Result<ValidCar, AppError> {
        let (Some(name), Some(brand), Some(seats), Some(price), Some(gear), Some(fuel)) = (
            present(&self.name),
            present(&self.brand),
            present(&self.seats),
            present(&self.price_per_day),
            present(&self.gear_type),
            present(&self.fuel_type),
        ) else {
            return Err(AppError::validation("All fields are required"));
        };

        let seats = seats
            .parse::<i32>()
            .map_err(|_| AppError::validation("Seats must be a whole number"))?;
        let price = price
            .parse::<f64>()
            .map_err(|_| AppError::validation("Price per day must be a number"))?;
        let gear_type = gear
            .parse::<GearType>()
            .map_err(|_| AppError::validation("Gear type must be automatic or manual"))?;
        let fuel_type = fuel.parse::<FuelType>().map_err(|_| {
            AppError::validation("Fuel type must be petrol, diesel, electric or hybrid")
        })?;

        Ok(ValidCar {
            name: name.to_string(),
            brand: brand.to_string(),
            seats: check_seats(seats)?,
            price_per_day: check_price(price)?,
            gear_type,
            // absent means air conditioned, as in the schema default
            ac: present(&self.ac).map_or(true, |v| v == "true"),
            fuel_type,
        })
    }
}

impl CarPatch {
    /// Applies the add-time constraints to whichever fields are present.
    pub fn validate(mut self) -> Result<CarPatch, AppError> {
        if self.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }
        if let Some(name) = self.name.take() {
            self.name = Some(check_text(&name, "Name")?);
        }
        if let Some(brand) = self.brand.take() {
            self.brand = Some(check_text(&brand, "Brand")?);
        }
        if let Some(seats) = self.seats {
            check_seats(seats)?;
        }
        if let Some(price) = self.price_per_day {
            check_price(price)?;
        }
        Ok(self)
    }
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Stores the image, then the record. If the insert fails the image is removed again.
pub async fn add_car(st: &AppState, car: ValidCar, image: UploadItem) -> Result<Car, AppError> {
    let ext = ext_from_mime(&image.content_type).unwrap_or("bin");
    let key = format!("cars/{}.{}", Uuid::new_v4(), ext);

    let image_path = st
        .storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .map_err(|e| anyhow::Error::new(e).context("store car image"))?;

    let mut undo = Compensations::new();
    let storage = st.storage.clone();
    let stored = image_path.clone();
    undo.record("delete uploaded image", async move {
        storage.delete_object(&stored).await.map_err(anyhow::Error::new)
    });

    let inserted = st
        .cars
        .insert(NewCar {
            name: car.name,
            brand: car.brand,
            seats: car.seats,
            price_per_day: car.price_per_day,
            gear_type: car.gear_type,
            ac: car.ac,
            fuel_type: car.fuel_type,
            image_path,
        })
        .await;

    match inserted {
        Ok(car) => {
            undo.disarm();
            info!(car_id = %car.id, image = %car.image_path, "car added");
            Ok(car)
        }
        Err(e) => {
            warn!(pending = undo.len(), "car insert failed; unwinding");
            undo.unwind().await;
            Err(AppError::Internal(e))
        }
    }
}

pub async fn list_cars(st: &AppState) -> Result<Vec<Car>, AppError> {
    Ok(st.cars.list().await?)
}

pub async fn update_car(st: &AppState, id: Uuid, patch: CarPatch) -> Result<Car, AppError> {
    let patch = patch.validate()?;
    let car = st
        .cars
        .update(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".into()))?;
    info!(car_id = %car.id, "car updated");
    Ok(car)
}

/// Deletes the record, then its image. A missing image is logged, not an error.
pub async fn delete_car(st: &AppState, id: Uuid) -> Result<(), AppError> {
    let car = st
        .cars
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".into()))?;

    match st.storage.delete_object(&car.image_path).await {
        Ok(()) => {}
        Err(StorageError::NotFound(r)) => warn!(car_id = %car.id, image = %r, "car image already gone"),
        Err(StorageError::Backend(e)) => {
            return Err(AppError::Internal(e.context("release car image")));
        }
    }
    info!(car_id = %car.id, "car deleted");
    Ok(())
}
