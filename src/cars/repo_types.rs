use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GearType {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl GearType {
    pub fn as_str(self) -> &'static str {
        match self {
            GearType::Automatic => "automatic",
            GearType::Manual => "manual",
        }
    }
}

impl std::str::FromStr for GearType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(GearType::Automatic),
            "manual" => Ok(GearType::Manual),
            other => anyhow::bail!("unknown gear type `{other}`"),
        }
    }
}

impl FuelType {
    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Electric => "electric",
            FuelType::Hybrid => "hybrid",
        }
    }
}

impl std::str::FromStr for FuelType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "petrol" => Ok(FuelType::Petrol),
            "diesel" => Ok(FuelType::Diesel),
            "electric" => Ok(FuelType::Electric),
            "hybrid" => Ok(FuelType::Hybrid),
            other => anyhow::bail!("unknown fuel type `{other}`"),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct CarRow {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub seats: i32,
    pub price_per_day: f64,
    pub gear_type: String,
    pub ac: bool,
    pub fuel_type: String,
    pub image_path: String,
    pub available: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub seats: i32,
    pub price_per_day: f64,
    pub gear_type: GearType,
    pub ac: bool,
    pub fuel_type: FuelType,
    #[serde(rename = "image")]
    pub image_path: String,
    pub available: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<CarRow> for Car {
    type Error = anyhow::Error;

    fn try_from(r: CarRow) -> Result<Self, Self::Error> {
        Ok(Self {
            gear_type: r.gear_type.parse()?,
            fuel_type: r.fuel_type.parse()?,
            id: r.id,
            name: r.name,
            brand: r.brand,
            seats: r.seats,
            price_per_day: r.price_per_day,
            ac: r.ac,
            image_path: r.image_path,
            available: r.available,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated car fields for insertion; new cars are always available.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
    pub name: String,
    pub brand: String,
    pub seats: i32,
    pub price_per_day: f64,
    pub gear_type: GearType,
    pub ac: bool,
    pub fuel_type: FuelType,
    pub image_path: String,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CarPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub seats: Option<i32>,
    pub price_per_day: Option<f64>,
    pub gear_type: Option<GearType>,
    pub ac: Option<bool>,
    pub fuel_type: Option<FuelType>,
    pub available: Option<bool>,
}

impl CarPatch {
    pub fn is_empty(&self) -> bool {
        *self == CarPatch::default()
    }
}

#[async_trait]
pub trait CarStore: Send + Sync {
    async fn insert(&self, car: NewCar) -> anyhow::Result<Car>;
    /// All cars in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<Car>>;
    async fn update(&self, id: Uuid, patch: &CarPatch) -> anyhow::Result<Option<Car>>;
    /// Removes the car and hands back the deleted record.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Car>>;
}
