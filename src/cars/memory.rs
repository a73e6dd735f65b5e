use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Car, CarPatch, CarStore, NewCar};

/// Cars in a `Vec`, which keeps insertion order for `list`.
#[derive(Default)]
pub struct MemoryCarStore {
    cars: RwLock<Vec<Car>>,
    fail_inserts: AtomicBool,
}

impl MemoryCarStore {
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CarStore for MemoryCarStore {
    async fn insert(&self, car: NewCar) -> anyhow::Result<Car> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("cars table unavailable");
        }
        let now = OffsetDateTime::now_utc();
        let car = Car {
            id: Uuid::new_v4(),
            name: car.name,
            brand: car.brand,
            seats: car.seats,
            price_per_day: car.price_per_day,
            gear_type: car.gear_type,
            ac: car.ac,
            fuel_type: car.fuel_type,
            image_path: car.image_path,
            available: true,
            created_at: now,
            updated_at: now,
        };
        self.cars.write().await.push(car.clone());
        Ok(car)
    }

    async fn list(&self) -> anyhow::Result<Vec<Car>> {
        Ok(self.cars.read().await.clone())
    }

    async fn update(&self, id: Uuid, patch: &CarPatch) -> anyhow::Result<Option<Car>> {
        let mut cars = self.cars.write().await;
        let Some(car) = cars.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &patch.name {
            car.name = v.clone();
        }
        if let Some(v) = &patch.brand {
            car.brand = v.clone();
        }
        if let Some(v) = patch.seats {
            car.seats = v;
        }
        if let Some(v) = patch.price_per_day {
            car.price_per_day = v;
        }
        if let Some(v) = patch.gear_type {
            car.gear_type = v;
        }
        if let Some(v) = patch.ac {
            car.ac = v;
        }
        if let Some(v) = patch.fuel_type {
            car.fuel_type = v;
        }
        if let Some(v) = patch.available {
            car.available = v;
        }
        car.updated_at = OffsetDateTime::now_utc();
        Ok(Some(car.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Car>> {
        let mut cars = self.cars.write().await;
        Ok(cars
            .iter()
            .position(|c| c.id == id)
            .map(|idx| cars.remove(idx)))
    }
}
