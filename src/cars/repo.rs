use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Car, CarPatch, CarRow, CarStore, NewCar};

const CAR_COLUMNS: &str = "id, name, brand, seats, price_per_day, gear_type, ac, fuel_type, \
                           image_path, available, created_at, updated_at";

pub struct PgCarStore {
    db: PgPool,
}

impl PgCarStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CarStore for PgCarStore {
    async fn insert(&self, car: NewCar) -> anyhow::Result<Car> {
        let row = sqlx::query_as::<_, CarRow>(&format!(
            r#"
            INSERT INTO cars (id, name, brand, seats, price_per_day, gear_type, ac, fuel_type, image_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&car.name)
        .bind(&car.brand)
        .bind(car.seats)
        .bind(car.price_per_day)
        .bind(car.gear_type.as_str())
        .bind(car.ac)
        .bind(car.fuel_type.as_str())
        .bind(&car.image_path)
        .fetch_one(&self.db)
        .await
        .context("insert car")?;
        Car::try_from(row)
    }

    async fn list(&self) -> anyhow::Result<Vec<Car>> {
        let rows = sqlx::query_as::<_, CarRow>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list cars")?;
        rows.into_iter().map(Car::try_from).collect()
    }

    async fn update(&self, id: Uuid, patch: &CarPatch) -> anyhow::Result<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>(&format!(
            r#"
            UPDATE cars SET
                name          = COALESCE($2, name),
                brand         = COALESCE($3, brand),
                seats         = COALESCE($4, seats),
                price_per_day = COALESCE($5, price_per_day),
                gear_type     = COALESCE($6, gear_type),
                ac            = COALESCE($7, ac),
                fuel_type     = COALESCE($8, fuel_type),
                available     = COALESCE($9, available),
                updated_at    = now()
            WHERE id = $1
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.brand.as_deref())
        .bind(patch.seats)
        .bind(patch.price_per_day)
        .bind(patch.gear_type.map(|g| g.as_str()))
        .bind(patch.ac)
        .bind(patch.fuel_type.map(|f| f.as_str()))
        .bind(patch.available)
        .fetch_optional(&self.db)
        .await
        .context("update car")?;
        row.map(Car::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>(&format!(
            "DELETE FROM cars WHERE id = $1 RETURNING {CAR_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete car")?;
        row.map(Car::try_from).transpose()
    }
}
