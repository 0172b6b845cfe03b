use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::service::{CreateServiceRequest, PublicService, Service, UpdateServiceRequest};

pub struct CatalogService;

impl CatalogService {
    pub async fn list(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Service>, ApiError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(services)
    }

    /// Active services only, shaped for the public booking page.
    pub async fn list_public(pool: &PgPool, owner_id: Uuid) -> Result<Vec<PublicService>, ApiError> {
        let services = sqlx::query_as::<_, PublicService>(
            "SELECT id, name, description, duration_minutes, price_cents
             FROM services WHERE owner_id = $1 AND is_active = TRUE ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(services)
    }

    pub async fn get(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<Service, ApiError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Service not found".into()))
    }

    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        req: &CreateServiceRequest,
    ) -> Result<Service, ApiError> {
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("Service name is required".into()));
        }
        if req.duration_minutes <= 0 {
            return Err(ApiError::Validation("Duration must be positive".into()));
        }
        if req.price_cents < 0 {
            return Err(ApiError::Validation("Price cannot be negative".into()));
        }

        let service = sqlx::query_as::<_, Service>(
            "INSERT INTO services (owner_id, name, description, duration_minutes, price_cents)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(owner_id)
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(req.duration_minutes)
        .bind(req.price_cents)
        .fetch_one(pool)
        .await?;
        Ok(service)
    }

    pub async fn update(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
        req: &UpdateServiceRequest,
    ) -> Result<Service, ApiError> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("Service name is required".into()));
            }
        }
        if matches!(req.duration_minutes, Some(d) if d <= 0) {
            return Err(ApiError::Validation("Duration must be positive".into()));
        }
        if matches!(req.price_cents, Some(p) if p < 0) {
            return Err(ApiError::Validation("Price cannot be negative".into()));
        }

        sqlx::query_as::<_, Service>(
            "UPDATE services
             SET name = COALESCE($1, name),
                 description = COALESCE($2, description),
                 duration_minutes = COALESCE($3, duration_minutes),
                 price_cents = COALESCE($4, price_cents),
                 is_active = COALESCE($5, is_active)
             WHERE id = $6 AND owner_id = $7
             RETURNING *",
        )
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.description)
        .bind(req.duration_minutes)
        .bind(req.price_cents)
        .bind(req.is_active)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))
    }

    /// Removes the catalog entry. Booked appointments keep their snapshot;
    /// their service_id just becomes NULL.
    pub async fn delete(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Service not found".into()));
        }
        Ok(())
    }
}
